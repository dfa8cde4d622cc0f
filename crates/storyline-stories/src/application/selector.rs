//! Story selector: picks a fresh, unlocked story for a writer and locks it.

use std::sync::Mutex;

use storyline_core::clock::Clock;
use storyline_core::command::Command;
use storyline_core::error::DomainError;
use storyline_core::repository::StoryRepository;
use storyline_core::rng::DeterministicRng;
use storyline_core::story::{Story, StoryId};
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::lock_manager::{expire_stale_lock, handle_acquire_lock};
use crate::domain::commands::{AcquireLock, SelectStory};
use crate::domain::lock_policy::LockPolicy;

/// Result of a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A story now locked by the requesting writer.
    Assigned(Story),
    /// Nothing is eligible; the writer should start a new story.
    NoneAvailable,
}

/// Handles the `SelectStory` command.
///
/// Scans incomplete stories, clearing any expired locks it finds, and keeps
/// those the writer has not contributed to, has not seen, and may lock. A
/// candidate is drawn uniformly at random and acquired; if another writer
/// wins the race for it, the next draw is taken from the remaining
/// candidates.
///
/// The `Mutex` is locked only around each synchronous draw to avoid holding
/// a `MutexGuard` across await points.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the repository fails or the RNG
/// mutex is poisoned.
pub async fn handle_select_story(
    command: &SelectStory,
    policy: &LockPolicy,
    clock: &dyn Clock,
    rng: &Mutex<dyn DeterministicRng + Send>,
    repo: &dyn StoryRepository,
) -> Result<Selection, DomainError> {
    let user = command.user_id;
    let now = clock.now();
    let mut candidates: Vec<StoryId> = Vec::new();

    for story in repo.list_incomplete().await? {
        let mut lock = story.lock;
        if let Some(observed) = lock {
            if policy.is_expired(&observed, now)
                && expire_stale_lock(story.id, observed, policy, clock, repo).await?
            {
                lock = None;
            }
        }

        if story.has_contribution_from(user) {
            debug!(story_id = %story.id, "skipping story the writer contributed to");
            continue;
        }
        if command.seen_story_ids.contains(&story.id) {
            debug!(story_id = %story.id, "skipping story already seen");
            continue;
        }
        let scanned = Story { lock, ..story };
        if !policy.is_effectively_unlocked(&scanned, user, now) {
            debug!(story_id = %scanned.id, "skipping locked story");
            continue;
        }
        candidates.push(scanned.id);
    }

    while !candidates.is_empty() {
        let pick = {
            let mut rng_guard = rng
                .lock()
                .map_err(|e| DomainError::Infrastructure(format!("RNG mutex poisoned: {e}")))?;
            draw_index(&mut *rng_guard, candidates.len())
        };
        let story_id = candidates.swap_remove(pick);

        let acquire = AcquireLock {
            correlation_id: Uuid::new_v4(),
            story_id,
            user_id: user,
        };
        match handle_acquire_lock(&acquire, policy, clock, repo).await {
            Ok(story) => {
                info!(
                    command = command.command_type(),
                    correlation_id = %command.correlation_id(),
                    story_id = %story.id,
                    user_id = %user,
                    "story assigned"
                );
                return Ok(Selection::Assigned(story));
            }
            Err(DomainError::AlreadyLocked { .. } | DomainError::StoryNotFound(_)) => {
                debug!(story_id = %story_id, "lost race for candidate, trying another");
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        user_id = %user,
        "no story available"
    );
    Ok(Selection::NoneAvailable)
}

/// Draws an index in `0..len`. `len` must be positive.
#[allow(clippy::cast_possible_truncation)]
fn draw_index(rng: &mut dyn DeterministicRng, len: usize) -> usize {
    let max = u32::try_from(len - 1).unwrap_or(u32::MAX);
    (rng.next_u32_range(0, max) as usize).min(len - 1)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use storyline_core::story::{Line, LockState, UserId};
    use storyline_test_support::{
        FailingStoryRepository, FixedClock, InMemoryStoryRepository, MockRng, SequenceRng,
    };

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn policy() -> LockPolicy {
        LockPolicy::new(TimeDelta::seconds(180))
    }

    fn select(user_id: UserId, seen: &[StoryId]) -> SelectStory {
        SelectStory {
            correlation_id: Uuid::new_v4(),
            user_id,
            seen_story_ids: seen.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    fn story(id: i64, authors: &[Option<UserId>], lock: Option<LockState>) -> Story {
        Story {
            id: StoryId(id),
            max_lines: 5,
            lines: authors
                .iter()
                .enumerate()
                .map(|(index, author)| Line {
                    index: u32::try_from(index).unwrap(),
                    text: format!("line {index}"),
                    author: *author,
                })
                .collect(),
            lock,
        }
    }

    fn mock_rng() -> Mutex<MockRng> {
        Mutex::new(MockRng)
    }

    #[tokio::test]
    async fn test_select_assigns_and_locks_eligible_story() {
        // Arrange
        let repo = InMemoryStoryRepository::new();
        repo.insert(story(1, &[None], None));
        let alice = UserId::new_random();
        let rng = mock_rng();

        // Act
        let selection = handle_select_story(
            &select(alice, &[]),
            &policy(),
            &FixedClock(t0()),
            &rng,
            &repo,
        )
        .await
        .unwrap();

        // Assert
        match selection {
            Selection::Assigned(story) => {
                assert_eq!(story.id, StoryId(1));
                assert!(story.is_locked_by(alice));
            }
            Selection::NoneAvailable => panic!("expected an assignment"),
        }
        assert!(repo.fetch(StoryId(1)).await.unwrap().is_locked_by(alice));
    }

    #[tokio::test]
    async fn test_seen_story_is_not_offered_again() {
        let repo = InMemoryStoryRepository::new();
        repo.insert(story(1, &[None], None));
        let rng = mock_rng();

        let selection = handle_select_story(
            &select(UserId::new_random(), &[StoryId(1)]),
            &policy(),
            &FixedClock(t0()),
            &rng,
            &repo,
        )
        .await
        .unwrap();

        assert_eq!(selection, Selection::NoneAvailable);
        assert!(repo.fetch(StoryId(1)).await.unwrap().lock.is_none());
    }

    #[tokio::test]
    async fn test_contributor_never_gets_story_back_even_after_lock_expires() {
        // Arrange
        let alice = UserId::new_random();
        let bob = UserId::new_random();
        let repo = InMemoryStoryRepository::new();
        repo.insert(story(
            2,
            &[None, Some(alice)],
            Some(LockState {
                holder: bob,
                acquired_at: t0(),
            }),
        ));
        let rng = mock_rng();
        let later = FixedClock(t0() + TimeDelta::seconds(600));

        // Act
        let selection =
            handle_select_story(&select(alice, &[]), &policy(), &later, &rng, &repo)
                .await
                .unwrap();

        // Assert
        assert_eq!(selection, Selection::NoneAvailable);
        // The scan still expired bob's abandoned lock.
        assert!(repo.fetch(StoryId(2)).await.unwrap().lock.is_none());
    }

    #[tokio::test]
    async fn test_live_foreign_lock_excludes_story() {
        let bob = UserId::new_random();
        let repo = InMemoryStoryRepository::new();
        repo.insert(story(
            1,
            &[None],
            Some(LockState {
                holder: bob,
                acquired_at: t0(),
            }),
        ));
        let rng = mock_rng();

        let selection = handle_select_story(
            &select(UserId::new_random(), &[]),
            &policy(),
            &FixedClock(t0() + TimeDelta::seconds(30)),
            &rng,
            &repo,
        )
        .await
        .unwrap();

        assert_eq!(selection, Selection::NoneAvailable);
        assert!(repo.fetch(StoryId(1)).await.unwrap().is_locked_by(bob));
    }

    #[tokio::test]
    async fn test_expired_foreign_lock_is_cleared_and_reassigned() {
        // Arrange
        let bob = UserId::new_random();
        let carol = UserId::new_random();
        let repo = InMemoryStoryRepository::new();
        repo.insert(story(
            1,
            &[None],
            Some(LockState {
                holder: bob,
                acquired_at: t0(),
            }),
        ));
        let rng = mock_rng();
        let later = FixedClock(t0() + TimeDelta::seconds(181));

        // Act
        let selection =
            handle_select_story(&select(carol, &[]), &policy(), &later, &rng, &repo)
                .await
                .unwrap();

        // Assert
        match selection {
            Selection::Assigned(story) => {
                let lock = story.lock.unwrap();
                assert_eq!(lock.holder, carol);
                assert_eq!(lock.acquired_at, later.0);
            }
            Selection::NoneAvailable => panic!("expected an assignment"),
        }
    }

    #[tokio::test]
    async fn test_own_lock_does_not_block_reselection() {
        let alice = UserId::new_random();
        let repo = InMemoryStoryRepository::new();
        repo.insert(story(
            1,
            &[None],
            Some(LockState {
                holder: alice,
                acquired_at: t0(),
            }),
        ));
        let rng = mock_rng();

        let selection = handle_select_story(
            &select(alice, &[]),
            &policy(),
            &FixedClock(t0() + TimeDelta::seconds(10)),
            &rng,
            &repo,
        )
        .await
        .unwrap();

        assert!(matches!(selection, Selection::Assigned(story) if story.is_locked_by(alice)));
    }

    #[tokio::test]
    async fn test_random_draw_chooses_among_candidates() {
        // Arrange
        let repo = InMemoryStoryRepository::new();
        for id in 1..=3 {
            repo.insert(story(id, &[None], None));
        }
        let alice = UserId::new_random();
        let rng: Mutex<SequenceRng> = Mutex::new(SequenceRng::new(vec![2]));
        let rng_ref: &Mutex<dyn DeterministicRng + Send> = &rng;

        // Act
        let selection = handle_select_story(
            &select(alice, &[]),
            &policy(),
            &FixedClock(t0()),
            rng_ref,
            &repo,
        )
        .await
        .unwrap();

        // Assert
        assert!(matches!(selection, Selection::Assigned(story) if story.id == StoryId(3)));
    }

    #[tokio::test]
    async fn test_complete_stories_are_never_selected() {
        let repo = InMemoryStoryRepository::new();
        let mut done = story(1, &[None], None);
        done.max_lines = 1;
        repo.insert(done);
        let rng = mock_rng();

        let selection = handle_select_story(
            &select(UserId::new_random(), &[]),
            &policy(),
            &FixedClock(t0()),
            &rng,
            &repo,
        )
        .await
        .unwrap();

        assert_eq!(selection, Selection::NoneAvailable);
    }

    #[tokio::test]
    async fn test_select_propagates_repository_failure() {
        let rng = mock_rng();

        let result = handle_select_story(
            &select(UserId::new_random(), &[]),
            &policy(),
            &FixedClock(t0()),
            &rng,
            &FailingStoryRepository,
        )
        .await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[test]
    fn test_draw_index_stays_in_bounds() {
        let mut rng = SequenceRng::new(vec![9]);
        assert_eq!(draw_index(&mut rng, 3), 2);
    }
}
