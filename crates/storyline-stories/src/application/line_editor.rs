//! Line editor: appends lines to locked stories and originates new ones.

use std::collections::HashMap;

use serde::Serialize;
use storyline_core::command::Command;
use storyline_core::config::check_max_lines;
use storyline_core::error::DomainError;
use storyline_core::identity::IdentityStore;
use storyline_core::notifier::CompletionNotifier;
use storyline_core::repository::StoryRepository;
use storyline_core::story::{SeedLine, Story, StoryId, UserId};
use tracing::{info, warn};

use crate::domain::commands::{OriginateStory, SubmitLine};
use crate::domain::lock_policy::decide_append;
use crate::domain::rendering::render_full_text;

/// What a successful submission did to the story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// The line was appended and the story still has room.
    Continued {
        /// The extended story.
        story_id: StoryId,
        /// Index of the appended line.
        line_index: u32,
    },
    /// The line was the last one; the story is complete.
    Completed {
        /// The completed story.
        story_id: StoryId,
        /// The rendered story as sent to the completion notifier.
        full_text: String,
    },
}

/// Handles the `SubmitLine` command: appends the line and clears the lock in
/// one atomic step, then notifies if that line completed the story.
///
/// A notifier failure is logged and does not affect the outcome.
///
/// # Errors
///
/// Returns `DomainError::Validation` for blank text,
/// `DomainError::StoryNotFound` for an unknown story,
/// `DomainError::NotOwned` if the caller does not hold the lock, or
/// `DomainError::Infrastructure` if the repository fails.
pub async fn handle_submit_line(
    command: &SubmitLine,
    repo: &dyn StoryRepository,
    identity: &dyn IdentityStore,
    notifier: &dyn CompletionNotifier,
) -> Result<SubmitOutcome, DomainError> {
    if command.text.trim().is_empty() {
        return Err(DomainError::Validation("line text must not be empty".into()));
    }
    let user = command.user_id;
    let text = command.text.as_str();
    let decide = move |story: &Story| decide_append(story, user, text);

    let story = repo.update(command.story_id, &decide).await?;
    let line_index = story.line_count() - 1;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        story_id = %story.id,
        user_id = %user,
        line_index,
        "line appended"
    );

    if !story.is_complete() {
        return Ok(SubmitOutcome::Continued {
            story_id: story.id,
            line_index,
        });
    }

    let full_text = announce_completion(&story, identity, notifier).await;
    Ok(SubmitOutcome::Completed {
        story_id: story.id,
        full_text,
    })
}

/// Handles the `OriginateStory` command: creates an unlocked story whose
/// first line is the author's.
///
/// A one-line story is complete as soon as it exists, so it is announced
/// here.
///
/// # Errors
///
/// Returns `DomainError::Validation` for blank text or a line limit outside
/// `1..=MAX_LINES_LIMIT`, or `DomainError::Infrastructure` if the repository
/// fails.
pub async fn handle_originate_story(
    command: &OriginateStory,
    repo: &dyn StoryRepository,
    identity: &dyn IdentityStore,
    notifier: &dyn CompletionNotifier,
) -> Result<StoryId, DomainError> {
    check_max_lines(command.max_lines)?;
    if command.text.trim().is_empty() {
        return Err(DomainError::Validation("line text must not be empty".into()));
    }

    let story_id = repo
        .create(
            command.max_lines,
            SeedLine::authored(command.text.clone(), command.author),
        )
        .await?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        story_id = %story_id,
        user_id = %command.user_id(),
        max_lines = command.max_lines,
        "story originated"
    );

    let story = repo.fetch(story_id).await?;
    if story.is_complete() {
        announce_completion(&story, identity, notifier).await;
    }
    Ok(story_id)
}

/// Renders a completed story and hands it to the notifier. Name lookup and
/// delivery failures are logged and otherwise ignored.
pub(crate) async fn announce_completion(
    story: &Story,
    identity: &dyn IdentityStore,
    notifier: &dyn CompletionNotifier,
) -> String {
    let names = author_names(identity, story).await.unwrap_or_else(|e| {
        warn!(story_id = %story.id, error = %e, "could not resolve author names");
        HashMap::new()
    });
    let full_text = render_full_text(story, &names);

    info!(story_id = %story.id, lines = story.line_count(), "story completed");
    if let Err(e) = notifier.notify(&full_text).await {
        warn!(story_id = %story.id, error = %e, "completion notification failed");
    }
    full_text
}

/// Looks up the display name of every author in `story`.
///
/// # Errors
///
/// Returns `DomainError` if the identity store fails.
pub(crate) async fn author_names(
    identity: &dyn IdentityStore,
    story: &Story,
) -> Result<HashMap<UserId, String>, DomainError> {
    let mut names = HashMap::new();
    for author in story.lines.iter().filter_map(|line| line.author) {
        if names.contains_key(&author) {
            continue;
        }
        if let Some(user) = identity.find(author).await? {
            names.insert(author, user.display_name);
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};
    use storyline_core::clock::Clock;
    use storyline_core::repository::StoryRepository;
    use storyline_test_support::{
        FailingNotifier, FixedClock, InMemoryIdentityStore, InMemoryStoryRepository,
        RecordingNotifier,
    };
    use uuid::Uuid;

    use super::*;
    use crate::application::lock_manager::handle_acquire_lock;
    use crate::domain::commands::AcquireLock;
    use crate::domain::lock_policy::LockPolicy;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    }

    fn policy() -> LockPolicy {
        LockPolicy::new(TimeDelta::seconds(180))
    }

    fn submit(story_id: StoryId, user_id: UserId, text: &str) -> SubmitLine {
        SubmitLine {
            correlation_id: Uuid::new_v4(),
            story_id,
            user_id,
            text: text.to_owned(),
        }
    }

    fn originate(max_lines: u32, author: UserId, text: &str) -> OriginateStory {
        OriginateStory {
            correlation_id: Uuid::new_v4(),
            max_lines,
            author,
            text: text.to_owned(),
        }
    }

    async fn lock(repo: &dyn StoryRepository, clock: &dyn Clock, story_id: StoryId, user_id: UserId) {
        let command = AcquireLock {
            correlation_id: Uuid::new_v4(),
            story_id,
            user_id,
        };
        handle_acquire_lock(&command, &policy(), clock, repo)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_originate_creates_unlocked_story_with_authored_seed() {
        // Arrange
        let repo = InMemoryStoryRepository::new();
        let notifier = RecordingNotifier::new();
        let alice = UserId::new_random();

        // Act
        let id = handle_originate_story(
            &originate(5, alice, "Once upon a time"),
            &repo,
            &InMemoryIdentityStore::new(),
            &notifier,
        )
        .await
        .unwrap();

        // Assert
        let story = repo.fetch(id).await.unwrap();
        assert_eq!(story.max_lines, 5);
        assert_eq!(story.lines.len(), 1);
        assert_eq!(story.lines[0].author, Some(alice));
        assert!(story.lock.is_none());
        assert!(notifier.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_originate_rejects_invalid_input() {
        let repo = InMemoryStoryRepository::new();
        let identity = InMemoryIdentityStore::new();
        let notifier = RecordingNotifier::new();
        let alice = UserId::new_random();

        let zero =
            handle_originate_story(&originate(0, alice, "Hi"), &repo, &identity, &notifier).await;
        let blank =
            handle_originate_story(&originate(5, alice, ""), &repo, &identity, &notifier).await;

        assert!(matches!(zero, Err(DomainError::Validation(_))));
        assert!(matches!(blank, Err(DomainError::Validation(_))));
        assert!(repo.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_originate_rejects_line_limit_beyond_storable_range() {
        let repo = InMemoryStoryRepository::new();
        let alice = UserId::new_random();

        let result = handle_originate_story(
            &originate(u32::MAX, alice, "Endless."),
            &repo,
            &InMemoryIdentityStore::new(),
            &RecordingNotifier::new(),
        )
        .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(repo.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_single_line_story_is_announced_at_origination() {
        // Arrange
        let repo = InMemoryStoryRepository::new();
        let identity = InMemoryIdentityStore::new();
        let notifier = RecordingNotifier::new();
        let alice = identity.add("alice");
        let bob = identity.add("bob");

        // Act
        let id = handle_originate_story(&originate(1, alice, "Hi."), &repo, &identity, &notifier)
            .await
            .unwrap();

        // Assert
        assert!(repo.fetch(id).await.unwrap().is_complete());
        assert_eq!(notifier.delivered(), vec!["Hi. (by alice)".to_owned()]);

        let late = AcquireLock {
            correlation_id: Uuid::new_v4(),
            story_id: id,
            user_id: bob,
        };
        let relock = handle_acquire_lock(&late, &policy(), &clock(), &repo).await;
        assert!(matches!(relock, Err(DomainError::StoryNotFound(_))));
    }

    #[tokio::test]
    async fn test_submit_appends_line_and_releases_lock() {
        // Arrange
        let repo = InMemoryStoryRepository::new();
        let identity = InMemoryIdentityStore::new();
        let notifier = RecordingNotifier::new();
        let alice = identity.add("alice");
        let bob = identity.add("bob");
        let id = handle_originate_story(
            &originate(5, alice, "Once upon a time"),
            &repo,
            &identity,
            &RecordingNotifier::new(),
        )
        .await
        .unwrap();
        lock(&repo, &clock(), id, bob).await;

        // Act
        let outcome = handle_submit_line(
            &submit(id, bob, "there lived a bear."),
            &repo,
            &identity,
            &notifier,
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(
            outcome,
            SubmitOutcome::Continued {
                story_id: id,
                line_index: 1
            }
        );
        let story = repo.fetch(id).await.unwrap();
        assert!(story.lock.is_none());
        assert_eq!(story.lines[1].author, Some(bob));
        assert!(notifier.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_submit_without_lock_is_not_owned() {
        let repo = InMemoryStoryRepository::new();
        let identity = InMemoryIdentityStore::new();
        let alice = identity.add("alice");
        let bob = identity.add("bob");
        let carol = identity.add("carol");
        let id = handle_originate_story(
            &originate(5, alice, "Once"),
            &repo,
            &identity,
            &RecordingNotifier::new(),
        )
        .await
        .unwrap();
        lock(&repo, &clock(), id, bob).await;

        let result = handle_submit_line(
            &submit(id, carol, "Sneaky line."),
            &repo,
            &identity,
            &RecordingNotifier::new(),
        )
        .await;

        assert!(matches!(result, Err(DomainError::NotOwned { .. })));
        let story = repo.fetch(id).await.unwrap();
        assert_eq!(story.lines.len(), 1);
        assert!(story.is_locked_by(bob));
    }

    #[tokio::test]
    async fn test_submit_unknown_story_is_not_found() {
        let result = handle_submit_line(
            &submit(StoryId(77), UserId::new_random(), "Hello"),
            &InMemoryStoryRepository::new(),
            &InMemoryIdentityStore::new(),
            &RecordingNotifier::new(),
        )
        .await;

        assert!(matches!(result, Err(DomainError::StoryNotFound(StoryId(77)))));
    }

    #[tokio::test]
    async fn test_submit_blank_text_is_rejected_and_keeps_lock() {
        let repo = InMemoryStoryRepository::new();
        let identity = InMemoryIdentityStore::new();
        let alice = identity.add("alice");
        let bob = identity.add("bob");
        let id = handle_originate_story(
            &originate(5, alice, "Once"),
            &repo,
            &identity,
            &RecordingNotifier::new(),
        )
        .await
        .unwrap();
        lock(&repo, &clock(), id, bob).await;

        let result = handle_submit_line(
            &submit(id, bob, "  "),
            &repo,
            &identity,
            &RecordingNotifier::new(),
        )
        .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(repo.fetch(id).await.unwrap().is_locked_by(bob));
    }

    #[tokio::test]
    async fn test_five_line_round_trip_notifies_once_with_annotated_text() {
        // Arrange
        let repo = InMemoryStoryRepository::new();
        let identity = InMemoryIdentityStore::new();
        let notifier = RecordingNotifier::new();
        let alice = identity.add("alice");
        let writers = [
            (identity.add("bob"), "there lived a bear"),
            (identity.add("carol"), "who loved honey"),
            (identity.add("dave"), "more than anything"),
            (identity.add("erin"), "and that was that."),
        ];
        let id = handle_originate_story(
            &originate(5, alice, "Once upon a time"),
            &repo,
            &identity,
            &RecordingNotifier::new(),
        )
        .await
        .unwrap();

        // Act
        let mut outcomes = Vec::new();
        for (user, text) in writers {
            lock(&repo, &clock(), id, user).await;
            outcomes.push(
                handle_submit_line(&submit(id, user, text), &repo, &identity, &notifier)
                    .await
                    .unwrap(),
            );
        }

        // Assert
        let expected = "Once upon a time (by alice)\n\
                        there lived a bear (by bob)\n\
                        who loved honey (by carol)\n\
                        more than anything (by dave)\n\
                        and that was that. (by erin)";
        assert_eq!(notifier.delivered(), vec![expected.to_owned()]);
        assert_eq!(
            outcomes.last(),
            Some(&SubmitOutcome::Completed {
                story_id: id,
                full_text: expected.to_owned(),
            })
        );
        assert!(
            outcomes[..3]
                .iter()
                .all(|o| matches!(o, SubmitOutcome::Continued { .. }))
        );

        // A complete story accepts no more locks or lines.
        let late = AcquireLock {
            correlation_id: Uuid::new_v4(),
            story_id: id,
            user_id: identity.add("frank"),
        };
        let relock = handle_acquire_lock(&late, &policy(), &clock(), &repo).await;
        assert!(matches!(relock, Err(DomainError::StoryNotFound(_))));
    }

    #[tokio::test]
    async fn test_unauthored_seed_line_is_left_unannotated() {
        let repo = InMemoryStoryRepository::new();
        let identity = InMemoryIdentityStore::new();
        let notifier = RecordingNotifier::new();
        let bob = identity.add("bob");
        let id = repo
            .create(2, SeedLine::prompt("I am an invisible man."))
            .await
            .unwrap();
        lock(&repo, &clock(), id, bob).await;

        handle_submit_line(&submit(id, bob, "Nobody noticed."), &repo, &identity, &notifier)
            .await
            .unwrap();

        assert_eq!(
            notifier.delivered(),
            vec!["I am an invisible man.\nNobody noticed. (by bob)".to_owned()]
        );
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_undo_completion() {
        // Arrange
        let repo = InMemoryStoryRepository::new();
        let identity = InMemoryIdentityStore::new();
        let alice = identity.add("alice");
        let bob = identity.add("bob");
        let id = handle_originate_story(
            &originate(2, alice, "Start."),
            &repo,
            &identity,
            &RecordingNotifier::new(),
        )
        .await
        .unwrap();
        lock(&repo, &clock(), id, bob).await;

        // Act
        let outcome =
            handle_submit_line(&submit(id, bob, "End."), &repo, &identity, &FailingNotifier)
                .await
                .unwrap();

        // Assert
        assert!(matches!(outcome, SubmitOutcome::Completed { .. }));
        let story = repo.fetch(id).await.unwrap();
        assert!(story.is_complete());
        assert!(story.lock.is_none());
    }
}
