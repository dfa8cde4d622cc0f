//! Lock manager: acquire, release, and expire story locks.
//!
//! Each handler hands a pure decision from `LockPolicy` to
//! `StoryRepository::update`, so the check and the write commit together.

use std::sync::atomic::{AtomicBool, Ordering};

use storyline_core::clock::Clock;
use storyline_core::command::Command;
use storyline_core::error::DomainError;
use storyline_core::repository::{StoryRepository, StoryWrite};
use storyline_core::story::{LockState, Story, StoryId};
use tracing::{debug, info};

use crate::domain::commands::{AcquireLock, ReleaseLock};
use crate::domain::lock_policy::LockPolicy;

/// Handles the `AcquireLock` command. Returns the story as locked.
///
/// # Errors
///
/// Returns `DomainError::StoryNotFound` if the story is unknown or complete,
/// `DomainError::AlreadyLocked` if another user holds a live lock, or
/// `DomainError::Infrastructure` if the repository fails.
pub async fn handle_acquire_lock(
    command: &AcquireLock,
    policy: &LockPolicy,
    clock: &dyn Clock,
    repo: &dyn StoryRepository,
) -> Result<Story, DomainError> {
    let now = clock.now();
    let user = command.user_id;
    let decide = move |story: &Story| policy.decide_acquire(story, user, now);

    let story = repo.update(command.story_id, &decide).await?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        story_id = %command.story_id,
        user_id = %user,
        "story locked"
    );
    Ok(story)
}

/// Handles the `ReleaseLock` command. Releasing an unknown or unlocked story
/// succeeds without doing anything.
///
/// # Errors
///
/// Returns `DomainError::NotOwned` if another user holds a live lock, or
/// `DomainError::Infrastructure` if the repository fails.
pub async fn handle_release_lock(
    command: &ReleaseLock,
    policy: &LockPolicy,
    clock: &dyn Clock,
    repo: &dyn StoryRepository,
) -> Result<(), DomainError> {
    let now = clock.now();
    let user = command.user_id;
    let decide = move |story: &Story| policy.decide_release(story, user, now);

    match repo.update(command.story_id, &decide).await {
        Ok(_) => {
            info!(
                command = command.command_type(),
                correlation_id = %command.correlation_id(),
                story_id = %command.story_id,
                user_id = %user,
                "story lock released"
            );
            Ok(())
        }
        Err(DomainError::StoryNotFound(id)) => {
            debug!(story_id = %id, "release of unknown story ignored");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Clears `observed` from the story if it is still the story's lock and has
/// expired. Returns whether the lock was cleared.
///
/// # Errors
///
/// Returns `DomainError` if the repository fails.
pub async fn expire_stale_lock(
    story_id: StoryId,
    observed: LockState,
    policy: &LockPolicy,
    clock: &dyn Clock,
    repo: &dyn StoryRepository,
) -> Result<bool, DomainError> {
    let now = clock.now();
    let cleared = AtomicBool::new(false);
    let decide = |story: &Story| {
        let write = policy.decide_expire(story, &observed, now);
        cleared.store(write != StoryWrite::Unchanged, Ordering::Relaxed);
        Ok::<_, DomainError>(write)
    };

    repo.update(story_id, &decide).await?;

    let cleared = cleared.into_inner();
    if cleared {
        info!(
            story_id = %story_id,
            holder = %observed.holder,
            acquired_at = %observed.acquired_at,
            "expired story lock cleared"
        );
    }
    Ok(cleared)
}
