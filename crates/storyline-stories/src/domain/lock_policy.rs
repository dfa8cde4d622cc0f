//! Lock rules for a single story.
//!
//! Every function here is pure: it looks at a story as committed and
//! decides which write, if any, an operation should make. The application
//! layer runs these decisions inside `StoryRepository::update` so the check
//! and the write happen in one atomic step.

use chrono::{DateTime, TimeDelta, Utc};
use storyline_core::config::StoryConfig;
use storyline_core::error::DomainError;
use storyline_core::repository::StoryWrite;
use storyline_core::story::{Line, LockState, Story, UserId};

/// Sunset-aware lock rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    sunset: TimeDelta,
}

impl LockPolicy {
    /// A policy whose locks expire after `sunset`.
    #[must_use]
    pub fn new(sunset: TimeDelta) -> Self {
        Self { sunset }
    }

    /// A policy using the configured sunset timeout.
    #[must_use]
    pub fn from_config(config: &StoryConfig) -> Self {
        Self::new(config.lock_sunset())
    }

    /// Whether `lock` has outlived the sunset timeout at `now`.
    #[must_use]
    pub fn is_expired(&self, lock: &LockState, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(lock.acquired_at) > self.sunset
    }

    /// Whether `user` may treat `story` as free: it has no lock, its lock
    /// has expired, or `user` holds the lock.
    #[must_use]
    pub fn is_effectively_unlocked(&self, story: &Story, user: UserId, now: DateTime<Utc>) -> bool {
        match &story.lock {
            None => true,
            Some(lock) => lock.holder == user || self.is_expired(lock, now),
        }
    }

    /// Decides an acquire by `user`. Overwrites an expired or self-held lock.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StoryNotFound` for a complete story and
    /// `DomainError::AlreadyLocked` if another user holds a live lock.
    pub fn decide_acquire(
        &self,
        story: &Story,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<StoryWrite, DomainError> {
        if story.is_complete() {
            return Err(DomainError::StoryNotFound(story.id));
        }
        if let Some(lock) = &story.lock {
            if !self.is_effectively_unlocked(story, user, now) {
                return Err(DomainError::AlreadyLocked {
                    story_id: story.id,
                    holder: lock.holder,
                });
            }
        }
        Ok(StoryWrite::SetLock(Some(LockState {
            holder: user,
            acquired_at: now,
        })))
    }

    /// Decides a release by `user`. Releasing an unlocked story changes
    /// nothing; releasing someone else's expired lock clears it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotOwned` if another user holds a live lock.
    pub fn decide_release(
        &self,
        story: &Story,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<StoryWrite, DomainError> {
        match &story.lock {
            None => Ok(StoryWrite::Unchanged),
            Some(lock) if lock.holder == user || self.is_expired(lock, now) => {
                Ok(StoryWrite::SetLock(None))
            }
            Some(_) => Err(DomainError::NotOwned { story_id: story.id }),
        }
    }

    /// Decides whether to clear `observed`, a lock seen expired during a
    /// read. Clears only if that same lock is still in place and still
    /// expired, so racing readers expire it once.
    #[must_use]
    pub fn decide_expire(&self, story: &Story, observed: &LockState, now: DateTime<Utc>) -> StoryWrite {
        match &story.lock {
            Some(lock) if lock == observed && self.is_expired(lock, now) => StoryWrite::SetLock(None),
            _ => StoryWrite::Unchanged,
        }
    }
}

/// Decides an append of `text` by `user`, who must hold the lock.
///
/// # Errors
///
/// Returns `DomainError::Validation` for blank text and
/// `DomainError::NotOwned` if `user` does not hold the lock.
pub fn decide_append(story: &Story, user: UserId, text: &str) -> Result<StoryWrite, DomainError> {
    if text.trim().is_empty() {
        return Err(DomainError::Validation("line text must not be empty".into()));
    }
    if !story.is_locked_by(user) {
        return Err(DomainError::NotOwned { story_id: story.id });
    }
    Ok(StoryWrite::AppendLine(Line {
        index: story.line_count(),
        text: text.to_owned(),
        author: Some(user),
    }))
}
