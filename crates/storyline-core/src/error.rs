//! Domain error types.

use thiserror::Error;

use crate::story::{StoryId, UserId};

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The story does not exist, or is complete and no longer accepts work.
    #[error("story not found: {0}")]
    StoryNotFound(StoryId),

    /// Another user holds an unexpired lock on the story.
    #[error("story {story_id} is already locked by {holder}")]
    AlreadyLocked {
        /// The contested story.
        story_id: StoryId,
        /// The current lock holder.
        holder: UserId,
    },

    /// The caller does not hold the lock it tried to use or release.
    #[error("story {story_id} is not locked by the requesting user")]
    NotOwned {
        /// The story the caller does not own.
        story_id: StoryId,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// A user with the same display name is already registered.
    #[error("user already exists: {0}")]
    UserExists(String),

    /// No user is registered under the display name.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
