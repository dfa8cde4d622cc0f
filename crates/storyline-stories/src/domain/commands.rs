//! Commands for the story assignment context.

use std::collections::BTreeSet;

use storyline_core::command::Command;
use storyline_core::story::{StoryId, UserId};
use uuid::Uuid;

/// Command to take the writing lock on a story.
#[derive(Debug, Clone)]
pub struct AcquireLock {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The story to lock.
    pub story_id: StoryId,
    /// The user taking the lock.
    pub user_id: UserId,
}

/// Command to give up the writing lock on a story.
#[derive(Debug, Clone)]
pub struct ReleaseLock {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The story to unlock.
    pub story_id: StoryId,
    /// The user giving up the lock.
    pub user_id: UserId,
}

/// Command to pick and lock a story for a writer.
#[derive(Debug, Clone)]
pub struct SelectStory {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The writer asking for a story.
    pub user_id: UserId,
    /// Stories the writer has already been shown this session.
    pub seen_story_ids: BTreeSet<StoryId>,
}

/// Command to append a line to a locked story.
#[derive(Debug, Clone)]
pub struct SubmitLine {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The story being extended.
    pub story_id: StoryId,
    /// The lock holder submitting the line.
    pub user_id: UserId,
    /// The contributed line.
    pub text: String,
}

/// Command to start a brand-new story.
#[derive(Debug, Clone)]
pub struct OriginateStory {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Line limit for the new story.
    pub max_lines: u32,
    /// The writer of the first line.
    pub author: UserId,
    /// The first line.
    pub text: String,
}

/// Command to finish the previous turn and get the next one.
#[derive(Debug, Clone)]
pub struct NextTurn {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The writer asking for a turn.
    pub user_id: UserId,
    /// The story the writer was last shown, whose lock is released first.
    pub previous_story_id: Option<StoryId>,
    /// Stories the writer has already been shown this session.
    pub seen_story_ids: BTreeSet<StoryId>,
}

macro_rules! impl_command {
    ($ty:ty, $name:literal, $user:ident) => {
        impl Command for $ty {
            fn command_type(&self) -> &'static str {
                $name
            }

            fn correlation_id(&self) -> Uuid {
                self.correlation_id
            }

            fn user_id(&self) -> UserId {
                self.$user
            }
        }
    };
}

impl_command!(AcquireLock, "stories.acquire_lock", user_id);
impl_command!(ReleaseLock, "stories.release_lock", user_id);
impl_command!(SelectStory, "stories.select_story", user_id);
impl_command!(SubmitLine, "stories.submit_line", user_id);
impl_command!(OriginateStory, "stories.originate_story", author);
impl_command!(NextTurn, "stories.next_turn", user_id);
