//! Story documents and the identifiers that name them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Monotonically assigned story identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(pub i64);

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque user identifier issued by the identity store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The exclusive claim a user holds on a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockState {
    /// The user permitted to write the next line.
    pub holder: UserId,
    /// When the lock was taken; the sunset timeout counts from here.
    pub acquired_at: DateTime<Utc>,
}

/// A single contributed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// Zero-based position within the story.
    pub index: u32,
    /// Line content. Never empty.
    pub text: String,
    /// The contributing user. `None` only for an unauthored seed line.
    pub author: Option<UserId>,
}

/// The first line a story is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedLine {
    /// Line content.
    pub text: String,
    /// The originating user, if the story was started by a writer.
    pub author: Option<UserId>,
}

impl SeedLine {
    /// A seed line with no author, used for built-in prompts.
    #[must_use]
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: None,
        }
    }

    /// A seed line written by `author`.
    #[must_use]
    pub fn authored(text: impl Into<String>, author: UserId) -> Self {
        Self {
            text: text.into(),
            author: Some(author),
        }
    }
}

/// A collaboratively written story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Story {
    /// Story identifier.
    pub id: StoryId,
    /// Number of lines after which the story is complete.
    pub max_lines: u32,
    /// Lines in index order.
    pub lines: Vec<Line>,
    /// Current lock, if any.
    pub lock: Option<LockState>,
}

impl Story {
    /// Number of lines written so far.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn line_count(&self) -> u32 {
        self.lines.len() as u32
    }

    /// Whether the story has reached its line limit.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.line_count() >= self.max_lines
    }

    /// Whether `user` wrote any line of this story.
    #[must_use]
    pub fn has_contribution_from(&self, user: UserId) -> bool {
        self.lines.iter().any(|line| line.author == Some(user))
    }

    /// Whether the story is currently locked by `user`.
    #[must_use]
    pub fn is_locked_by(&self, user: UserId) -> bool {
        self.lock.is_some_and(|lock| lock.holder == user)
    }

    /// The most recently written line.
    #[must_use]
    pub fn last_line(&self) -> Option<&Line> {
        self.lines.last()
    }
}
