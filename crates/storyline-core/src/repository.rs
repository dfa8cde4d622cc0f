//! Story repository abstraction.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::story::{Line, LockState, SeedLine, Story, StoryId};

/// A single mutation of one story, decided inside an atomic step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryWrite {
    /// Leave the story as it is.
    Unchanged,
    /// Replace the lock field.
    SetLock(Option<LockState>),
    /// Append a line. Always clears the lock.
    AppendLine(Line),
}

/// Decides the write to perform given the story's current committed state.
///
/// Returning `Err` aborts the step without writing anything.
pub type StoryDecision<'a> = &'a (dyn Fn(&Story) -> Result<StoryWrite, DomainError> + Send + Sync);

impl Story {
    /// Applies `write` to this in-memory story, enforcing the line and
    /// completion invariants.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the write would break an
    /// invariant: appending to a complete story, an out-of-sequence index,
    /// empty text, or locking a complete story.
    pub fn apply(&mut self, write: &StoryWrite) -> Result<(), DomainError> {
        match write {
            StoryWrite::Unchanged => {}
            StoryWrite::SetLock(lock) => {
                if lock.is_some() && self.is_complete() {
                    return Err(DomainError::Validation(format!(
                        "story {} is complete and cannot be locked",
                        self.id
                    )));
                }
                self.lock = *lock;
            }
            StoryWrite::AppendLine(line) => {
                if self.is_complete() {
                    return Err(DomainError::Validation(format!(
                        "story {} is complete",
                        self.id
                    )));
                }
                if line.index != self.line_count() {
                    return Err(DomainError::Validation(format!(
                        "line index {} out of sequence for story {} (expected {})",
                        line.index,
                        self.id,
                        self.line_count()
                    )));
                }
                if line.text.trim().is_empty() {
                    return Err(DomainError::Validation("line text must not be empty".into()));
                }
                self.lines.push(line.clone());
                self.lock = None;
            }
        }
        Ok(())
    }
}

/// Repository trait for persisted stories.
///
/// Every method is atomic with respect to other calls on the same story.
/// `update` is the primitive the lock logic is built on: the backend reads
/// the story, runs `decide`, and commits the chosen write as one indivisible
/// step.
#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Load a story with all of its lines.
    async fn fetch(&self, id: StoryId) -> Result<Story, DomainError>;

    /// Create a story with a single seed line and no lock.
    async fn create(&self, max_lines: u32, seed: SeedLine) -> Result<StoryId, DomainError>;

    /// Atomically read the story, decide a write, and commit it. Returns the
    /// story as committed.
    async fn update(&self, id: StoryId, decide: StoryDecision<'_>) -> Result<Story, DomainError>;

    /// All stories that have fewer lines than their maximum, in id order.
    async fn list_incomplete(&self) -> Result<Vec<Story>, DomainError>;

    /// Whether any story's first line has exactly this text.
    async fn has_story_starting_with(&self, text: &str) -> Result<bool, DomainError>;

    /// Unconditionally append `line`, clearing the lock.
    async fn append_line(&self, id: StoryId, line: Line) -> Result<Story, DomainError> {
        self.update(id, &move |_: &Story| Ok(StoryWrite::AppendLine(line.clone())))
            .await
    }

    /// Unconditionally replace the lock field.
    async fn set_lock(&self, id: StoryId, lock: Option<LockState>) -> Result<(), DomainError> {
        self.update(id, &move |_: &Story| Ok(StoryWrite::SetLock(lock)))
            .await
            .map(|_| ())
    }
}
