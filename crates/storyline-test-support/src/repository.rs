//! Test repositories — `StoryRepository` implementations for tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use storyline_core::error::DomainError;
use storyline_core::repository::{StoryDecision, StoryRepository};
use storyline_core::story::{Line, SeedLine, Story, StoryId};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    stories: BTreeMap<StoryId, Story>,
}

/// A story repository held in process memory.
///
/// Each call takes one mutex for its whole duration, so `update` is atomic
/// with respect to every other call. Ids start at 1 and increase by one.
#[derive(Debug, Default)]
pub struct InMemoryStoryRepository {
    inner: Mutex<Inner>,
}

impl InMemoryStoryRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a story exactly as given, bypassing validation. Used to set up
    /// locks and line counts that would take several calls to reach.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn insert(&self, story: Story) {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id = inner.next_id.max(story.id.0);
        inner.stories.insert(story.id, story);
    }

    /// Returns a snapshot of every stored story, in id order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn snapshot(&self) -> Vec<Story> {
        self.inner.lock().unwrap().stories.values().cloned().collect()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, DomainError> {
        self.inner
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("story map mutex poisoned: {e}")))
    }
}

#[async_trait]
impl StoryRepository for InMemoryStoryRepository {
    async fn fetch(&self, id: StoryId) -> Result<Story, DomainError> {
        self.lock()?
            .stories
            .get(&id)
            .cloned()
            .ok_or(DomainError::StoryNotFound(id))
    }

    async fn create(&self, max_lines: u32, seed: SeedLine) -> Result<StoryId, DomainError> {
        if max_lines == 0 {
            return Err(DomainError::Validation("max_lines must be positive".into()));
        }
        if seed.text.trim().is_empty() {
            return Err(DomainError::Validation("line text must not be empty".into()));
        }
        let mut inner = self.lock()?;
        inner.next_id += 1;
        let id = StoryId(inner.next_id);
        inner.stories.insert(
            id,
            Story {
                id,
                max_lines,
                lines: vec![Line {
                    index: 0,
                    text: seed.text,
                    author: seed.author,
                }],
                lock: None,
            },
        );
        Ok(id)
    }

    async fn update(&self, id: StoryId, decide: StoryDecision<'_>) -> Result<Story, DomainError> {
        let mut inner = self.lock()?;
        let current = inner
            .stories
            .get(&id)
            .ok_or(DomainError::StoryNotFound(id))?;
        let write = decide(current)?;
        let mut next = current.clone();
        next.apply(&write)?;
        inner.stories.insert(id, next.clone());
        Ok(next)
    }

    async fn list_incomplete(&self) -> Result<Vec<Story>, DomainError> {
        Ok(self
            .lock()?
            .stories
            .values()
            .filter(|story| !story.is_complete())
            .cloned()
            .collect())
    }

    async fn has_story_starting_with(&self, text: &str) -> Result<bool, DomainError> {
        Ok(self
            .lock()?
            .stories
            .values()
            .any(|story| story.lines.first().is_some_and(|line| line.text == text)))
    }
}

/// A story repository that always returns an infrastructure error. Useful
/// for testing error-handling paths.
#[derive(Debug)]
pub struct FailingStoryRepository;

#[async_trait]
impl StoryRepository for FailingStoryRepository {
    async fn fetch(&self, _id: StoryId) -> Result<Story, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn create(&self, _max_lines: u32, _seed: SeedLine) -> Result<StoryId, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn update(
        &self,
        _id: StoryId,
        _decide: StoryDecision<'_>,
    ) -> Result<Story, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn list_incomplete(&self) -> Result<Vec<Story>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn has_story_starting_with(&self, _text: &str) -> Result<bool, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
