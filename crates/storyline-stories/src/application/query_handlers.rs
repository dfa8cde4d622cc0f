//! Query handlers for the story assignment context.
//!
//! This module contains query handlers that load stories and return
//! read-only view DTOs.

use serde::Serialize;
use storyline_core::error::DomainError;
use storyline_core::identity::IdentityStore;
use storyline_core::repository::StoryRepository;
use storyline_core::story::StoryId;

use crate::application::line_editor::author_names;

/// Read-only view of a single line.
#[derive(Debug, Serialize)]
pub struct LineView {
    /// Zero-based position.
    pub index: u32,
    /// Line content.
    pub text: String,
    /// Author display name, absent for an unauthored seed.
    pub author: Option<String>,
}

/// Read-only view of a story.
#[derive(Debug, Serialize)]
pub struct StoryView {
    /// The story identifier.
    pub story_id: StoryId,
    /// The story's line limit.
    pub max_lines: u32,
    /// Number of lines written so far.
    pub line_count: u32,
    /// Whether the story has reached its line limit.
    pub complete: bool,
    /// Display name of the current lock holder, if locked.
    pub locked_by: Option<String>,
    /// Lines in index order.
    pub lines: Vec<LineView>,
}

/// Retrieves a story by its ID.
///
/// # Errors
///
/// Returns `DomainError::StoryNotFound` if no story has the ID.
/// Returns `DomainError::Infrastructure` if a backing store fails.
pub async fn get_story_by_id(
    story_id: StoryId,
    repo: &dyn StoryRepository,
    identity: &dyn IdentityStore,
) -> Result<StoryView, DomainError> {
    let story = repo.fetch(story_id).await?;
    let names = author_names(identity, &story).await?;
    let locked_by = match story.lock {
        Some(lock) => Some(
            identity
                .find(lock.holder)
                .await?
                .map_or_else(|| lock.holder.to_string(), |user| user.display_name),
        ),
        None => None,
    };

    Ok(StoryView {
        story_id: story.id,
        max_lines: story.max_lines,
        line_count: story.line_count(),
        complete: story.is_complete(),
        locked_by,
        lines: story
            .lines
            .iter()
            .map(|line| LineView {
                index: line.index,
                text: line.text.clone(),
                author: line.author.map(|id| {
                    names.get(&id).cloned().unwrap_or_else(|| id.to_string())
                }),
            })
            .collect(),
    })
}
