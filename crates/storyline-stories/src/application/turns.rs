//! Turn assignment: release the writer's previous story and hand out the
//! next one, or invite them to start a new story.

use std::sync::Mutex;

use serde::Serialize;
use storyline_core::clock::Clock;
use storyline_core::command::Command;
use storyline_core::config::StoryConfig;
use storyline_core::error::DomainError;
use storyline_core::identity::IdentityStore;
use storyline_core::repository::StoryRepository;
use storyline_core::rng::DeterministicRng;
use storyline_core::story::StoryId;
use tracing::info;

use crate::application::lock_manager::handle_release_lock;
use crate::application::selector::{Selection, handle_select_story};
use crate::domain::commands::{NextTurn, ReleaseLock, SelectStory};
use crate::domain::lock_policy::LockPolicy;

/// The line a writer is asked to continue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryPrompt {
    /// The story now locked by the writer.
    pub story_id: StoryId,
    /// Text of the most recent line.
    pub previous_line: String,
    /// Display name of whoever wrote the most recent line, if anyone.
    pub previous_author: Option<String>,
    /// One-based number of the line the writer is about to write.
    pub line_number: u32,
    /// The story's line limit.
    pub max_lines: u32,
}

/// What the writer should do next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TurnAssignment {
    /// Continue an existing story.
    Continuation(StoryPrompt),
    /// Nothing is available; start a new story with this line limit.
    Origination {
        /// Line limit for the story the writer will start.
        max_lines: u32,
    },
}

/// Handles the `NextTurn` command.
///
/// # Errors
///
/// Returns `DomainError::NotOwned` if the previous story is locked by
/// someone else, or `DomainError::Infrastructure` if a backing store fails.
pub async fn handle_next_turn(
    command: &NextTurn,
    config: &StoryConfig,
    clock: &dyn Clock,
    rng: &Mutex<dyn DeterministicRng + Send>,
    repo: &dyn StoryRepository,
    identity: &dyn IdentityStore,
) -> Result<TurnAssignment, DomainError> {
    let policy = LockPolicy::from_config(config);

    if let Some(previous) = command.previous_story_id {
        let release = ReleaseLock {
            correlation_id: command.correlation_id,
            story_id: previous,
            user_id: command.user_id,
        };
        handle_release_lock(&release, &policy, clock, repo).await?;
    }

    let select = SelectStory {
        correlation_id: command.correlation_id,
        user_id: command.user_id,
        seen_story_ids: command.seen_story_ids.clone(),
    };
    let story = match handle_select_story(&select, &policy, clock, rng, repo).await? {
        Selection::Assigned(story) => story,
        Selection::NoneAvailable => {
            info!(
                command = command.command_type(),
                correlation_id = %command.correlation_id(),
                user_id = %command.user_id(),
                "inviting writer to originate a story"
            );
            return Ok(TurnAssignment::Origination {
                max_lines: config.max_lines_default,
            });
        }
    };

    let (previous_line, author) = story
        .last_line()
        .map(|line| (line.text.clone(), line.author))
        .unwrap_or_default();
    let previous_author = match author {
        Some(id) => identity.find(id).await?.map(|user| user.display_name),
        None => None,
    };

    Ok(TurnAssignment::Continuation(StoryPrompt {
        story_id: story.id,
        previous_line,
        previous_author,
        line_number: story.line_count() + 1,
        max_lines: story.max_lines,
    }))
}
