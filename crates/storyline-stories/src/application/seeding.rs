//! Prompt seeding: stocks the repository with unauthored opening lines.

use storyline_core::config::check_max_lines;
use storyline_core::error::DomainError;
use storyline_core::identity::IdentityStore;
use storyline_core::notifier::CompletionNotifier;
use storyline_core::repository::StoryRepository;
use storyline_core::story::{SeedLine, StoryId};
use tracing::{debug, info};

use crate::application::line_editor::announce_completion;

/// Opening lines used when an empty deployment is seeded.
pub const DEFAULT_PROMPTS: [&str; 4] = [
    "I write this sitting in the kitchen sink.",
    "'Twas a dark and stormy night.",
    "In my younger and more vulnerable years my father gave me some advice that I've been turning over in my mind ever since.",
    "I am an invisible man.",
];

/// Creates one story per prompt, skipping prompts that already open a story.
/// Returns the ids of the stories created. With a one-line limit each seeded
/// story is already complete and is announced straight away.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an out-of-range line limit or blank
/// prompt, or `DomainError::Infrastructure` if the repository fails.
pub async fn seed_prompts(
    prompts: &[&str],
    max_lines: u32,
    repo: &dyn StoryRepository,
    identity: &dyn IdentityStore,
    notifier: &dyn CompletionNotifier,
) -> Result<Vec<StoryId>, DomainError> {
    check_max_lines(max_lines)?;
    let mut created = Vec::new();
    for prompt in prompts {
        if repo.has_story_starting_with(prompt).await? {
            debug!(prompt, "prompt already seeded");
            continue;
        }
        let story_id = repo.create(max_lines, SeedLine::prompt(*prompt)).await?;
        let story = repo.fetch(story_id).await?;
        if story.is_complete() {
            announce_completion(&story, identity, notifier).await;
        }
        created.push(story_id);
    }
    info!(created = created.len(), "seeded story prompts");
    Ok(created)
}
