//! Plain-text rendering of finished stories.

use std::collections::HashMap;

use storyline_core::story::{Story, UserId};

/// Renders every line in index order, one per row. Authored lines get a
/// `(by <name>)` suffix; authors missing from `names` fall back to their id.
#[must_use]
pub fn render_full_text(story: &Story, names: &HashMap<UserId, String>) -> String {
    story
        .lines
        .iter()
        .map(|line| match line.author {
            None => line.text.clone(),
            Some(author) => {
                let name = names
                    .get(&author)
                    .cloned()
                    .unwrap_or_else(|| author.to_string());
                format!("{} (by {name})", line.text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
