//! Completion sink that writes finished stories to the log.

use async_trait::async_trait;
use storyline_core::error::DomainError;
use storyline_core::notifier::CompletionNotifier;
use tracing::info;

/// Publishes completed stories as structured log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl CompletionNotifier for LogNotifier {
    async fn notify(&self, full_text: &str) -> Result<(), DomainError> {
        info!(full_text, "story completed");
        Ok(())
    }
}
