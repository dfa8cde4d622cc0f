//! Completion notifier abstraction.

use async_trait::async_trait;

use crate::error::DomainError;

/// Sink that receives the full text of every story that completes.
///
/// Delivery is best effort. Callers log and discard any error.
#[async_trait]
pub trait CompletionNotifier: Send + Sync {
    /// Deliver the assembled story text.
    async fn notify(&self, full_text: &str) -> Result<(), DomainError>;
}
