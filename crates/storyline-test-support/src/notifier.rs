//! Test notifiers — `CompletionNotifier` doubles.

use std::sync::Mutex;

use async_trait::async_trait;
use storyline_core::error::DomainError;
use storyline_core::notifier::CompletionNotifier;

/// A notifier that records every delivered text.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    delivered: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    /// Create a notifier with nothing recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all delivered texts.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionNotifier for RecordingNotifier {
    async fn notify(&self, full_text: &str) -> Result<(), DomainError> {
        self.delivered
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("notifier mutex poisoned: {e}")))?
            .push(full_text.to_owned());
        Ok(())
    }
}

/// A notifier that always fails.
#[derive(Debug)]
pub struct FailingNotifier;

#[async_trait]
impl CompletionNotifier for FailingNotifier {
    async fn notify(&self, _full_text: &str) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("webhook unreachable".into()))
    }
}
