//! Command abstractions.

use uuid::Uuid;

use crate::story::UserId;

/// A request from one writer to change story state.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Dotted name used as the `command` field in log events.
    fn command_type(&self) -> &'static str;

    /// Correlation ID tying together every log line for one request.
    fn correlation_id(&self) -> Uuid;

    /// The writer on whose behalf the command runs.
    fn user_id(&self) -> UserId;
}
