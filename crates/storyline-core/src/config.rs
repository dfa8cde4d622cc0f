//! Tunables consumed by the story assignment logic.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Default number of lines in a newly originated story.
pub const DEFAULT_MAX_LINES: u32 = 5;

/// Default seconds after which an unreleased lock is considered abandoned.
pub const DEFAULT_LOCK_SUNSET_SECONDS: u64 = 180;

/// Largest line limit a story may carry; the store keeps it as a signed
/// 32-bit column.
pub const MAX_LINES_LIMIT: u32 = i32::MAX.unsigned_abs();

/// Checks that `max_lines` is positive and no larger than [`MAX_LINES_LIMIT`].
///
/// # Errors
///
/// Returns `DomainError::Validation` when it is out of range.
pub fn check_max_lines(max_lines: u32) -> Result<(), DomainError> {
    if max_lines == 0 {
        return Err(DomainError::Validation("max_lines must be positive".into()));
    }
    if max_lines > MAX_LINES_LIMIT {
        return Err(DomainError::Validation(format!(
            "max_lines must not exceed {MAX_LINES_LIMIT}"
        )));
    }
    Ok(())
}

/// Story assignment configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryConfig {
    /// Line limit given to stories originated by writers.
    pub max_lines_default: u32,
    /// Lock sunset timeout in seconds.
    pub lock_sunset_seconds: u64,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            max_lines_default: DEFAULT_MAX_LINES,
            lock_sunset_seconds: DEFAULT_LOCK_SUNSET_SECONDS,
        }
    }
}

impl StoryConfig {
    /// Checks that both values are positive and representable.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` naming the offending field.
    pub fn validate(&self) -> Result<(), DomainError> {
        check_max_lines(self.max_lines_default).map_err(|_| {
            DomainError::Validation(format!(
                "max_lines_default must be between 1 and {MAX_LINES_LIMIT}"
            ))
        })?;
        if self.lock_sunset_seconds == 0 || i64::try_from(self.lock_sunset_seconds).is_err() {
            return Err(DomainError::Validation(
                "lock_sunset_seconds must be a positive number of seconds".into(),
            ));
        }
        Ok(())
    }

    /// The sunset timeout as a duration.
    #[must_use]
    pub fn lock_sunset(&self) -> TimeDelta {
        let seconds = i64::try_from(self.lock_sunset_seconds).unwrap_or(i64::MAX);
        TimeDelta::try_seconds(seconds).unwrap_or(TimeDelta::MAX)
    }
}
