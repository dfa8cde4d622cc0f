//! Pure domain logic for the story assignment context.

pub mod commands;
pub mod lock_policy;
pub mod rendering;
