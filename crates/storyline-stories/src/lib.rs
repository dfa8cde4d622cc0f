//! Storyline — story assignment bounded context.
//!
//! Responsible for handing each writer exactly one story at a time, expiring
//! abandoned locks, appending contributed lines, and announcing stories that
//! reach their line limit.

pub mod application;
pub mod domain;
