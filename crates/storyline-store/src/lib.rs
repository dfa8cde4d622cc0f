//! Storyline — `PostgreSQL` persistence.

pub mod pg_identity_store;
pub mod pg_story_repository;
pub mod schema;
