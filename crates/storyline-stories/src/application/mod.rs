//! Application services: each handler runs one operation against the
//! injected repository, identity store, clock, and RNG.

pub mod line_editor;
pub mod lock_manager;
pub mod query_handlers;
pub mod seeding;
pub mod selector;
pub mod turns;
