//! Storyline Core — shared domain abstractions.
//!
//! This crate defines the story model and the traits the assignment logic
//! is written against: storage, identity, notification, time, and
//! randomness. It contains no infrastructure code.

pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod identity;
pub mod notifier;
pub mod repository;
pub mod rng;
pub mod story;
