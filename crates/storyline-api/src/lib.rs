//! Storyline — HTTP API library.
//!
//! The binary in `main.rs` wires these modules together; integration tests
//! build the same router through [`routes::app`].

pub mod config;
pub mod error;
pub mod notifier;
pub mod routes;
pub mod state;
pub mod telemetry;
