//! Craftwatch daemon library.
//!
//! This library exposes internal modules for integration testing.
//! In production, `craftwatch-daemon` is used as a binary (main.rs).

pub mod cli;
pub mod health;
pub mod logging;
pub mod orchestrator;
