//! Craftwatch updater library.
//!
//! This library exposes internal modules for integration testing.
//! In production, `craftwatch-updater` is used as a binary (main.rs).

pub mod cli;
pub mod config;
pub mod error;
pub mod modrinth;
pub mod slug;
pub mod updater;
