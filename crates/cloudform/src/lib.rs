//! Cloudform CLI library
//!
//! The binary is a thin clap layer over these modules:
//!
//! - [`engine`]: runs reconcilers over a manifest and a state file
//! - [`state`]: `.cloudform/state.json` persistence and locking
//! - [`provider`]: builds the Linode resource registry
//! - [`commands`]: one handler per subcommand

pub mod commands;
pub mod engine;
pub mod error;
pub mod output;
pub mod provider;
pub mod state;

pub use engine::Engine;
pub use state::{ResourceRecord, StateFile, StateManager};
