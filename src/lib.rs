// Public API
pub mod cli;
pub mod commands;

// Core domain types
pub mod cleanup;
pub mod config;
pub mod delegate;
pub mod launcher;
pub mod npm;
pub mod tool;
pub mod ui;
pub mod updater;
pub mod util;

// Re-export main types
pub use config::Config;
pub use launcher::{LaunchOutcome, Launcher};
pub use tool::ManagedToolReference;
