//! CLI command handlers

pub mod commands;

pub use commands::{build, check, rules};
