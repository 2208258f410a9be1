//! CLI Module Organization
//!
//! - args: CLI argument structures
//! - commands: command execution and configuration loading
//! - output: rendering fingerprint matrices as JSON, JSONL or CSV

pub mod args;
pub mod commands;
pub mod output;

// Re-export commonly used items for convenience
pub use args::*;
pub use commands::*;
