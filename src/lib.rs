//! Scaff - a step-driven project scaffolder
//!
//! Templates declare actions as trees of steps (conditions, prompts,
//! assignments, shell commands and directory rendering) in a `spec.yaml`.
//! Scaff walks those steps against a shared variable context to generate
//! and later update projects.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;

// Re-export commonly used types
pub use error::{Result, ScaffError};

/// Current version of Scaff
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
