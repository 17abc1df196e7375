//! CLI interface and argument parsing
//!
//! This module handles command-line interface parsing and dispatches to the
//! step runner.

pub mod app;

// Re-export main types
pub use app::*;
