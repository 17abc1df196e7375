//! Configuration parsing and validation
//!
//! This module handles parsing of template `spec.yaml` files, the persisted
//! project state, and discovery of the templates home.

pub mod home;
pub mod parse;
pub mod schema;
pub mod types;

// Re-export main types
pub use home::*;
pub use parse::*;
pub use schema::*;
pub use types::*;
