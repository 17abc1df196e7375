//! Step execution engine
//!
//! This module walks a template's step tree against a shared context,
//! evaluating conditions, prompting for values and generating files.

pub mod context;
pub mod expression;
pub mod notify;
pub mod prompt;
pub mod render;
pub mod shell;
pub mod step;
pub mod template;

// Re-export main types
pub use context::*;
pub use expression::{eval_bool_expression, parse_expression, Expr, Scope};
pub use notify::*;
pub use prompt::*;
pub use render::render_dir;
pub use shell::run_shell;
pub use step::*;
pub use template::{eval_prompt_value_template, render_template};
