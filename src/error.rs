//! Error types for Scaff

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Scaff operations
pub type Result<T> = std::result::Result<T, ScaffError>;

/// Main error type for Scaff
#[derive(Error, Debug)]
pub enum ScaffError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Step execution errors
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(serde_yaml::Error),
}

// The wrapped error is part of the message, so it is not also a source
impl From<io::Error> for ScaffError {
    fn from(err: io::Error) -> Self {
        ScaffError::Io(err)
    }
}

impl From<serde_yaml::Error> for ScaffError {
    fn from(err: serde_yaml::Error) -> Self {
        ScaffError::Yaml(err)
    }
}

/// Template metadata and environment errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Template '{0}' does not exist")]
    TemplateNotFound(String),

    #[error("Action '{0}' is not defined")]
    ActionNotFound(String),

    #[error("Invalid step in action '{action}': {error}")]
    InvalidStep { action: String, error: String },

    #[error("Circular action invocation detected: {0}")]
    CircularDependency(String),

    #[error("Invalid variable assignment '{0}' (expected NAME=VALUE)")]
    InvalidAssignment(String),

    #[error("Failed to read '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },
}

/// Errors raised while walking a step tree
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("evaluating if conditional: {0}")]
    Condition(ExpressionError),

    #[error(transparent)]
    Template(#[from] ExpressionError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error("Command failed with exit code {0:?}")]
    CommandFailed(Option<i32>),

    #[error("Failed to start command '{command}': {error}")]
    Spawn { command: String, error: String },

    #[error("Action '{0}' is not defined")]
    ActionNotFound(String),

    #[error("Action '{0}' invokes itself recursively")]
    RecursiveAction(String),

    #[error("Failed to render '{path}': {error}")]
    Render { path: PathBuf, error: String },
}

/// Expression and template errors
///
/// Both variants carry the offending expression text. Neither is ever
/// equivalent to a false condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("parse expression {expression:?}: {message}")]
    Parse { expression: String, message: String },

    #[error("evaluate expression {expression:?}: {message}")]
    Evaluation { expression: String, message: String },
}

impl ExpressionError {
    /// The expression text the error refers to
    pub fn expression(&self) -> &str {
        match self {
            ExpressionError::Parse { expression, .. }
            | ExpressionError::Evaluation { expression, .. } => expression,
        }
    }
}

/// Interactive input errors
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Prompt aborted: no input available")]
    Aborted,

    #[error("Failed to read input: {0}")]
    Io(io::Error),

    #[error("Invalid answer '{0}' (expected yes or no)")]
    InvalidAnswer(String),
}

impl From<io::Error> for InputError {
    fn from(err: io::Error) -> Self {
        InputError::Io(err)
    }
}

/// Change notification errors
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Failed to persist project state to '{path}': {error}")]
    Persist { path: PathBuf, error: String },

    #[error("Change notification failed: {0}")]
    Other(String),
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Specialized result type for expression operations
pub type ExpressionResult<T> = std::result::Result<T, ExpressionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_error_message() {
        let err = ExecutionError::Condition(ExpressionError::Parse {
            expression: "x ++ 1".to_string(),
            message: "unexpected character '+'".to_string(),
        });
        let msg = err.to_string();
        assert!(msg.starts_with("evaluating if conditional: "));
        assert!(msg.contains("x ++ 1"));
    }

    fn chain(err: impl std::error::Error + Send + Sync + 'static) -> String {
        format!("{:#}", anyhow::Error::new(err))
    }

    #[test]
    fn test_error_chain_mentions_cause_once() {
        let parse = ExpressionError::Parse {
            expression: "x ++ 1".to_string(),
            message: "unexpected character '+'".to_string(),
        };

        let text = chain(ScaffError::from(ExecutionError::Condition(parse.clone())));
        assert_eq!(text.matches("unexpected character").count(), 1);
        assert!(text.starts_with("evaluating if conditional: "));

        let text = chain(ScaffError::from(ExecutionError::from(parse)));
        assert_eq!(text.matches("unexpected character").count(), 1);

        let io = io::Error::new(io::ErrorKind::Other, "disk gone");
        assert_eq!(chain(InputError::from(io)).matches("disk gone").count(), 1);

        let io = io::Error::new(io::ErrorKind::Other, "disk gone");
        assert_eq!(chain(ScaffError::from(io)).matches("disk gone").count(), 1);
    }

    #[test]
    fn test_expression_accessor() {
        let err = ExpressionError::Evaluation {
            expression: "frob .x".to_string(),
            message: "unknown function".to_string(),
        };
        assert_eq!(err.expression(), "frob .x");
    }
}
