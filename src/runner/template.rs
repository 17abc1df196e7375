//! Template rendering
//!
//! Resolves `{{ expr }}` markers in strings. Each marker holds an expression
//! (usually a variable reference such as `{{ .name }}`) whose value is
//! rendered in place. Undefined variables render as empty text. A `}}`
//! inside a string literal does not close the marker.

use crate::config::Values;
use crate::error::{ExpressionError, ExpressionResult};
use crate::runner::expression::{eval_expression, value_to_string, Scope};
use regex::Regex;
use std::sync::OnceLock;

// Marker body: quoted strings, raw strings, or any text without `}}`
const MARKER_PATTERN: &str =
    r#"(?s)\{\{((?:"(?:[^"\\]|\\.)*"|`[^`]*`|[^"`}]|\}[^"`}])*)\}\}"#;

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(MARKER_PATTERN).expect("valid marker regex"))
}

/// Render a prompt message, default or any other value template
pub fn eval_prompt_value_template(
    values: &Values,
    path_env_var: &str,
    template: &str,
) -> ExpressionResult<String> {
    let scope = Scope::new(values).with_path_env_var(path_env_var);
    render_template(&scope, template)
}

/// Render a template against a scope
pub fn render_template(scope: &Scope<'_>, template: &str) -> ExpressionResult<String> {
    let mut result = String::with_capacity(template.len());
    let mut last = 0;

    for caps in marker_regex().captures_iter(template) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        result.push_str(&template[last..whole.start()]);

        let value = eval_expression(scope, inner.as_str()).map_err(|e| in_template(e, template))?;
        result.push_str(&value_to_string(&value));
        last = whole.end();
    }

    let tail = &template[last..];
    if tail.contains("{{") {
        return Err(ExpressionError::Parse {
            expression: template.to_string(),
            message: "unclosed action: missing '}}'".to_string(),
        });
    }
    result.push_str(tail);

    Ok(result)
}

/// Check whether a string contains template markers at all
pub fn has_markers(s: &str) -> bool {
    s.contains("{{")
}

/// Report marker errors against the whole template text
fn in_template(err: ExpressionError, template: &str) -> ExpressionError {
    match err {
        ExpressionError::Parse {
            expression,
            message,
        } => ExpressionError::Parse {
            expression: template.to_string(),
            message: format!("in {{{{{}}}}}: {}", expression, message),
        },
        ExpressionError::Evaluation {
            expression,
            message,
        } => ExpressionError::Evaluation {
            expression: template.to_string(),
            message: format!("in {{{{{}}}}}: {}", expression, message),
        },
    }
}
