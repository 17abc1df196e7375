//! Template spec validation
//!
//! This module checks step shapes and action references before anything runs.

use crate::config::types::{StepConfig, TemplateSpec};
use crate::error::{ConfigError, ConfigResult};
use std::collections::HashSet;

/// Validate a complete template spec
pub fn validate_spec(spec: &TemplateSpec) -> ConfigResult<()> {
    for (name, action) in &spec.actions {
        validate_steps(spec, name, &action.steps)?;
    }

    detect_circular_actions(spec)?;

    Ok(())
}

/// Validate a list of steps belonging to an action
fn validate_steps(spec: &TemplateSpec, action: &str, steps: &[StepConfig]) -> ConfigResult<()> {
    for step in steps {
        validate_step(spec, action, step)?;
    }
    Ok(())
}

/// Check that a step carries exactly one kind, returning that kind
///
/// `then` is only accepted next to `if`. Children are not checked.
pub fn check_step_shape(action: &str, step: &StepConfig) -> ConfigResult<&'static str> {
    let invalid = |error: String| ConfigError::InvalidStep {
        action: action.to_string(),
        error,
    };

    let kinds = step.kinds();
    let kind = match kinds.as_slice() {
        [] if !step.then.is_empty() => {
            return Err(invalid("'then' requires an 'if' condition".to_string()))
        }
        [] => return Err(invalid("empty step".to_string())),
        [kind] => *kind,
        _ => {
            return Err(invalid(format!(
                "step mixes several kinds: {}",
                kinds.join(", ")
            )))
        }
    };

    if !step.then.is_empty() && step.if_.is_none() {
        return Err(invalid(format!("'then' is not allowed on '{}'", kind)));
    }
    Ok(kind)
}

/// Validate a single step (and its children)
pub fn validate_step(spec: &TemplateSpec, action: &str, step: &StepConfig) -> ConfigResult<()> {
    let invalid = |error: String| ConfigError::InvalidStep {
        action: action.to_string(),
        error,
    };

    check_step_shape(action, step)?;

    if let Some(input) = &step.input {
        validate_var_name(&input.var).map_err(invalid)?;
    }
    if let Some(option) = &step.option {
        validate_var_name(&option.var).map_err(invalid)?;
    }
    if let Some(assignments) = &step.set {
        for name in assignments.keys() {
            validate_var_name(name).map_err(invalid)?;
        }
    }
    if let Some(target) = &step.do_ {
        if !spec.actions.contains_key(target) {
            return Err(ConfigError::ActionNotFound(target.clone()));
        }
    }

    validate_steps(spec, action, &step.then)
}

/// Validate a variable name used as a prompt target or assignment
fn validate_var_name(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(format!("invalid variable name '{}'", name))
    }
}

/// Detect circular `do` references between actions
fn detect_circular_actions(spec: &TemplateSpec) -> ConfigResult<()> {
    let mut visited = HashSet::new();
    for action_name in spec.actions.keys() {
        let mut stack = Vec::new();
        check_action_cycle(spec, action_name, &mut visited, &mut stack)?;
    }
    Ok(())
}

/// Recursively check for cycles in action invocations
fn check_action_cycle(
    spec: &TemplateSpec,
    action_name: &str,
    visited: &mut HashSet<String>,
    stack: &mut Vec<String>,
) -> ConfigResult<()> {
    // Check if we've found a cycle
    if stack.iter().any(|a| a == action_name) {
        stack.push(action_name.to_string());
        return Err(ConfigError::CircularDependency(stack.join(" -> ")));
    }

    // Skip if already fully processed
    if visited.contains(action_name) {
        return Ok(());
    }

    let action = spec
        .actions
        .get(action_name)
        .ok_or_else(|| ConfigError::ActionNotFound(action_name.to_string()))?;

    stack.push(action_name.to_string());

    let mut invoked = Vec::new();
    collect_invoked_actions(&action.steps, &mut invoked);
    for target in invoked {
        check_action_cycle(spec, &target, visited, stack)?;
    }

    stack.pop();
    visited.insert(action_name.to_string());

    Ok(())
}

/// Collect the targets of every `do` step, including nested ones
fn collect_invoked_actions(steps: &[StepConfig], invoked: &mut Vec<String>) {
    for step in steps {
        if let Some(target) = &step.do_ {
            invoked.push(target.clone());
        }
        collect_invoked_actions(&step.then, invoked);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_spec;

    #[test]
    fn test_validate_valid_spec() {
        let spec = parse_spec(
            r#"
actions:
  create:
    - input:
        question: Name?
        var: name
    - if: exists .name
      then:
        - do: init
  init:
    - exec: git init
"#,
        )
        .unwrap();

        assert!(validate_spec(&spec).is_ok());
    }

    #[test]
    fn test_validate_empty_step() {
        let spec = parse_spec("actions:\n  create:\n    - {}\n").unwrap();
        let result = validate_spec(&spec);
        assert!(matches!(result, Err(ConfigError::InvalidStep { .. })));
    }

    #[test]
    fn test_validate_mixed_step() {
        let spec = parse_spec(
            r#"
actions:
  create:
    - exec: ls
      render: ./src
"#,
        )
        .unwrap();
        let err = validate_spec(&spec).unwrap_err();
        assert!(err.to_string().contains("exec, render"));
    }

    #[test]
    fn test_validate_then_without_if() {
        let spec = parse_spec(
            r#"
actions:
  create:
    - exec: ls
      then:
        - exec: pwd
"#,
        )
        .unwrap();
        assert!(matches!(
            validate_spec(&spec),
            Err(ConfigError::InvalidStep { .. })
        ));
    }

    #[test]
    fn test_check_step_shape_returns_kind() {
        let spec = parse_spec(
            r#"
actions:
  create:
    - if: .docker
      then:
        - render: ./docker
    - set:
        a: b
"#,
        )
        .unwrap();
        let steps = &spec.actions["create"].steps;
        assert_eq!(check_step_shape("create", &steps[0]).unwrap(), "if");
        assert_eq!(check_step_shape("create", &steps[1]).unwrap(), "set");

        let empty = StepConfig::default();
        assert!(check_step_shape("create", &empty).is_err());
    }

    #[test]
    fn test_validate_unknown_action() {
        let spec = parse_spec("actions:\n  create:\n    - do: missing\n").unwrap();
        assert!(matches!(
            validate_spec(&spec),
            Err(ConfigError::ActionNotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_validate_bad_var_name() {
        let spec = parse_spec(
            r#"
actions:
  create:
    - set:
        "1abc": x
"#,
        )
        .unwrap();
        assert!(validate_spec(&spec).is_err());
    }

    #[test]
    fn test_detect_circular_dependency() {
        let spec = parse_spec(
            r#"
actions:
  a:
    - do: b
  b:
    - if: "true"
      then:
        - do: a
"#,
        )
        .unwrap();

        let result = validate_spec(&spec);
        assert!(matches!(result, Err(ConfigError::CircularDependency(_))));
    }
}
