//! Step types and execution logic
//!
//! A template action is a tree of steps. Every step implements
//! [`Executable`]; a [`Steps`] list runs its children in order and stops at
//! the first failure, which is returned unchanged.

use crate::config::{check_step_shape, StepConfig};
use crate::error::{ConfigError, ConfigResult, ExecutionError, ExecutionResult};
use crate::runner::expression::{eval_bool_expression, is_truthy, value_to_string};
use crate::runner::render::render_dir;
use crate::runner::shell::run_shell;
use crate::runner::template::eval_prompt_value_template;
use crate::runner::Context;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Anything that can run against the shared context
pub trait Executable {
    fn execute(&self, ctx: &mut Context) -> ExecutionResult<()>;
}

/// Ordered list of steps
#[derive(Debug, Clone, Default)]
pub struct Steps(pub Vec<Step>);

impl Steps {
    /// Build runtime steps from their YAML form
    pub fn from_config(action: &str, configs: &[StepConfig]) -> ConfigResult<Self> {
        configs
            .iter()
            .map(|config| Step::from_config(action, config))
            .collect::<ConfigResult<Vec<_>>>()
            .map(Steps)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Executable for Steps {
    fn execute(&self, ctx: &mut Context) -> ExecutionResult<()> {
        for step in &self.0 {
            step.execute(ctx)?;
        }
        Ok(())
    }
}

/// A single step
#[derive(Debug, Clone)]
pub enum Step {
    If(If),
    Prompt(Prompt),
    Confirm(Confirm),
    Set(Set),
    Do(Do),
    Exec(Exec),
    Render(Render),
}

impl Step {
    /// Create from config, rejecting empty or ambiguous step mappings
    pub fn from_config(action: &str, config: &StepConfig) -> ConfigResult<Self> {
        let kind = check_step_shape(action, config)?;

        let step = if let Some(condition) = &config.if_ {
            Step::If(If {
                condition: condition.clone(),
                then: Steps::from_config(action, &config.then)?,
            })
        } else if let Some(input) = &config.input {
            Step::Prompt(Prompt {
                message: input.question.clone(),
                var: input.var.clone(),
                default: input.default.clone(),
            })
        } else if let Some(option) = &config.option {
            Step::Confirm(Confirm {
                message: option.question.clone(),
                var: option.var.clone(),
                default: option.default,
            })
        } else if let Some(vars) = &config.set {
            Step::Set(Set { vars: vars.clone() })
        } else if let Some(target) = &config.do_ {
            Step::Do(Do {
                action: target.clone(),
            })
        } else if let Some(command) = &config.exec {
            Step::Exec(Exec {
                command: command.clone(),
            })
        } else if let Some(source) = &config.render {
            Step::Render(Render {
                source: source.clone(),
            })
        } else {
            return Err(ConfigError::InvalidStep {
                action: action.to_string(),
                error: format!("unsupported step kind '{}'", kind),
            });
        };

        Ok(step)
    }
}

impl Executable for Step {
    fn execute(&self, ctx: &mut Context) -> ExecutionResult<()> {
        match self {
            Step::If(step) => step.execute(ctx),
            Step::Prompt(step) => step.execute(ctx),
            Step::Confirm(step) => step.execute(ctx),
            Step::Set(step) => step.execute(ctx),
            Step::Do(step) => step.execute(ctx),
            Step::Exec(step) => step.execute(ctx),
            Step::Render(step) => step.execute(ctx),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::If(step) => write!(f, "if {}", step.condition),
            Step::Prompt(step) => write!(f, "input {}", step.var),
            Step::Confirm(step) => write!(f, "option {}", step.var),
            Step::Set(step) => write!(
                f,
                "set {}",
                step.vars.keys().cloned().collect::<Vec<_>>().join(", ")
            ),
            Step::Do(step) => write!(f, "do {}", step.action),
            Step::Exec(step) => write!(f, "exec {}", step.command),
            Step::Render(step) => write!(f, "render {}", step.source),
        }
    }
}

/// Runs `then` only when `condition` evaluates to true
#[derive(Debug, Clone)]
pub struct If {
    pub condition: String,
    pub then: Steps,
}

impl Executable for If {
    fn execute(&self, ctx: &mut Context) -> ExecutionResult<()> {
        let result =
            eval_bool_expression(ctx, &self.condition).map_err(ExecutionError::Condition)?;
        if !result {
            ctx.print_debug(&format!(
                "Skipping sub-steps because condition {:?} evaluates to false",
                self.condition
            ));
            return Ok(());
        }

        ctx.print_debug(&format!(
            "Executing sub-steps because condition {:?} evaluates to true",
            self.condition
        ));
        self.then.execute(ctx)
    }
}

/// Asks the operator for a text value
#[derive(Debug, Clone)]
pub struct Prompt {
    pub message: String,
    pub var: String,
    pub default: String,
}

impl Executable for Prompt {
    fn execute(&self, ctx: &mut Context) -> ExecutionResult<()> {
        if ctx.is_set_explicitly(&self.var) {
            ctx.print_debug(&format!("Not prompting for '{}': set explicitly", self.var));
            return Ok(());
        }

        let message = eval_prompt_value_template(&ctx.values, &ctx.path_env_var, &self.message)?;

        // A value from an earlier run or step wins over the template default
        let default = match ctx.get_var(&self.var) {
            Some(existing) => value_to_string(existing),
            None => eval_prompt_value_template(&ctx.values, &ctx.path_env_var, &self.default)?,
        };

        let value = ctx.input(&message, &default)?;
        ctx.set_var(self.var.clone(), Value::String(value));
        ctx.on_values_changed()
    }
}

/// Asks the operator a yes/no question
#[derive(Debug, Clone)]
pub struct Confirm {
    pub message: String,
    pub var: String,
    pub default: bool,
}

impl Executable for Confirm {
    fn execute(&self, ctx: &mut Context) -> ExecutionResult<()> {
        if ctx.is_set_explicitly(&self.var) {
            ctx.print_debug(&format!("Not prompting for '{}': set explicitly", self.var));
            return Ok(());
        }

        let message = eval_prompt_value_template(&ctx.values, &ctx.path_env_var, &self.message)?;
        let default = ctx.get_var(&self.var).map(is_truthy).unwrap_or(self.default);

        let value = ctx.confirm(&message, default)?;
        ctx.set_var(self.var.clone(), Value::Bool(value));
        ctx.on_values_changed()
    }
}

/// Assigns computed values
///
/// Every template is rendered against the values as they were before the
/// step, then all results are written and the notifier runs once. Variables
/// set explicitly by the operator are left alone.
#[derive(Debug, Clone)]
pub struct Set {
    pub vars: BTreeMap<String, String>,
}

impl Executable for Set {
    fn execute(&self, ctx: &mut Context) -> ExecutionResult<()> {
        let mut rendered = Vec::with_capacity(self.vars.len());
        for (name, template) in &self.vars {
            if ctx.is_set_explicitly(name) {
                continue;
            }
            let value = eval_prompt_value_template(&ctx.values, &ctx.path_env_var, template)?;
            rendered.push((name.clone(), value));
        }

        if rendered.is_empty() {
            return Ok(());
        }
        for (name, value) in rendered {
            ctx.set_var(name, Value::String(value));
        }
        ctx.on_values_changed()
    }
}

/// Runs another action of the same template
#[derive(Debug, Clone)]
pub struct Do {
    pub action: String,
}

impl Executable for Do {
    fn execute(&self, ctx: &mut Context) -> ExecutionResult<()> {
        if ctx.is_action_in_stack(&self.action) {
            return Err(ExecutionError::RecursiveAction(self.action.clone()));
        }
        let steps = ctx
            .action(&self.action)
            .ok_or_else(|| ExecutionError::ActionNotFound(self.action.clone()))?;

        ctx.push_action(self.action.clone());
        ctx.print_debug(&format!("Running action: {}", self.action));
        let result = steps.execute(ctx);
        ctx.pop_action();

        result
    }
}

/// Runs a shell command in the project directory
#[derive(Debug, Clone)]
pub struct Exec {
    pub command: String,
}

impl Executable for Exec {
    fn execute(&self, ctx: &mut Context) -> ExecutionResult<()> {
        let command = eval_prompt_value_template(&ctx.values, &ctx.path_env_var, &self.command)?;
        ctx.print_command(&command);
        run_shell(&command, ctx)
    }
}

/// Renders a template directory into the project
#[derive(Debug, Clone)]
pub struct Render {
    pub source: String,
}

impl Executable for Render {
    fn execute(&self, ctx: &mut Context) -> ExecutionResult<()> {
        let source = eval_prompt_value_template(&ctx.values, &ctx.path_env_var, &self.source)?;
        let written = render_dir(ctx, &source)?;
        ctx.print_info(&format!("Rendered {} file(s) from {}", written.len(), source));
        Ok(())
    }
}

/// Run a named action against the context
pub fn run_action(ctx: &mut Context, action: &str) -> ExecutionResult<()> {
    Do {
        action: action.to_string(),
    }
    .execute(ctx)
}
