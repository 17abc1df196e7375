//! Execution context for step walking
//!
//! The context tracks all the state shared by the steps of one run. It is
//! created once and handed to every step as `&mut Context`, so variables set
//! by one step are visible to every step that runs after it.

use crate::config::{TemplateSpec, Values};
use crate::error::{ConfigResult, ExecutionResult, InputError};
use crate::runner::notify::{ChangeNotifier, NoopNotifier};
use crate::runner::prompt::{Prompter, TerminalPrompter};
use crate::runner::step::Steps;
use colored::Colorize;
use serde_yaml::Value;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::rc::Rc;

/// Execution context that tracks state during a scaffolding run
pub struct Context {
    /// Directory the project is generated into
    pub project_dir: PathBuf,

    /// Directory of the template being applied
    pub template_dir: PathBuf,

    /// Variable values (defaults, project state, prompts, assignments)
    pub values: Values,

    /// Variables explicitly supplied by the operator; never prompted for
    pub set_vars: Values,

    /// PATH given to templates and shell steps
    pub path_env_var: String,

    /// Shell interpreter (e.g., ["bash", "-c"])
    pub interpreter: Vec<String>,

    /// Stack of actions being executed (for detecting recursion)
    pub action_stack: Vec<String>,

    /// Verbosity level
    pub verbosity: Verbosity,

    actions: HashMap<String, Rc<Steps>>,
    notifier: Box<dyn ChangeNotifier>,
    prompter: Box<dyn Prompter>,
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

impl Context {
    /// Create a new context with default settings
    pub fn new() -> Self {
        let working_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Context {
            project_dir: working_dir.clone(),
            template_dir: working_dir,
            values: Values::new(),
            set_vars: Values::new(),
            path_env_var: env::var("PATH").unwrap_or_default(),
            interpreter: vec!["sh".to_string(), "-c".to_string()],
            action_stack: Vec::new(),
            verbosity: Verbosity::Normal,
            actions: HashMap::new(),
            notifier: Box::new(NoopNotifier),
            prompter: Box::new(TerminalPrompter::stdio()),
        }
    }

    /// Set the project (output) directory
    pub fn with_project_dir(mut self, dir: PathBuf) -> Self {
        self.project_dir = dir;
        self
    }

    /// Set the template directory
    pub fn with_template_dir(mut self, dir: PathBuf) -> Self {
        self.template_dir = dir;
        self
    }

    /// Set variable values
    pub fn with_values(mut self, values: Values) -> Self {
        self.values = values;
        self
    }

    /// Record operator-supplied variables
    ///
    /// They are also written into the values, overriding anything there.
    pub fn with_set_vars(mut self, set_vars: Values) -> Self {
        for (name, value) in &set_vars {
            self.values.insert(name.clone(), value.clone());
        }
        self.set_vars = set_vars;
        self
    }

    /// Register the actions of a template and seed its default variables
    ///
    /// Defaults never override values that are already present.
    pub fn with_spec(mut self, spec: &TemplateSpec) -> ConfigResult<Self> {
        for (name, action) in &spec.actions {
            let steps = Steps::from_config(name, &action.steps)?;
            self.actions.insert(name.clone(), Rc::new(steps));
        }
        for (name, value) in &spec.vars {
            self.values
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
        Ok(self)
    }

    /// Set the PATH given to templates and shell steps
    pub fn with_path_env_var(mut self, path: String) -> Self {
        self.path_env_var = path;
        self
    }

    /// Set the interpreter
    pub fn with_interpreter(mut self, interpreter: Vec<String>) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Set verbosity level
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set the change notifier
    pub fn with_notifier(mut self, notifier: impl ChangeNotifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Set the interactive input collaborator
    pub fn with_prompter(mut self, prompter: impl Prompter + 'static) -> Self {
        self.prompter = Box::new(prompter);
        self
    }

    /// Set a single variable without notifying
    pub fn set_var(&mut self, key: String, value: Value) {
        self.values.insert(key, value);
    }

    /// Get a variable value
    pub fn get_var(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Whether the operator supplied this variable explicitly
    pub fn is_set_explicitly(&self, key: &str) -> bool {
        self.set_vars.contains_key(key)
    }

    /// Notify the change notifier that values changed
    pub fn on_values_changed(&mut self) -> ExecutionResult<()> {
        self.notifier.on_values_changed(&self.values)?;
        Ok(())
    }

    /// Ask the operator for free text
    pub fn input(&mut self, message: &str, default: &str) -> Result<String, InputError> {
        self.prompter.input(message, default)
    }

    /// Ask the operator a yes/no question
    pub fn confirm(&mut self, message: &str, default: bool) -> Result<bool, InputError> {
        self.prompter.confirm(message, default)
    }

    /// Look up a registered action
    pub fn action(&self, name: &str) -> Option<Rc<Steps>> {
        self.actions.get(name).cloned()
    }

    /// Names of all registered actions, sorted
    pub fn action_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.actions.keys().cloned().collect();
        names.sort();
        names
    }

    /// Push an action onto the execution stack
    pub fn push_action(&mut self, action_name: String) {
        self.action_stack.push(action_name);
    }

    /// Pop an action from the execution stack
    pub fn pop_action(&mut self) -> Option<String> {
        self.action_stack.pop()
    }

    /// Check if an action is in the execution stack (detect recursion)
    pub fn is_action_in_stack(&self, action_name: &str) -> bool {
        self.action_stack.iter().any(|a| a == action_name)
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{} {}", "[INFO]".cyan(), message);
        }
    }

    /// Print debug message (only in verbose mode)
    pub fn print_debug(&self, message: &str) {
        if self.verbosity >= Verbosity::Verbose {
            eprintln!("{} {}", "[DEBUG]".dimmed(), message);
        }
    }

    /// Print the command a shell step is about to run
    pub fn print_command(&self, command: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{} {}", "[RUN]".green(), command);
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
