//! Main CLI application

use crate::config::{
    home_dir, list_templates, load_project_state, load_template, path_env_var, template_dir,
    validate_spec, Values,
};
use crate::error::{ConfigError, ConfigResult};
use crate::runner::{run_action, Context, DefaultsPrompter, ProjectStateWriter, Verbosity};
use anyhow::Context as _;
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde_yaml::Value;
use std::env;
use std::path::{Path, PathBuf};

/// Build the clap command
pub fn build_command() -> Command {
    Command::new("scaff")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A step-driven project scaffolder")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print command output and errors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("do")
                .about("Run a template action in a project")
                .arg(
                    Arg::new("action")
                        .value_name("ACTION")
                        .help("Action to run (e.g. create)")
                        .required(true),
                )
                .arg(
                    Arg::new("template")
                        .short('t')
                        .long("template")
                        .value_name("TEMPLATE")
                        .help("Template to use (defaults to the project's template)"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("DIR")
                        .help("Project directory (defaults to the current directory)"),
                )
                .arg(
                    Arg::new("set")
                        .long("set")
                        .value_name("NAME=VALUE")
                        .help("Set a variable and skip its prompt")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("yes")
                        .short('y')
                        .long("yes")
                        .help("Accept all defaults without prompting")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("list")
                .visible_alias("ls")
                .about("List templates, or the actions of a template")
                .arg(
                    Arg::new("template")
                        .value_name("TEMPLATE")
                        .help("Template whose actions to list"),
                ),
        )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Parse a `NAME=VALUE` assignment
///
/// `true` and `false` become booleans; anything else stays a string.
pub fn parse_assignment(assignment: &str) -> ConfigResult<(String, Value)> {
    let (name, value) = assignment
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidAssignment(assignment.to_string()))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(ConfigError::InvalidAssignment(assignment.to_string()));
    }

    let value = match value {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        other => Value::String(other.to_string()),
    };
    Ok((name.to_string(), value))
}

/// Parse all `--set` assignments
fn parse_set_vars(matches: &ArgMatches) -> ConfigResult<Values> {
    let mut set_vars = Values::new();
    if let Some(assignments) = matches.get_many::<String>("set") {
        for assignment in assignments {
            let (name, value) = parse_assignment(assignment)?;
            set_vars.insert(name, value);
        }
    }
    Ok(set_vars)
}

/// Load `<project>/.env` into the process environment, if present
fn load_env_file(project_dir: &Path) -> anyhow::Result<()> {
    let env_file = project_dir.join(".env");
    if env_file.is_file() {
        dotenvy::from_path(&env_file)
            .with_context(|| format!("loading {}", env_file.display()))?;
    }
    Ok(())
}

/// Run an action of a template against a project directory
fn run_do(matches: &ArgMatches, verbosity: Verbosity) -> anyhow::Result<()> {
    let action = matches
        .get_one::<String>("action")
        .cloned()
        .unwrap_or_default();
    let project_dir = match matches.get_one::<String>("output") {
        Some(dir) => PathBuf::from(dir),
        None => env::current_dir().context("detecting current directory")?,
    };

    load_env_file(&project_dir)?;

    let state = load_project_state(&project_dir)?;
    let template = match (matches.get_one::<String>("template"), &state) {
        (Some(template), _) => template.clone(),
        (None, Some(state)) => state.template.clone(),
        (None, None) => {
            return Err(ConfigError::Invalid(format!(
                "no template given and no project state in {}",
                project_dir.display()
            ))
            .into())
        }
    };

    let home = home_dir()?;
    let template_path = template_dir(&home, &template)?;
    let spec = load_template(&template_path)
        .with_context(|| format!("loading template '{}'", template))?;
    validate_spec(&spec).with_context(|| format!("validating template '{}'", template))?;

    let values = state.map(|s| s.vars).unwrap_or_default();
    let set_vars = parse_set_vars(matches)?;

    let mut ctx = Context::new()
        .with_project_dir(project_dir.clone())
        .with_template_dir(template_path)
        .with_values(values)
        .with_spec(&spec)?
        .with_set_vars(set_vars)
        .with_path_env_var(path_env_var(&home, env::var_os("PATH")))
        .with_verbosity(verbosity)
        .with_notifier(ProjectStateWriter::new(project_dir, template.clone()));
    if matches.get_flag("yes") {
        ctx = ctx.with_prompter(DefaultsPrompter);
    }

    if ctx.action(&action).is_none() {
        return Err(ConfigError::ActionNotFound(action).into());
    }

    // Record the template and seeded values even if no step changes them
    ctx.on_values_changed()?;

    ctx.print_info(&format!("Running action '{}' of template '{}'", action, template));
    run_action(&mut ctx, &action)?;
    ctx.print_debug(&format!("Action completed: {}", action));

    Ok(())
}

/// List templates, or the actions of one template
fn run_list(matches: &ArgMatches) -> anyhow::Result<()> {
    let home = home_dir()?;

    match matches.get_one::<String>("template") {
        None => {
            for name in list_templates(&home)? {
                println!("{}", name);
            }
        }
        Some(template) => {
            let spec = load_template(&template_dir(&home, template)?)
                .with_context(|| format!("loading template '{}'", template))?;
            if let Some(description) = &spec.metadata.description {
                println!("{}", description);
            }
            for name in spec.actions.keys() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

/// Run the CLI application with provided arguments
pub fn run() -> anyhow::Result<()> {
    run_from(env::args_os())
}

/// Run the CLI application with explicit arguments
pub fn run_from<I, T>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = build_command().get_matches_from(args);

    // Global flags given before the subcommand are propagated down to it
    match matches.subcommand() {
        Some(("do", sub_matches)) => run_do(sub_matches, get_verbosity(sub_matches)),
        Some(("list", sub_matches)) => run_list(sub_matches),
        _ => Ok(()),
    }
}
