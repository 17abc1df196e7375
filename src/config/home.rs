//! Templates home discovery
//!
//! The home directory holds a `templates/` directory (one sub-directory per
//! template) and an optional `bin/` directory of helper scripts that steps
//! can call by name.

use crate::error::{ConfigError, ConfigResult};
use directories::BaseDirs;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the templates home
pub const HOME_ENV_VAR: &str = "SCAFF_HOME";

/// Directory name of the default home, under the user's home
pub const DEFAULT_HOME_DIR: &str = ".scaff";

/// Sub-directory of the home containing templates
pub const TEMPLATES_DIR_NAME: &str = "templates";

/// Sub-directory of the home containing helper scripts
pub const BIN_DIR_NAME: &str = "bin";

/// Resolve the templates home from `SCAFF_HOME`, defaulting to `~/.scaff`
pub fn home_dir() -> ConfigResult<PathBuf> {
    match env::var_os(HOME_ENV_VAR) {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(DEFAULT_HOME_DIR))
            .ok_or_else(|| ConfigError::NotFound("user home directory".to_string())),
    }
}

/// Directory where all templates live
pub fn templates_dir(home: &Path) -> PathBuf {
    home.join(TEMPLATES_DIR_NAME)
}

/// Directory of a single template
pub fn template_dir(home: &Path, template: &str) -> ConfigResult<PathBuf> {
    let dir = templates_dir(home).join(template);
    if dir.is_dir() {
        Ok(dir)
    } else {
        Err(ConfigError::TemplateNotFound(template.to_string()))
    }
}

/// List template names (directories containing a spec file), sorted
pub fn list_templates(home: &Path) -> ConfigResult<Vec<String>> {
    let dir = templates_dir(home);
    let entries = fs::read_dir(&dir).map_err(|e| ConfigError::ReadFile {
        path: dir.clone(),
        error: e.to_string(),
    })?;

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().join(crate::config::SPEC_FILE_NAME).is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();
    Ok(names)
}

/// Build the PATH value given to templates and shell steps
///
/// The home's `bin/` directory, when present, is prepended to `current`.
pub fn path_env_var(home: &Path, current: Option<OsString>) -> String {
    let mut paths: Vec<PathBuf> = Vec::new();
    let bin_dir = home.join(BIN_DIR_NAME);
    if bin_dir.is_dir() {
        paths.push(bin_dir);
    }
    if let Some(current) = current {
        paths.extend(env::split_paths(&current));
    }

    env::join_paths(paths)
        .map(|joined| joined.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_template_dir_missing() {
        let temp_dir = TempDir::new().unwrap();
        let result = template_dir(temp_dir.path(), "nope");
        assert!(matches!(result, Err(ConfigError::TemplateNotFound(_))));
    }

    #[test]
    fn test_list_templates_only_with_spec() {
        let temp_dir = TempDir::new().unwrap();
        let templates = templates_dir(temp_dir.path());
        fs::create_dir_all(templates.join("b-service")).unwrap();
        fs::create_dir_all(templates.join("a-lib")).unwrap();
        fs::create_dir_all(templates.join("junk")).unwrap();
        fs::write(templates.join("b-service/spec.yaml"), "actions: {}\n").unwrap();
        fs::write(templates.join("a-lib/spec.yaml"), "actions: {}\n").unwrap();

        let names = list_templates(temp_dir.path()).unwrap();
        assert_eq!(names, vec!["a-lib", "b-service"]);
    }

    #[test]
    fn test_path_env_var_prepends_bin() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join(BIN_DIR_NAME)).unwrap();

        let path = path_env_var(temp_dir.path(), Some(OsString::from("/usr/bin")));
        let parts: Vec<PathBuf> = env::split_paths(&path).collect();
        assert_eq!(parts[0], temp_dir.path().join(BIN_DIR_NAME));
        assert_eq!(parts[1], PathBuf::from("/usr/bin"));
    }

    #[test]
    fn test_path_env_var_without_bin() {
        let temp_dir = TempDir::new().unwrap();
        let path = path_env_var(temp_dir.path(), Some(OsString::from("/usr/bin")));
        assert_eq!(path, "/usr/bin");
    }
}
