//! Template spec and project state parsing

use crate::config::types::{ProjectState, TemplateSpec};
use crate::error::{ConfigError, ConfigResult, ScaffError};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of a template's metadata file
pub const SPEC_FILE_NAME: &str = "spec.yaml";

/// File name of the state persisted in generated projects
pub const PROJECT_FILE_NAME: &str = ".scaff.yml";

/// Locate the spec file of a template directory
pub fn find_spec_file(template_dir: &Path) -> ConfigResult<PathBuf> {
    let spec_path = template_dir.join(SPEC_FILE_NAME);
    if spec_path.is_file() {
        Ok(spec_path)
    } else {
        Err(ConfigError::NotFound(spec_path.display().to_string()))
    }
}

/// Parse a template spec file from a path
pub fn parse_spec_file(path: &Path) -> Result<TemplateSpec, ScaffError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    parse_spec(&contents)
}

/// Parse a template spec from a string
pub fn parse_spec(yaml: &str) -> Result<TemplateSpec, ScaffError> {
    let spec: TemplateSpec = serde_yaml::from_str(yaml)?;
    Ok(spec)
}

/// Load the spec of a template directory
pub fn load_template(template_dir: &Path) -> Result<TemplateSpec, ScaffError> {
    let spec_path = find_spec_file(template_dir)?;
    parse_spec_file(&spec_path)
}

/// Load the project state from a project directory, if one was saved
pub fn load_project_state(project_dir: &Path) -> Result<Option<ProjectState>, ScaffError> {
    let path = project_dir.join(PROJECT_FILE_NAME);
    if !path.is_file() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&path).map_err(|e| ConfigError::ReadFile {
        path: path.clone(),
        error: e.to_string(),
    })?;
    let state: ProjectState = serde_yaml::from_str(&contents)?;
    Ok(Some(state))
}

/// Write the project state into a project directory
pub fn save_project_state(project_dir: &Path, state: &ProjectState) -> Result<(), ScaffError> {
    fs::create_dir_all(project_dir)?;
    let yaml = serde_yaml::to_string(state)?;
    fs::write(project_dir.join(PROJECT_FILE_NAME), yaml)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_simple_spec() {
        let yaml = r#"
actions:
  create:
    exec: echo "hello"
"#;
        let spec = parse_spec(yaml).unwrap();
        assert!(spec.actions.contains_key("create"));
    }

    #[test]
    fn test_find_spec_in_template_dir() {
        let temp_dir = TempDir::new().unwrap();
        let spec_path = temp_dir.path().join(SPEC_FILE_NAME);
        fs::write(&spec_path, "actions: {}\n").unwrap();

        let found = find_spec_file(temp_dir.path()).unwrap();
        assert_eq!(found, spec_path);
    }

    #[test]
    fn test_spec_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let result = find_spec_file(temp_dir.path());
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_project_state_missing_is_none() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_project_state(temp_dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_project_state_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = ProjectState {
            template: "svc".to_string(),
            ..Default::default()
        };
        state
            .vars
            .insert("name".to_string(), serde_yaml::Value::from("api"));

        save_project_state(temp_dir.path(), &state).unwrap();
        let loaded = load_project_state(temp_dir.path()).unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let result = parse_spec("actions: [unclosed");
        assert!(matches!(result, Err(ScaffError::Yaml(_))));
    }
}
