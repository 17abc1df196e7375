//! Change notification
//!
//! Steps that write variables call back into a [`ChangeNotifier`] right after
//! the write, before the next step runs.

use crate::config::{save_project_state, ProjectState, Values};
use crate::error::NotificationError;
use std::path::PathBuf;

/// Observer invoked after every change to the context's values
pub trait ChangeNotifier {
    fn on_values_changed(&mut self, values: &Values) -> Result<(), NotificationError>;
}

/// Notifier that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn on_values_changed(&mut self, _values: &Values) -> Result<(), NotificationError> {
        Ok(())
    }
}

impl<F> ChangeNotifier for F
where
    F: FnMut(&Values) -> Result<(), NotificationError>,
{
    fn on_values_changed(&mut self, values: &Values) -> Result<(), NotificationError> {
        self(values)
    }
}

/// Persists the values into the project's `.scaff.yml` on every change
#[derive(Debug, Clone)]
pub struct ProjectStateWriter {
    project_dir: PathBuf,
    template: String,
}

impl ProjectStateWriter {
    pub fn new(project_dir: PathBuf, template: impl Into<String>) -> Self {
        ProjectStateWriter {
            project_dir,
            template: template.into(),
        }
    }
}

impl ChangeNotifier for ProjectStateWriter {
    fn on_values_changed(&mut self, values: &Values) -> Result<(), NotificationError> {
        let state = ProjectState {
            template: self.template.clone(),
            vars: values.clone(),
        };
        save_project_state(&self.project_dir, &state).map_err(|e| NotificationError::Persist {
            path: self.project_dir.join(crate::config::PROJECT_FILE_NAME),
            error: e.to_string(),
        })
    }
}
