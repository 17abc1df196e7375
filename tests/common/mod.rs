//! Common test utilities

#![allow(dead_code)]

use scaff::config::Values;
use scaff::error::{InputError, NotificationError};
use scaff::runner::{Context, Prompter};
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

/// Create a templates home holding one template with the given spec
pub fn create_test_home(template: &str, spec: &str) -> (TempDir, PathBuf) {
    let home = TempDir::new().unwrap();
    let template_dir = home.path().join("templates").join(template);
    fs::create_dir_all(&template_dir).unwrap();
    fs::write(template_dir.join("spec.yaml"), spec).unwrap();
    (home, template_dir)
}

/// Write a file below a directory, creating parents
pub fn write_file(dir: &std::path::Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Prompter answering from a fixed script
pub struct ScriptedPrompter {
    answers: Vec<String>,
    pub asked: Rc<RefCell<Vec<String>>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        ScriptedPrompter {
            answers: answers.iter().map(|s| s.to_string()).collect(),
            asked: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn next(&mut self, message: &str) -> Result<String, InputError> {
        self.asked.borrow_mut().push(message.to_string());
        if self.answers.is_empty() {
            return Err(InputError::Aborted);
        }
        Ok(self.answers.remove(0))
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&mut self, message: &str, default: &str) -> Result<String, InputError> {
        let answer = self.next(message)?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, InputError> {
        let answer = self.next(message)?;
        Ok(match answer.as_str() {
            "" => default,
            other => other == "y",
        })
    }
}

/// Context wired to a scripted prompter and a notifier counting its calls
pub fn scripted_context(answers: &[&str]) -> (Context, Rc<RefCell<Vec<String>>>, Rc<RefCell<usize>>) {
    let prompter = ScriptedPrompter::new(answers);
    let asked = prompter.asked.clone();
    let notified = Rc::new(RefCell::new(0usize));
    let counter = notified.clone();

    let ctx = Context::new()
        .with_prompter(prompter)
        .with_notifier(move |_: &Values| -> Result<(), NotificationError> {
            *counter.borrow_mut() += 1;
            Ok(())
        });
    (ctx, asked, notified)
}
