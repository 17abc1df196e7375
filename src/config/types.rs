//! Core configuration types
//!
//! This module defines the data structures that represent a template's
//! `spec.yaml` file and the persisted `.scaff.yml` project state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Variable mapping shared by template defaults, project state and the
/// execution context
pub type Values = BTreeMap<String, serde_yaml::Value>;

/// Top-level contents of a template's `spec.yaml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TemplateSpec {
    /// Descriptive metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// Default variable values seeded into the context
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: Values,

    /// Named actions, each an ordered list of steps
    #[serde(default)]
    pub actions: BTreeMap<String, Action>,
}

/// Template metadata
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// An action body: either a single step or a list of steps
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Action {
    #[serde(deserialize_with = "deserialize_steps")]
    pub steps: Vec<StepConfig>,
}

/// A single step as written in YAML
///
/// Exactly one of the step keys must be present; `then` is only valid
/// alongside `if`. Which kind of step it is gets decided when the runtime
/// step is built.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    /// Condition expression
    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub if_: Option<String>,

    /// Steps executed when the condition holds
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_steps"
    )]
    pub then: Vec<StepConfig>,

    /// Free-text prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<InputConfig>,

    /// Yes/no prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<OptionConfig>,

    /// Variable assignments (name -> template)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<BTreeMap<String, String>>,

    /// Name of another action to run
    #[serde(rename = "do", default, skip_serializing_if = "Option::is_none")]
    pub do_: Option<String>,

    /// Shell command template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<String>,

    /// Template sub-directory to render into the project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render: Option<String>,
}

impl StepConfig {
    /// Names of the step keys present in this mapping
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds = Vec::new();
        if self.if_.is_some() {
            kinds.push("if");
        }
        if self.input.is_some() {
            kinds.push("input");
        }
        if self.option.is_some() {
            kinds.push("option");
        }
        if self.set.is_some() {
            kinds.push("set");
        }
        if self.do_.is_some() {
            kinds.push("do");
        }
        if self.exec.is_some() {
            kinds.push("exec");
        }
        if self.render.is_some() {
            kinds.push("render");
        }
        kinds
    }
}

/// Free-text prompt definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// Message shown to the operator (template)
    pub question: String,

    /// Variable receiving the answer
    pub var: String,

    /// Default answer (template)
    #[serde(default)]
    pub default: String,
}

/// Yes/no prompt definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OptionConfig {
    /// Message shown to the operator (template)
    pub question: String,

    /// Variable receiving the answer
    pub var: String,

    /// Default answer
    #[serde(default)]
    pub default: bool,
}

/// State persisted in a generated project
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ProjectState {
    /// Template the project was generated from
    pub template: String,

    /// Variable values at the time of the last change
    #[serde(default)]
    pub vars: Values,
}

/// Custom deserializer for steps that handles both single values and arrays
fn deserialize_steps<'de, D>(deserializer: D) -> Result<Vec<StepConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let value = Value::deserialize(deserializer)?;

    match value {
        // Single step
        Value::Mapping(_) => {
            let step = StepConfig::deserialize(value).map_err(D::Error::custom)?;
            Ok(vec![step])
        }
        // Array of steps
        Value::Sequence(seq) => {
            let mut steps = Vec::new();
            for item in seq {
                let step = StepConfig::deserialize(item).map_err(D::Error::custom)?;
                steps.push(step);
            }
            Ok(steps)
        }
        // Null or not present
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("steps must be a mapping or an array")),
    }
}
