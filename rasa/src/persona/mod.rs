//! Persona descriptors.
//!
//! A persona names an ordered list of frames, an ordered list of operators
//! and the extension stages its heuristic dispatcher may delegate to.
//! Personas are validated once when they are built and are immutable
//! afterwards.

mod catalog;

pub use catalog::{PersonaCatalog, PERSONA_FILE_NAME};

use crate::errors::PersonaError;
use crate::registry::is_valid_stage_name;
use crate::state::{keys, DEFAULT_TONE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

fn default_prompt_style() -> String {
    "default".to_string()
}

fn default_memory_scope() -> String {
    "user".to_string()
}

/// A persona descriptor as written in YAML or JSON, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Persona name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Frame stage names, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames: Option<Vec<String>>,
    /// Older spelling of `frames`; ignored when `frames` is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_stack: Option<Vec<String>>,
    /// Operator stage names, in order.
    #[serde(default)]
    pub operators: Vec<String>,
    /// Prompt style hint.
    #[serde(default = "default_prompt_style")]
    pub prompt_style: String,
    /// Memory scope hint.
    #[serde(default = "default_memory_scope")]
    pub memory_scope: String,
    /// Persona metadata (`tone`, ...).
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Extension stage names for the heuristic dispatcher.
    #[serde(default)]
    pub domain_operators: Vec<String>,
}

/// A validated, immutable persona.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Persona {
    name: String,
    description: String,
    frame_stage_names: Vec<String>,
    operator_stage_names: Vec<String>,
    prompt_style: String,
    memory_scope: String,
    metadata: Map<String, Value>,
    extension_stage_names: Vec<String>,
}

impl Persona {
    /// Validates `config` and builds a persona.
    ///
    /// # Errors
    ///
    /// Returns [`PersonaError::Invalid`] when the name is blank, there are
    /// no frames, a stage name breaks the naming convention, or a name
    /// appears twice across the frame and operator lists.
    pub fn build(config: PersonaConfig) -> Result<Self, PersonaError> {
        let PersonaConfig {
            name,
            description,
            frames,
            state_stack,
            operators,
            prompt_style,
            memory_scope,
            mut metadata,
            domain_operators,
        } = config;

        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(PersonaError::invalid("", "name must not be blank"));
        }

        let frames = frames.or(state_stack).unwrap_or_default();
        if frames.is_empty() {
            return Err(PersonaError::invalid(&name, "at least one frame is required"));
        }

        let mut seen = HashSet::new();
        for stage in frames.iter().chain(&operators) {
            if !is_valid_stage_name(stage) {
                return Err(PersonaError::invalid(
                    &name,
                    format!("stage name '{stage}' must be lower-case words joined by underscores"),
                ));
            }
            if !seen.insert(stage.as_str()) {
                return Err(PersonaError::invalid(
                    &name,
                    format!("stage '{stage}' is declared more than once"),
                ));
            }
        }

        let mut extensions = HashSet::new();
        for extension in &domain_operators {
            if !is_valid_stage_name(extension) {
                return Err(PersonaError::invalid(
                    &name,
                    format!("extension name '{extension}' must be lower-case words joined by underscores"),
                ));
            }
            if !extensions.insert(extension.as_str()) {
                return Err(PersonaError::invalid(
                    &name,
                    format!("extension '{extension}' is declared more than once"),
                ));
            }
        }

        metadata
            .entry(keys::TONE)
            .or_insert_with(|| Value::String(DEFAULT_TONE.to_string()));

        Ok(Self {
            name,
            description,
            frame_stage_names: frames,
            operator_stage_names: operators,
            prompt_style,
            memory_scope,
            metadata,
            extension_stage_names: domain_operators,
        })
    }

    /// Parses and validates a YAML descriptor.
    ///
    /// # Errors
    ///
    /// [`PersonaError::Parse`] for malformed YAML, otherwise as
    /// [`Persona::build`].
    pub fn from_yaml_str(yaml: &str) -> Result<Self, PersonaError> {
        let config: PersonaConfig = serde_yaml::from_str(yaml)?;
        Self::build(config)
    }

    /// Reads, parses and validates a YAML descriptor file.
    ///
    /// # Errors
    ///
    /// [`PersonaError::NotFound`] when the file does not exist, otherwise as
    /// [`Persona::from_yaml_str`].
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, PersonaError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PersonaError::NotFound(path.to_path_buf()));
        }
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Builds a persona from an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// [`PersonaError::Parse`] when the value does not have the descriptor
    /// shape, otherwise as [`Persona::build`].
    pub fn from_json_value(value: Value) -> Result<Self, PersonaError> {
        let config: PersonaConfig = serde_json::from_value(value)?;
        Self::build(config)
    }

    /// The persona name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Frame stage names, in execution order.
    #[must_use]
    pub fn frame_stage_names(&self) -> &[String] {
        &self.frame_stage_names
    }

    /// Operator stage names, in execution order.
    #[must_use]
    pub fn operator_stage_names(&self) -> &[String] {
        &self.operator_stage_names
    }

    /// The prompt style.
    #[must_use]
    pub fn prompt_style(&self) -> &str {
        &self.prompt_style
    }

    /// The memory scope.
    #[must_use]
    pub fn memory_scope(&self) -> &str {
        &self.memory_scope
    }

    /// Persona metadata; always contains `tone`.
    #[must_use]
    pub const fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// The persona's default tone.
    #[must_use]
    pub fn tone(&self) -> &str {
        self.metadata
            .get(keys::TONE)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TONE)
    }

    /// Extension stage names the dispatcher may delegate to, in order.
    #[must_use]
    pub fn extension_stage_names(&self) -> &[String] {
        &self.extension_stage_names
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<Persona {} | frames: {} ops: {}>",
            self.name,
            self.frame_stage_names.len(),
            self.operator_stage_names.len()
        )
    }
}
