//! The shared state threaded through every stage of a run.
//!
//! `State` is an ordered JSON object. Stages receive it by value and hand
//! back the next value, so a stage owns the state exclusively while it runs
//! and nothing can hold on to an earlier version.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved state keys and well-known nested keys.
pub mod keys {
    /// Raw user input, required at entry.
    pub const USER_INPUT: &str = "user_input";
    /// Domain-specific user preferences.
    pub const PREFERENCES: &str = "preferences";
    /// Scratch space populated by stages.
    pub const CONTEXT: &str = "context";
    /// Call-scoped annotations.
    pub const METADATA: &str = "metadata";
    /// The rendered response.
    pub const OUTPUT: &str = "output";
    /// Optional structured response.
    pub const OUTPUT_JSON: &str = "output_json";

    /// `metadata.tone`
    pub const TONE: &str = "tone";
    /// `metadata.extension_stage_names`
    pub const EXTENSION_STAGE_NAMES: &str = "extension_stage_names";
    /// `metadata.intent` / `context.intent`
    pub const INTENT: &str = "intent";
}

/// Tone used when neither the caller nor the persona sets one.
pub const DEFAULT_TONE: &str = "default";

/// An ordered mapping from string keys to JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State {
    fields: Map<String, Value>,
}

impl State {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing JSON object.
    #[must_use]
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Builds the initial state the way a presentation layer does.
    #[must_use]
    pub fn for_request(
        user_input: impl Into<String>,
        preferences: Map<String, Value>,
        metadata: Map<String, Value>,
    ) -> Self {
        let mut fields = Map::new();
        fields.insert(keys::USER_INPUT.to_string(), Value::String(user_input.into()));
        fields.insert(keys::PREFERENCES.to_string(), Value::Object(preferences));
        fields.insert(keys::METADATA.to_string(), Value::Object(metadata));
        Self { fields }
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Sets a top-level field, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(key.into(), value)
    }

    /// Builder-style variant of [`State::set`].
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.set(key, value);
        self
    }

    /// Removes a top-level field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Returns the nested object stored under `section`, if it is one.
    #[must_use]
    pub fn section(&self, section: &str) -> Option<&Map<String, Value>> {
        self.fields.get(section).and_then(Value::as_object)
    }

    /// Returns a mutable handle to the nested object under `section`.
    ///
    /// A missing section is created empty. Returns `None` when the key holds
    /// something other than an object; it is never replaced.
    pub fn section_mut(&mut self, section: &str) -> Option<&mut Map<String, Value>> {
        self.fields
            .entry(section.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
    }

    /// `user_input`, if it is a string.
    #[must_use]
    pub fn user_input(&self) -> Option<&str> {
        self.fields.get(keys::USER_INPUT).and_then(Value::as_str)
    }

    /// `preferences`, if present.
    #[must_use]
    pub fn preferences(&self) -> Option<&Map<String, Value>> {
        self.section(keys::PREFERENCES)
    }

    /// `context`, if present.
    #[must_use]
    pub fn context(&self) -> Option<&Map<String, Value>> {
        self.section(keys::CONTEXT)
    }

    /// `metadata`, if present.
    #[must_use]
    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.section(keys::METADATA)
    }

    /// `output`, if it is a string.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        self.fields.get(keys::OUTPUT).and_then(Value::as_str)
    }

    /// Sets `output`.
    pub fn set_output(&mut self, output: impl Into<String>) {
        self.fields
            .insert(keys::OUTPUT.to_string(), Value::String(output.into()));
    }

    /// `output_json`, if present.
    #[must_use]
    pub fn output_json(&self) -> Option<&Value> {
        self.fields.get(keys::OUTPUT_JSON)
    }

    /// Sets `output_json`.
    pub fn set_output_json(&mut self, payload: Value) {
        self.fields.insert(keys::OUTPUT_JSON.to_string(), payload);
    }

    /// A string entry of `metadata`.
    #[must_use]
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata()
            .and_then(|metadata| metadata.get(key))
            .and_then(Value::as_str)
    }

    /// `metadata.tone`, falling back to [`DEFAULT_TONE`].
    #[must_use]
    pub fn tone(&self) -> &str {
        self.metadata_str(keys::TONE).unwrap_or(DEFAULT_TONE)
    }

    /// `metadata.extension_stage_names` in order; non-string entries are
    /// dropped and a missing list reads as empty.
    #[must_use]
    pub fn extension_stage_names(&self) -> Vec<String> {
        self.metadata()
            .and_then(|metadata| metadata.get(keys::EXTENSION_STAGE_NAMES))
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Top-level keys whose value differs between `self` and `other`,
    /// including keys added or removed. Keys of `self` come first, in order.
    #[must_use]
    pub fn changed_keys(&self, other: &Self) -> Vec<String> {
        let mut changed: Vec<String> = self
            .fields
            .iter()
            .filter(|(key, value)| other.fields.get(*key) != Some(*value))
            .map(|(key, _)| key.clone())
            .collect();

        changed.extend(
            other
                .fields
                .keys()
                .filter(|key| !self.fields.contains_key(*key))
                .cloned(),
        );
        changed
    }

    /// Iterates over the top-level keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    /// Number of top-level fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Borrows the underlying object.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Unwraps the underlying object.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for State {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_map(fields)
    }
}

/// What a presentation layer reads back from a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResponse {
    /// Plain output text (empty when no stage produced any).
    pub output: String,
    /// Structured output, if a stage produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_json: Option<Value>,
    /// State metadata after the run.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl RunResponse {
    /// Extracts the response fields from a final state.
    #[must_use]
    pub fn from_state(state: &State) -> Self {
        Self {
            output: state.output().unwrap_or_default().to_string(),
            output_json: state.output_json().cloned(),
            metadata: state.metadata().cloned().unwrap_or_default(),
        }
    }
}
