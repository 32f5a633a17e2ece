//! Error types for the RASA pipeline engine.
//!
//! Resolution errors (`UnknownStageError`, `StageContractViolationError`)
//! are fatal configuration errors raised while a `Runner` is compiled.
//! Stage errors abort a run. `ExtensionStageFailure` is the only error the
//! engine recovers from: the heuristic dispatcher logs it and moves on.

use crate::stages::StageKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The caller-facing error type.
///
/// Presentation layers translate this into messages or status codes.
#[derive(Debug, Error)]
pub enum RasaError {
    /// A persona descriptor could not be loaded or is invalid.
    #[error("{0}")]
    Persona(#[from] PersonaError),

    /// A declared stage could not be resolved.
    #[error("{0}")]
    Resolve(#[from] ResolveError),

    /// A stage failed while the pipeline was running.
    #[error("{0}")]
    Stage(#[from] StageError),

    /// Settings could not be read from the environment.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl RasaError {
    /// Returns true when the error comes from configuration rather than
    /// from a stage at run time.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Persona(_) | Self::Resolve(_) | Self::Config(_))
    }
}

/// Which namespace a resolution request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveKind {
    /// Built-in frame namespace.
    Frame,
    /// Persona extensions first, then the built-in operator namespace.
    Operator,
    /// The extension search path only.
    Extension,
}

impl ResolveKind {
    /// The stage kind an instance must report to satisfy this request.
    #[must_use]
    pub const fn required_stage_kind(self) -> StageKind {
        match self {
            Self::Frame => StageKind::Frame,
            Self::Operator | Self::Extension => StageKind::Operator,
        }
    }
}

impl fmt::Display for ResolveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame => write!(f, "frame"),
            Self::Operator => write!(f, "operator"),
            Self::Extension => write!(f, "extension"),
        }
    }
}

/// Errors raised while resolving stage names into instances.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// No registry has a matching name.
    #[error("{0}")]
    Unknown(#[from] UnknownStageError),

    /// The resolved stage does not have the declared shape.
    #[error("{0}")]
    ContractViolation(#[from] StageContractViolationError),
}

impl ResolveError {
    /// The stage name the error refers to.
    #[must_use]
    pub fn stage_name(&self) -> &str {
        match self {
            Self::Unknown(err) => &err.name,
            Self::ContractViolation(err) => &err.name,
        }
    }
}

/// A declared stage name has no resolvable implementation.
#[derive(Debug, Clone, Error)]
#[error("Unknown {kind} stage '{name}' (symbol {symbol}) is not registered")]
pub struct UnknownStageError {
    /// The stage name as declared.
    pub name: String,
    /// The namespace that was searched.
    pub kind: ResolveKind,
    /// The symbol derived from the name.
    pub symbol: String,
}

impl UnknownStageError {
    /// Creates a new unknown stage error.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ResolveKind) -> Self {
        let name = name.into();
        let symbol = crate::registry::symbol_name(&name);
        Self { name, kind, symbol }
    }
}

/// A resolved stage does not satisfy the capability for its declared kind.
#[derive(Debug, Clone, Error)]
#[error("Stage '{name}' ({symbol}) was requested as {requested} but implements a {actual} stage")]
pub struct StageContractViolationError {
    /// The stage name as declared.
    pub name: String,
    /// The symbol derived from the name.
    pub symbol: String,
    /// The kind of the resolution request.
    pub requested: ResolveKind,
    /// The kind the instance reported.
    pub actual: StageKind,
}

impl StageContractViolationError {
    /// Creates a new contract violation error.
    #[must_use]
    pub fn new(name: impl Into<String>, requested: ResolveKind, actual: StageKind) -> Self {
        let name = name.into();
        let symbol = crate::registry::symbol_name(&name);
        Self {
            name,
            symbol,
            requested,
            actual,
        }
    }
}

/// Errors returned by a stage's `run`.
#[derive(Debug, Error)]
pub enum StageError {
    /// An external capability (text generation) failed.
    #[error("{0}")]
    External(#[from] ExternalCapabilityError),

    /// The incoming state does not have the shape the stage needs.
    #[error("Invalid state for stage '{stage}': {message}")]
    InvalidState {
        /// The stage name.
        stage: String,
        /// What was wrong.
        message: String,
    },

    /// Any other stage failure.
    #[error("Stage '{stage}' failed: {message}")]
    Execution {
        /// The stage name.
        stage: String,
        /// The failure message.
        message: String,
    },
}

impl StageError {
    /// Creates an invalid state error.
    #[must_use]
    pub fn invalid_state(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidState {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Creates an execution error.
    #[must_use]
    pub fn execution(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

/// An extension stage invoked by the dispatcher failed.
///
/// Never fatal: the dispatcher logs it and skips the extension.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("Extension stage '{name}' skipped: {reason}")]
pub struct ExtensionStageFailure {
    /// The extension stage name.
    pub name: String,
    /// Why it was skipped.
    pub reason: String,
    /// Whether the failure happened during resolution (vs. while running).
    pub during_resolution: bool,
}

impl ExtensionStageFailure {
    /// The extension could not be resolved.
    #[must_use]
    pub fn unresolved(name: impl Into<String>, err: &ResolveError) -> Self {
        Self {
            name: name.into(),
            reason: err.to_string(),
            during_resolution: true,
        }
    }

    /// The extension was resolved but its run failed.
    #[must_use]
    pub fn failed(name: impl Into<String>, err: &StageError) -> Self {
        Self {
            name: name.into(),
            reason: err.to_string(),
            during_resolution: false,
        }
    }
}

/// Failures of the external text-generation capability.
#[derive(Debug, Clone, Error)]
pub enum ExternalCapabilityError {
    /// The configured provider is not supported.
    #[error("Unsupported LLM provider: {0}")]
    UnsupportedProvider(String),

    /// A required credential is missing.
    #[error("Missing API key for provider '{0}'")]
    MissingApiKey(String),

    /// The request could not be sent or timed out.
    #[error("Request to {provider} failed: {message}")]
    Request {
        /// The provider name.
        provider: String,
        /// The failure message.
        message: String,
    },

    /// The provider answered with something unusable.
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse {
        /// The provider name.
        provider: String,
        /// The failure message.
        message: String,
    },

    /// Generic failure, used by in-process generators.
    #[error("Text generation failed: {0}")]
    Generation(String),
}

/// Errors raised while loading or validating a persona descriptor.
#[derive(Debug, Error)]
pub enum PersonaError {
    /// The persona file or catalog entry does not exist.
    #[error("Persona not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The descriptor could not be parsed.
    #[error("Failed to parse persona: {0}")]
    Parse(String),

    /// The descriptor parsed but violates an invariant.
    #[error("Invalid persona '{persona}': {message}")]
    Invalid {
        /// The persona name (may be empty).
        persona: String,
        /// What was wrong.
        message: String,
    },

    /// IO error while reading the descriptor.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PersonaError {
    /// Creates an invalid persona error.
    #[must_use]
    pub fn invalid(persona: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            persona: persona.into(),
            message: message.into(),
        }
    }
}

impl From<serde_yaml::Error> for PersonaError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for PersonaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Errors raised while reading settings.
#[derive(Debug, Clone, Error)]
#[error("Invalid value for {key}: '{value}' ({message})")]
pub struct ConfigError {
    /// The environment key.
    pub key: String,
    /// The offending value.
    pub value: String,
    /// Why it was rejected.
    pub message: String,
}

impl ConfigError {
    /// Creates a new config error.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            message: message.into(),
        }
    }
}
