//! Testing utilities for RASA pipelines.
//!
//! This module provides:
//! - Stub, failing and recording stages
//! - A canned-response text generator
//! - State preservation assertions

mod assertions;
mod mocks;

pub use assertions::{assert_changed_keys, assert_output, assert_preserves_untouched};
pub use mocks::{
    ExecutionLog, FailingStage, MockTextGenerator, RecordingStage, SetOutputStage,
};
