//! Pipeline compilation and execution.
//!
//! A [`Runner`] resolves a persona's stages into a [`StageGraph`] once and
//! then executes it for each request.

mod graph;
mod integration_tests;
mod runner;

pub use graph::{StageGraph, StageNode};
pub use runner::Runner;
