//! CLI command implementations.
//!
//! Commands write to the supplied writer so they can be tested without a
//! terminal.

pub mod describe;
pub mod list;
pub mod run;

use crate::extensions;
use rasa::events::LoggingEventSink;
use rasa::generation::TextGenerator;
use rasa::persona::Persona;
use rasa::registry::{ExtensionRegistry, StageRegistry, StageResolver};
use rasa::stages::StagePorts;
use std::sync::Arc;

/// Builds a resolver with the built-in stages and `persona`'s own extension
/// package on the search path.
pub fn build_resolver(
    persona: &Persona,
    generator: Option<Arc<dyn TextGenerator>>,
) -> StageResolver {
    let mut extensions = ExtensionRegistry::new();
    if let Some(package) = extensions::package_for(persona.name()) {
        extensions.push_package(package);
    }

    let mut ports = StagePorts::new().with_events(Arc::new(LoggingEventSink::debug()));
    if let Some(generator) = generator {
        ports = ports.with_text_generator(generator);
    }

    StageResolver::new(
        Arc::new(StageRegistry::builtins()),
        Arc::new(extensions),
        ports,
    )
}
