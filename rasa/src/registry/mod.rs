//! Stage registration tables and the resolver.
//!
//! Stage names are mapped to factories in two places:
//!
//! - [`StageRegistry`]: the built-in stages, keyed by `(StageKind, name)`.
//! - [`ExtensionRegistry`]: caller-supplied extension stages, grouped into
//!   [`ExtensionPackage`]s and searched in push order.
//!
//! Both are built once at start-up and shared read-only behind `Arc`s by
//! the [`StageResolver`].

mod resolver;

pub use resolver::StageResolver;

use crate::stages::{
    CriticAgent, HeuristicAgent, MemoryFrame, PreferenceAgent, Stage, StageKind, StagePorts,
    StatelessFrame, ToneFormatter,
};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

static STAGE_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9]*(_[a-z0-9]+)*$").ok());

/// Returns true if `name` is a lower-case, underscore-separated identifier.
#[must_use]
pub fn is_valid_stage_name(name: &str) -> bool {
    STAGE_NAME
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(name))
}

/// Derives the implementation symbol from a stage name by capitalising each
/// underscore-separated word, e.g. `preference_agent` → `PreferenceAgent`.
#[must_use]
pub fn symbol_name(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect()
}

/// What a factory gets to build a stage instance.
pub struct StageInit<'a> {
    /// The name the stage is being resolved under.
    pub name: &'a str,
    /// The resolver doing the resolution, for stages that delegate.
    pub resolver: &'a StageResolver,
}

impl StageInit<'_> {
    /// The capabilities injected into the resolver.
    #[must_use]
    pub fn ports(&self) -> &StagePorts {
        self.resolver.ports()
    }
}

/// Builds a stage instance. Must be cheap and free of I/O.
pub type StageFactory = Arc<dyn Fn(&StageInit<'_>) -> Arc<dyn Stage> + Send + Sync>;

/// Built-in stages, in two namespaces.
#[derive(Default, Clone)]
pub struct StageRegistry {
    factories: HashMap<(StageKind, String), StageFactory>,
}

impl StageRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in frame and operator.
    #[must_use]
    pub fn builtins() -> Self {
        let mut registry = Self::new();

        registry.register(StageKind::Frame, "stateless_frame", |init| {
            let frame = StatelessFrame::new(init.name);
            match &init.ports().text_generator {
                Some(generator) => Arc::new(frame.with_generator(generator.clone())),
                None => Arc::new(frame),
            }
        });
        for (name, scope) in [
            ("session_frame", "session"),
            ("short_term_frame", "short_term"),
            ("long_term_frame", "long_term"),
            ("persona_frame", "persona"),
        ] {
            registry.register(StageKind::Frame, name, move |init| {
                Arc::new(MemoryFrame::new(init.name, scope))
            });
        }

        registry.register(StageKind::Operator, "preference_agent", |init| {
            Arc::new(PreferenceAgent::new(init.name))
        });
        registry.register(StageKind::Operator, "tone_formatter", |init| {
            Arc::new(ToneFormatter::new(init.name))
        });
        registry.register(StageKind::Operator, "heuristic_agent", |init| {
            Arc::new(HeuristicAgent::new(init.name, init.resolver.clone()))
        });
        registry.register(StageKind::Operator, "critic_agent", |init| {
            Arc::new(CriticAgent::new(init.name))
        });

        registry
    }

    /// Registers `factory` under `(kind, name)`, replacing any previous entry.
    pub fn register<F>(&mut self, kind: StageKind, name: impl Into<String>, factory: F)
    where
        F: Fn(&StageInit<'_>) -> Arc<dyn Stage> + Send + Sync + 'static,
    {
        self.factories.insert((kind, name.into()), Arc::new(factory));
    }

    /// Builder-style variant of [`StageRegistry::register`].
    #[must_use]
    pub fn with_stage<F>(mut self, kind: StageKind, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&StageInit<'_>) -> Arc<dyn Stage> + Send + Sync + 'static,
    {
        self.register(kind, name, factory);
        self
    }

    /// Looks up the factory for `(kind, name)`.
    #[must_use]
    pub fn get(&self, kind: StageKind, name: &str) -> Option<&StageFactory> {
        self.factories.get(&(kind, name.to_string()))
    }

    /// Returns true if `(kind, name)` is registered.
    #[must_use]
    pub fn contains(&self, kind: StageKind, name: &str) -> bool {
        self.get(kind, name).is_some()
    }

    /// Registered names of `kind`, sorted.
    #[must_use]
    pub fn names(&self, kind: StageKind) -> Vec<String> {
        let mut names: Vec<String> = self
            .factories
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Number of registered stages across both namespaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageRegistry")
            .field("frames", &self.names(StageKind::Frame))
            .field("operators", &self.names(StageKind::Operator))
            .finish()
    }
}

/// A named group of extension stages, usually one per persona application.
#[derive(Clone)]
pub struct ExtensionPackage {
    name: String,
    description: String,
    stages: HashMap<String, StageFactory>,
}

impl ExtensionPackage {
    /// Creates an empty package.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            stages: HashMap::new(),
        }
    }

    /// Sets the description shown by `describe`.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds an extension stage.
    #[must_use]
    pub fn with_stage<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&StageInit<'_>) -> Arc<dyn Stage> + Send + Sync + 'static,
    {
        self.stages.insert(name.into(), Arc::new(factory));
        self
    }

    /// The package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The package description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Looks up an extension stage factory.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StageFactory> {
        self.stages.get(name)
    }

    /// Stage names in this package, sorted.
    #[must_use]
    pub fn stage_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stages.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for ExtensionPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionPackage")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// The extension search path: packages searched in the order they were
/// pushed. The first package providing a name wins.
#[derive(Debug, Default, Clone)]
pub struct ExtensionRegistry {
    packages: Vec<ExtensionPackage>,
}

impl ExtensionRegistry {
    /// Creates an empty search path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a package to the search path.
    pub fn push_package(&mut self, package: ExtensionPackage) {
        self.packages.push(package);
    }

    /// Builder-style variant of [`ExtensionRegistry::push_package`].
    #[must_use]
    pub fn with_package(mut self, package: ExtensionPackage) -> Self {
        self.push_package(package);
        self
    }

    /// Packages in search order.
    #[must_use]
    pub fn packages(&self) -> &[ExtensionPackage] {
        &self.packages
    }

    /// The first package that provides `name`.
    #[must_use]
    pub fn package_for(&self, name: &str) -> Option<&ExtensionPackage> {
        self.packages.iter().find(|package| package.get(name).is_some())
    }

    /// The factory for `name` from the first package providing it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StageFactory> {
        self.packages.iter().find_map(|package| package.get(name))
    }

    /// Returns true if some package provides `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SetOutputStage;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_symbol_name() {
        assert_eq!(symbol_name("preference_agent"), "PreferenceAgent");
        assert_eq!(symbol_name("travel_heuristic_agent"), "TravelHeuristicAgent");
        assert_eq!(symbol_name("critic"), "Critic");
        assert_eq!(symbol_name("stage_2"), "Stage2");
    }

    #[test]
    fn test_stage_name_convention() {
        for valid in ["a", "tone_formatter", "stage_2", "x1_y2"] {
            assert!(is_valid_stage_name(valid), "{valid}");
        }
        for invalid in ["", "Tone", "tone-formatter", "_tone", "tone_", "tone__x", "2tone", "tone formatter"] {
            assert!(!is_valid_stage_name(invalid), "{invalid}");
        }
    }

    #[test]
    fn test_builtins() {
        let registry = StageRegistry::builtins();

        assert_eq!(
            registry.names(StageKind::Frame),
            vec!["long_term_frame", "persona_frame", "session_frame", "short_term_frame", "stateless_frame"]
        );
        assert_eq!(
            registry.names(StageKind::Operator),
            vec!["critic_agent", "heuristic_agent", "preference_agent", "tone_formatter"]
        );
        assert!(!registry.contains(StageKind::Operator, "stateless_frame"));
    }

    #[test]
    fn test_search_path_first_package_wins() {
        let extensions = ExtensionRegistry::new()
            .with_package(
                ExtensionPackage::new("first")
                    .with_stage("shared", |init| Arc::new(SetOutputStage::operator(init.name, "1"))),
            )
            .with_package(
                ExtensionPackage::new("second")
                    .with_stage("shared", |init| Arc::new(SetOutputStage::operator(init.name, "2")))
                    .with_stage("only_second", |init| Arc::new(SetOutputStage::operator(init.name, "2"))),
            );

        assert_eq!(extensions.package_for("shared").map(ExtensionPackage::name), Some("first"));
        assert_eq!(extensions.package_for("only_second").map(ExtensionPackage::name), Some("second"));
        assert!(!extensions.contains("missing"));
    }
}
