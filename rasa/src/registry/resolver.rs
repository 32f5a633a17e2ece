//! StageResolver - turns stage names into stage instances.

use super::{ExtensionRegistry, StageFactory, StageInit, StageRegistry};
use crate::errors::{ResolveError, ResolveKind, StageContractViolationError, UnknownStageError};
use crate::stages::{Stage, StageKind, StagePorts};
use std::sync::Arc;
use tracing::debug;

/// Resolves stage names against the built-in and extension registries.
///
/// Cloning is cheap: registries are shared behind `Arc`s.
#[derive(Clone)]
pub struct StageResolver {
    stages: Arc<StageRegistry>,
    extensions: Arc<ExtensionRegistry>,
    ports: StagePorts,
}

impl StageResolver {
    /// Creates a resolver over the given registries and ports.
    #[must_use]
    pub const fn new(
        stages: Arc<StageRegistry>,
        extensions: Arc<ExtensionRegistry>,
        ports: StagePorts,
    ) -> Self {
        Self {
            stages,
            extensions,
            ports,
        }
    }

    /// A resolver over the built-in stages only, with default ports.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(
            Arc::new(StageRegistry::builtins()),
            Arc::new(ExtensionRegistry::new()),
            StagePorts::default(),
        )
    }

    /// The injected capabilities.
    #[must_use]
    pub const fn ports(&self) -> &StagePorts {
        &self.ports
    }

    /// The built-in registry.
    #[must_use]
    pub fn stage_registry(&self) -> &StageRegistry {
        &self.stages
    }

    /// The extension search path.
    #[must_use]
    pub fn extension_registry(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    /// Resolves `name` for a request of `kind`.
    ///
    /// Operator requests prefer the extension search path when `name` is one
    /// of `declared_extensions`, then fall back to the built-in operators.
    ///
    /// # Errors
    ///
    /// [`ResolveError::Unknown`] when no registry provides the name, and
    /// [`ResolveError::ContractViolation`] when the instance's kind does not
    /// match the request.
    pub fn resolve(
        &self,
        kind: ResolveKind,
        name: &str,
        declared_extensions: &[String],
    ) -> Result<Arc<dyn Stage>, ResolveError> {
        let factory = self
            .lookup(kind, name, declared_extensions)
            .ok_or_else(|| UnknownStageError::new(name, kind))?;

        let stage = factory(&StageInit {
            name,
            resolver: self,
        });

        let required = kind.required_stage_kind();
        if stage.kind() != required {
            return Err(StageContractViolationError::new(name, kind, stage.kind()).into());
        }

        debug!(stage = name, %kind, "Resolved stage");
        Ok(stage)
    }

    /// Resolves a frame from the built-in frame namespace.
    ///
    /// # Errors
    ///
    /// See [`StageResolver::resolve`].
    pub fn resolve_frame(&self, name: &str) -> Result<Arc<dyn Stage>, ResolveError> {
        self.resolve(ResolveKind::Frame, name, &[])
    }

    /// Resolves an operator, preferring declared extensions.
    ///
    /// # Errors
    ///
    /// See [`StageResolver::resolve`].
    pub fn resolve_operator(
        &self,
        name: &str,
        declared_extensions: &[String],
    ) -> Result<Arc<dyn Stage>, ResolveError> {
        self.resolve(ResolveKind::Operator, name, declared_extensions)
    }

    /// Resolves an extension stage from the search path only.
    ///
    /// # Errors
    ///
    /// See [`StageResolver::resolve`].
    pub fn resolve_extension(&self, name: &str) -> Result<Arc<dyn Stage>, ResolveError> {
        self.resolve(ResolveKind::Extension, name, &[])
    }

    fn lookup(
        &self,
        kind: ResolveKind,
        name: &str,
        declared_extensions: &[String],
    ) -> Option<&StageFactory> {
        match kind {
            ResolveKind::Frame => self.stages.get(StageKind::Frame, name),
            ResolveKind::Operator => declared_extensions
                .iter()
                .any(|declared| declared == name)
                .then(|| self.extensions.get(name))
                .flatten()
                .or_else(|| self.stages.get(StageKind::Operator, name)),
            ResolveKind::Extension => self.extensions.get(name),
        }
    }
}

impl std::fmt::Debug for StageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageResolver")
            .field("stages", &self.stages)
            .field("extensions", &self.extensions)
            .field("ports", &self.ports)
            .finish()
    }
}
