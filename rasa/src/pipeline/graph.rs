//! StageGraph - the compiled, linear execution graph of a persona.

use crate::stages::{Stage, StageKind};
use std::collections::HashMap;
use std::sync::Arc;

/// A resolved stage placed in the graph.
#[derive(Debug, Clone)]
pub struct StageNode {
    stage: Arc<dyn Stage>,
}

impl StageNode {
    /// Wraps a resolved stage.
    #[must_use]
    pub fn new(stage: Arc<dyn Stage>) -> Self {
        Self { stage }
    }

    /// Node id (the stage name).
    #[must_use]
    pub fn name(&self) -> &str {
        self.stage.name()
    }

    /// The stage's phase.
    #[must_use]
    pub fn kind(&self) -> StageKind {
        self.stage.kind()
    }

    /// The stage instance.
    #[must_use]
    pub fn stage(&self) -> &Arc<dyn Stage> {
        &self.stage
    }
}

/// A directed graph of stages with one entry and one finish node.
///
/// Graphs built by [`StageGraph::linear`] chain nodes in declared order.
#[derive(Debug, Clone)]
pub struct StageGraph {
    name: String,
    nodes: Vec<StageNode>,
    next: HashMap<usize, usize>,
}

impl StageGraph {
    /// Chains `nodes` with sequential edges: the first node is the entry and
    /// the last one the finish.
    #[must_use]
    pub fn linear(name: impl Into<String>, nodes: Vec<StageNode>) -> Self {
        let next = (1..nodes.len()).map(|to| (to - 1, to)).collect();
        Self {
            name: name.into(),
            nodes,
            next,
        }
    }

    /// The graph (persona) name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The entry node.
    #[must_use]
    pub fn entry(&self) -> Option<&StageNode> {
        self.nodes.first()
    }

    /// The finish node.
    #[must_use]
    pub fn finish(&self) -> Option<&StageNode> {
        self.nodes.last()
    }

    /// Edges as `(from, to)` node ids.
    #[must_use]
    pub fn edges(&self) -> Vec<(&str, &str)> {
        let mut edges: Vec<(usize, usize)> = self.next.iter().map(|(&from, &to)| (from, to)).collect();
        edges.sort_unstable();
        edges
            .into_iter()
            .map(|(from, to)| (self.nodes[from].name(), self.nodes[to].name()))
            .collect()
    }

    /// Nodes in the order they run: from the entry along the edges to the
    /// finish.
    #[must_use]
    pub fn execution_order(&self) -> Vec<&StageNode> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut current = (!self.nodes.is_empty()).then_some(0);
        while let Some(index) = current {
            order.push(&self.nodes[index]);
            current = self.next.get(&index).copied();
        }
        order
    }

    /// Node ids in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.execution_order()
            .into_iter()
            .map(StageNode::name)
            .collect()
    }
}
