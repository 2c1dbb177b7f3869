//! The propagation engine behind the [`Graph`] handle.
//!
//! All mutating entry points and the propagation cycles they trigger run
//! under one exclusive per-graph lock, so a full cycle is atomic with
//! respect to every other mutation and no observer ever sees a partially
//! propagated cycle. Reads take the same lock briefly for a consistent
//! snapshot and never block on external I/O.

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

use crate::errors::{GraphError, MissingValue};
use crate::failure::FailureContext;
use crate::node::{AttrKind, Node, NodeState};
use crate::sink::{AttrReport, EventSink};
use crate::triplet::Triplet;

/// Handle to one attribute graph. Cheap to clone; clones share the engine.
#[derive(Clone)]
pub struct Graph {
    inner: Arc<Mutex<GraphInner>>,
}

struct GraphInner {
    nodes: FxHashMap<String, Node>,
    /// Full topological order over binding edges, fixed at construction.
    topo: Vec<String>,
    sink: Arc<dyn EventSink>,
}

impl Graph {
    pub(crate) fn from_parts(
        nodes: FxHashMap<String, Node>,
        topo: Vec<String>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(GraphInner { nodes, topo, sink })),
        }
    }

    /// Settle `name` to `Valid(triplet)`, emit its event pair, then
    /// recompute every transitive dependent.
    ///
    /// Writing a computed node is rejected; derived values only change
    /// through their bindings.
    pub fn write(&self, name: &str, triplet: Triplet) -> Result<(), GraphError> {
        let mut inner = self.inner.lock();
        let node = inner
            .nodes
            .get_mut(name)
            .ok_or_else(|| GraphError::UnknownAttribute { name: name.into() })?;
        if node.kind == AttrKind::Computed {
            return Err(GraphError::NotWritable { name: name.into() });
        }
        node.state = NodeState::Valid(triplet);
        inner.emit(name);
        inner.propagate(name);
        Ok(())
    }

    /// Settle `name` to `Failed`, emit its event pair, then propagate.
    ///
    /// The failure context travels to every transitive dependent by shared
    /// reference; downstream readers see the identical root cause.
    pub fn fail(&self, name: &str, failure: FailureContext) -> Result<(), GraphError> {
        let mut inner = self.inner.lock();
        let node = inner
            .nodes
            .get_mut(name)
            .ok_or_else(|| GraphError::UnknownAttribute { name: name.into() })?;
        node.state = NodeState::Failed(failure);
        inner.emit(name);
        inner.propagate(name);
        Ok(())
    }

    /// Current settled reading of `name`.
    ///
    /// Fails with `NotInitialized` before the first settled value and
    /// re-raises the stored root cause while the node is failed.
    pub fn get(&self, name: &str) -> Result<Triplet, GraphError> {
        let inner = self.inner.lock();
        let node = inner
            .nodes
            .get(name)
            .ok_or_else(|| GraphError::UnknownAttribute { name: name.into() })?;
        match &node.state {
            NodeState::Uninitialized => Err(GraphError::NotInitialized { name: name.into() }),
            NodeState::Failed(ctx) => Err(GraphError::Failed(ctx.clone())),
            NodeState::Valid(triplet) => Ok(triplet.clone()),
        }
    }

    /// Whether `name` is a node of this graph.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.lock().nodes.contains_key(name)
    }

    /// Node names in propagation order.
    pub fn names(&self) -> Vec<String> {
        self.inner.lock().topo.clone()
    }
}

impl GraphInner {
    /// Emit the change/archive pair for the current state of `name`.
    ///
    /// Called once per touched node per cycle, under the engine lock, so
    /// emission is synchronous and exactly-once.
    fn emit(&self, name: &str) {
        let report = match &self.nodes[name].state {
            NodeState::Valid(triplet) => AttrReport::Value(triplet.clone()),
            NodeState::Failed(ctx) => AttrReport::Error(ctx.clone()),
            // Nodes only transition out of Uninitialized; nothing to emit.
            NodeState::Uninitialized => return,
        };
        self.sink.on_change(name, &report);
        self.sink.on_archive(name, &report);
    }

    /// One propagation cycle triggered by a transition on `origin`.
    ///
    /// The affected set is the transitive dependents of the origin; it is
    /// visited in the precomputed topological order, so a dependent is
    /// recomputed only after every one of its touched bindings has settled,
    /// and each node is visited at most once.
    fn propagate(&mut self, origin: &str) {
        let mut affected: FxHashSet<String> = FxHashSet::default();
        let mut frontier: Vec<&str> = vec![origin];
        while let Some(next) = frontier.pop() {
            for dependent in &self.nodes[next].dependents {
                if affected.insert(dependent.clone()) {
                    frontier.push(dependent.as_str());
                }
            }
        }
        if affected.is_empty() {
            return;
        }

        let order: Vec<String> = self
            .topo
            .iter()
            .filter(|n| affected.contains(*n))
            .cloned()
            .collect();
        for name in order {
            self.recompute(&name);
            self.emit(&name);
        }
    }

    /// Recompute one dependent from the current states of its bindings.
    fn recompute(&mut self, name: &str) {
        let node = &self.nodes[name];

        let mut first_failed: Option<FailureContext> = None;
        let mut first_missing: Option<String> = None;
        let mut args: Vec<Triplet> = Vec::with_capacity(node.bindings.len());
        for binding in &node.bindings {
            match &self.nodes[binding].state {
                NodeState::Valid(triplet) => args.push(triplet.clone()),
                NodeState::Failed(ctx) => {
                    if first_failed.is_none() {
                        first_failed = Some(ctx.clone());
                    }
                }
                NodeState::Uninitialized => {
                    if first_missing.is_none() {
                        first_missing = Some(binding.clone());
                    }
                }
            }
        }

        let state = if let Some(ctx) = first_failed {
            // Forward the upstream context as-is: same root cause object.
            NodeState::Failed(ctx)
        } else if let Some(binding) = first_missing {
            // No upstream failure to forward; synthesize a local cause.
            NodeState::Failed(FailureContext::new(MissingValue { binding }))
        } else {
            let update = node
                .update
                .clone()
                .expect("computed nodes have an update function after validation");
            match (update.as_ref())(&args) {
                Ok(update) => NodeState::Valid(update.into_triplet()),
                Err(error) => {
                    tracing::debug!(attribute = name, %error, "update function failed");
                    NodeState::Failed(FailureContext::from_boxed(error))
                }
            }
        };

        self.nodes
            .get_mut(name)
            .expect("affected nodes exist")
            .state = state;
    }
}
