//! Graph builder and one-time construction checks.

use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

use crate::errors::BuildError;
use crate::node::{AttrKind, AttributeSpec, Node, NodeState};
use crate::sink::{EventSink, TracingSink};
use crate::triplet::{Triplet, Update, UpdateError};

use super::engine::Graph;

/// Builder collecting attribute descriptors before constructing one
/// immutable graph.
///
/// Every shape violation is detected here, once, and is fatal: the hosting
/// device maps the [`BuildError`] to a device-wide FAULT status instead of
/// checking shapes on every read.
pub struct GraphBuilder {
    specs: Vec<AttributeSpec>,
    sink: Arc<dyn EventSink>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            specs: Vec::new(),
            sink: Arc::new(TracingSink),
        }
    }

    /// Add an attribute descriptor.
    #[must_use]
    pub fn attribute(mut self, spec: AttributeSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Add a node fed only by direct writes.
    #[must_use]
    pub fn local_attribute(self, name: impl Into<String>) -> Self {
        self.attribute(AttributeSpec::local(name))
    }

    /// Add a node fed by an external push source.
    #[must_use]
    pub fn source_attribute(self, name: impl Into<String>) -> Self {
        self.attribute(AttributeSpec::source(name))
    }

    /// Add a computed node with its update function.
    #[must_use]
    pub fn computed_attribute<I, S>(
        self,
        name: impl Into<String>,
        bindings: I,
        update: impl Fn(&[Triplet]) -> Result<Update, UpdateError> + Send + Sync + 'static,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute(AttributeSpec::computed(name, bindings).with_update(update))
    }

    /// Replace the default [`TracingSink`] with a custom event sink.
    #[must_use]
    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Validate the collected descriptors and construct the graph.
    ///
    /// Checks, in order: name uniqueness, update function presence,
    /// non-empty bindings, binding resolution, acyclicity. The returned
    /// graph has its dependents map and topological order precomputed.
    pub fn build(self) -> Result<Graph, BuildError> {
        let mut nodes: FxHashMap<String, Node> = FxHashMap::default();
        let mut declared: Vec<String> = Vec::with_capacity(self.specs.len());

        for spec in self.specs {
            if nodes.contains_key(&spec.name) {
                return Err(BuildError::DuplicateAttribute { name: spec.name });
            }
            if spec.kind == AttrKind::Computed {
                if spec.update.is_none() {
                    return Err(BuildError::NoUpdateMethod { name: spec.name });
                }
                if spec.bindings.is_empty() {
                    return Err(BuildError::NoBinding { name: spec.name });
                }
            }
            declared.push(spec.name.clone());
            nodes.insert(
                spec.name,
                Node {
                    kind: spec.kind,
                    bindings: spec.bindings,
                    update: spec.update,
                    state: NodeState::Uninitialized,
                    dependents: Vec::new(),
                },
            );
        }

        // Resolve bindings and derive dependents(X) = { Y : X in bindings(Y) }.
        let mut dependents: FxHashMap<String, Vec<String>> = FxHashMap::default();
        for name in &declared {
            for binding in &nodes[name].bindings {
                if !nodes.contains_key(binding) {
                    return Err(BuildError::UnknownBinding {
                        name: name.clone(),
                        binding: binding.clone(),
                    });
                }
                dependents
                    .entry(binding.clone())
                    .or_default()
                    .push(name.clone());
            }
        }
        for (name, deps) in dependents {
            if let Some(node) = nodes.get_mut(&name) {
                node.dependents = deps;
            }
        }

        let topo = topological_order(&nodes, &declared)?;

        Ok(Graph::from_parts(nodes, topo, self.sink))
    }
}

/// Deterministic topological order over the binding edges.
///
/// Kahn's algorithm with a lexicographically sorted ready set, so the
/// propagation order of a given shape does not depend on map iteration.
fn topological_order(
    nodes: &FxHashMap<String, Node>,
    declared: &[String],
) -> Result<Vec<String>, BuildError> {
    let mut in_degree: FxHashMap<&str, usize> = FxHashMap::default();
    for name in declared {
        in_degree.insert(name.as_str(), nodes[name].bindings.len());
    }

    let mut ready: Vec<&str> = in_degree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(n, _)| *n)
        .collect();
    ready.sort_unstable();

    let mut order = Vec::with_capacity(declared.len());
    let mut visited: FxHashSet<&str> = FxHashSet::default();

    while let Some(next) = ready.first().copied() {
        ready.remove(0);
        visited.insert(next);
        order.push(next.to_owned());
        for dependent in &nodes[next].dependents {
            let degree = in_degree
                .get_mut(dependent.as_str())
                .expect("dependents derived from declared bindings");
            *degree -= 1;
            if *degree == 0 {
                let pos = ready
                    .binary_search(&dependent.as_str())
                    .unwrap_or_else(|p| p);
                ready.insert(pos, dependent.as_str());
            }
        }
    }

    if order.len() != declared.len() {
        // Any node left with a positive in-degree sits on a cycle.
        let mut cyclic: Vec<&String> = declared
            .iter()
            .filter(|n| !visited.contains(n.as_str()))
            .collect();
        cyclic.sort_unstable();
        return Err(BuildError::CircularBinding {
            name: (*cyclic.first().expect("leftover node on cycle")).clone(),
        });
    }

    Ok(order)
}
