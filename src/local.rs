//! Local writer: the trivial adapter for operator writes.

use crate::errors::GraphError;
use crate::graph::Graph;
use crate::triplet::{Triplet, Value};

/// Feeds the graph directly from operator writes.
///
/// Local nodes have no bindings and no update function; other nodes may
/// depend on them, they depend on nothing.
#[derive(Clone)]
pub struct LocalWriter {
    graph: Graph,
}

impl LocalWriter {
    pub fn new(graph: Graph) -> Self {
        Self { graph }
    }

    /// Stamp `value` with the current time and `Quality::Valid` and settle
    /// the node, triggering propagation.
    pub fn write(&self, name: &str, value: Value) -> Result<(), GraphError> {
        self.graph.write(name, Triplet::now(value))
    }
}
