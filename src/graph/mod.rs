//! Dependency graph construction and the propagation engine.
//!
//! A graph is built once, at device initialization, from declarative
//! [`AttributeSpec`](crate::node::AttributeSpec) descriptors. Construction
//! validates the graph shape (update functions, bindings, acyclicity) and
//! derives the dependents map and a deterministic topological order; the
//! topology is static afterwards.
//!
//! At runtime the [`Graph`] handle exposes three operations: `write`, `fail`
//! and `get`. Writes and failures trigger a propagation cycle that
//! recomputes every transitive dependent exactly once, in topological
//! order, emitting one change and one archive event per touched node before
//! the triggering call returns.
//!
//! ```
//! use attrgraph::graph::GraphBuilder;
//! use attrgraph::sink::MemorySink;
//! use attrgraph::triplet::{Triplet, Update};
//! use serde_json::json;
//!
//! let sink = MemorySink::new();
//! let graph = GraphBuilder::new()
//!     .local_attribute("A")
//!     .local_attribute("B")
//!     .computed_attribute("C", ["A", "B"], |args| {
//!         let a = args[0].as_f64().unwrap_or_default();
//!         let b = args[1].as_f64().unwrap_or_default();
//!         Ok(Update::Value(json!(a / b)))
//!     })
//!     .with_sink(sink.clone())
//!     .build()
//!     .unwrap();
//!
//! graph.write("A", Triplet::now(json!(21.0))).unwrap();
//! graph.write("B", Triplet::now(json!(7.0))).unwrap();
//! assert_eq!(graph.get("C").unwrap().as_f64(), Some(3.0));
//! ```

mod builder;
mod engine;


pub use builder::GraphBuilder;
pub use engine::Graph;
