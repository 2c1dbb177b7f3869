//! # Attrgraph: Reactive Attribute Propagation for Facade Devices
//!
//! Attrgraph aggregates raw inputs (operator writes and remote device
//! events) into a static graph of derived attribute values and republishes
//! every settled value (or failure) to external listeners.
//!
//! ## Core Concepts
//!
//! - **Triplet**: value + timestamp + quality, the unit of a settled reading
//! - **Node**: a named slot holding a valid triplet or a failure context
//! - **Graph**: the propagation engine with deterministic recomputation
//!   order, atomic cycles and exactly-once event emission
//! - **Connector**: keeps source-backed nodes fresh via push subscriptions
//!   with CHANGE→PERIODIC fallback and benign-error filtering
//! - **Failure propagation**: a failing ancestor fans out to every
//!   transitive descendant while each descendant exposes the *identical*
//!   root-cause object, even across diamond-shaped dependencies
//!
//! ## Quick Start
//!
//! ```
//! use attrgraph::graph::GraphBuilder;
//! use attrgraph::triplet::{Triplet, Update};
//! use serde_json::json;
//!
//! let graph = GraphBuilder::new()
//!     .local_attribute("A")
//!     .computed_attribute("B", ["A"], |args| {
//!         Ok(Update::Value(json!(args[0].as_f64().unwrap_or_default() * 10.0)))
//!     })
//!     .build()
//!     .unwrap();
//!
//! graph.write("A", Triplet::now(json!(7.0))).unwrap();
//! assert_eq!(graph.get("B").unwrap().as_f64(), Some(70.0));
//! ```
//!
//! ## Module Guide
//!
//! - [`triplet`] - Value model: triplets, qualities, update outcomes
//! - [`failure`] - Failure contexts with referential root-cause identity
//! - [`node`] - Attribute descriptors, states and update functions
//! - [`graph`] - Builder, validation and the propagation engine
//! - [`sink`] - Change/archive event sinks
//! - [`source`] - Push-source abstraction and notifications
//! - [`connector`] - Source-backed node connector with write-through
//! - [`local`] - Local writer adapter
//! - [`fault`] - Device-fault reporting handle
//! - [`errors`] - Construction, graph and connector error types

pub mod connector;
pub mod errors;
pub mod failure;
pub mod fault;
pub mod graph;
pub mod local;
pub mod node;
pub mod sink;
pub mod source;
pub mod telemetry;
pub mod triplet;
