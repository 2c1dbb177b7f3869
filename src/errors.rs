//! Error types for graph construction, graph operations and connectors.
//!
//! Construction errors are fatal: the hosting device surfaces them through a
//! [`FaultHandle`](crate::fault::FaultHandle) and refuses normal reads until
//! it is reinitialized. Runtime errors are per-attribute and recoverable.

use miette::Diagnostic;
use thiserror::Error;

use crate::failure::FailureContext;
use crate::source::SourceError;

/// Fatal graph-shape violations detected once, at construction time.
///
/// The `Display` output carries the exact status substrings operators expect
/// (`"No update method defined"`, `"No binding defined"`).
#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    /// Two attribute specs share the same name.
    #[error("duplicate attribute <{name}>")]
    #[diagnostic(code(attrgraph::build::duplicate))]
    DuplicateAttribute { name: String },

    /// A computed attribute was declared without an update function.
    #[error("No update method defined for attribute <{name}>")]
    #[diagnostic(
        code(attrgraph::build::no_update_method),
        help("Computed attributes need an update function; see AttributeSpec::with_update.")
    )]
    NoUpdateMethod { name: String },

    /// A computed attribute was declared with an empty binding list.
    #[error("No binding defined for attribute <{name}>")]
    #[diagnostic(
        code(attrgraph::build::no_binding),
        help("Computed attributes must bind at least one upstream attribute.")
    )]
    NoBinding { name: String },

    /// A binding references a name that is not part of the graph.
    #[error("undefined binding <{binding}> for attribute <{name}>")]
    #[diagnostic(code(attrgraph::build::unknown_binding))]
    UnknownBinding { name: String, binding: String },

    /// The bindings form a cycle, so no propagation order exists.
    #[error("circular binding involving attribute <{name}>")]
    #[diagnostic(code(attrgraph::build::circular_binding))]
    CircularBinding { name: String },
}

/// Runtime errors raised by graph operations.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// The requested name is not a node of this graph.
    #[error("no such attribute <{name}>")]
    #[diagnostic(code(attrgraph::graph::unknown_attribute))]
    UnknownAttribute { name: String },

    /// The node has not settled a first value yet.
    #[error("attribute <{name}> is not initialized")]
    #[diagnostic(
        code(attrgraph::graph::not_initialized),
        help("Reads fail until the attribute settles its first value.")
    )]
    NotInitialized { name: String },

    /// Direct writes are only legal on local and source-backed nodes.
    #[error("attribute <{name}> is not writable")]
    #[diagnostic(code(attrgraph::graph::not_writable))]
    NotWritable { name: String },

    /// The node is failed; the stored root cause is re-raised unchanged.
    #[error("{0}")]
    #[diagnostic(code(attrgraph::graph::failed))]
    Failed(FailureContext),
}

impl GraphError {
    /// The propagated failure context, when this error re-raises one.
    pub fn failure(&self) -> Option<&FailureContext> {
        match self {
            GraphError::Failed(ctx) => Some(ctx),
            _ => None,
        }
    }
}

/// Errors raised by the external source connector.
#[derive(Debug, Error, Diagnostic)]
pub enum ConnectorError {
    /// The configured address is the disabled sentinel.
    #[error("This proxy command is disabled")]
    #[diagnostic(code(attrgraph::connector::disabled))]
    Disabled,

    /// The configured address does not split into endpoint and attribute.
    #[error("invalid source address <{address}>")]
    #[diagnostic(
        code(attrgraph::connector::invalid_address),
        help("Expected <endpoint>/<attribute>, e.g. a/b/c/d, or the sentinel 'none'.")
    )]
    InvalidAddress { address: String },

    /// Write access was requested but the remote attribute is read-only.
    #[error("The attribute {address} is not writable")]
    #[diagnostic(code(attrgraph::connector::not_writable))]
    NotWritable { address: String },

    /// Both CHANGE and PERIODIC subscriptions were refused by the source.
    #[error("Exception while connecting proxy_attribute <{node}>")]
    #[diagnostic(code(attrgraph::connector::subscribe_failed))]
    SubscribeFailed {
        node: String,
        #[source]
        last: SourceError,
    },

    /// A remote operation failed; surfaced unchanged to the caller.
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Locally synthesized cause used when a dependent is blocked by a binding
/// that is merely uninitialized (no upstream failure to forward).
#[derive(Debug, Error)]
#[error("missing value for binding <{binding}>")]
pub struct MissingValue {
    pub binding: String,
}
