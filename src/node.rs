//! Attribute node model: state, kind, bindings and update functions.

use std::sync::Arc;

use crate::failure::FailureContext;
use crate::triplet::{Triplet, Update, UpdateError};

/// Update function of a computed attribute.
///
/// Receives the current `Valid` triplets of the bindings, in declared
/// binding order, and produces the node's next reading.
pub type UpdateFn = Arc<dyn Fn(&[Triplet]) -> Result<Update, UpdateError> + Send + Sync>;

/// Current state of a node.
///
/// Nodes start `Uninitialized` (reads fail), then transition between
/// `Valid` and `Failed` on writes, failures and upstream recomputation.
/// They never return to `Uninitialized`.
#[derive(Clone, Debug, Default)]
pub enum NodeState {
    #[default]
    Uninitialized,
    Valid(Triplet),
    Failed(FailureContext),
}

impl NodeState {
    pub fn is_valid(&self) -> bool {
        matches!(self, NodeState::Valid(_))
    }
}

/// How a node is fed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttrKind {
    /// Fed only by direct operator writes.
    Local,
    /// Fed by push notifications from an external source.
    SourceBacked,
    /// Derived from other nodes via an update function.
    Computed,
}

/// Declarative descriptor collected by the builder before the graph is
/// constructed.
///
/// # Examples
///
/// ```
/// use attrgraph::node::AttributeSpec;
/// use attrgraph::triplet::Update;
/// use serde_json::json;
///
/// let a = AttributeSpec::local("A");
/// let c = AttributeSpec::computed("C", ["A"]).with_update(|args| {
///     Ok(Update::Value(json!(args[0].as_f64().unwrap_or_default() * 10.0)))
/// });
/// # let _ = (a, c);
/// ```
pub struct AttributeSpec {
    pub(crate) name: String,
    pub(crate) kind: AttrKind,
    pub(crate) bindings: Vec<String>,
    pub(crate) update: Option<UpdateFn>,
}

impl AttributeSpec {
    /// A node fed only by direct writes.
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttrKind::Local,
            bindings: Vec::new(),
            update: None,
        }
    }

    /// A node fed by an external push source through a connector.
    pub fn source(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttrKind::SourceBacked,
            bindings: Vec::new(),
            update: None,
        }
    }

    /// A node derived from `bindings` via an update function.
    ///
    /// The update function is attached with [`with_update`](Self::with_update);
    /// leaving it off is a construction-time fault, not a type error, so the
    /// violation surfaces through validation like every other shape check.
    pub fn computed<I, S>(name: impl Into<String>, bindings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: AttrKind::Computed,
            bindings: bindings.into_iter().map(Into::into).collect(),
            update: None,
        }
    }

    /// Attach the update function.
    #[must_use]
    pub fn with_update(
        mut self,
        update: impl Fn(&[Triplet]) -> Result<Update, UpdateError> + Send + Sync + 'static,
    ) -> Self {
        self.update = Some(Arc::new(update));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AttrKind {
        self.kind
    }
}

/// One addressable slot of the graph. Internal to the engine.
pub(crate) struct Node {
    pub(crate) kind: AttrKind,
    pub(crate) bindings: Vec<String>,
    pub(crate) update: Option<UpdateFn>,
    pub(crate) state: NodeState,
    /// Names of the nodes whose bindings include this one. Derived once at
    /// build time, consistent with `bindings` by construction.
    pub(crate) dependents: Vec<String>,
}
