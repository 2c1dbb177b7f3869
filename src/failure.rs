//! Failure context with referential root-cause identity.
//!
//! When a failure propagates through the graph, every downstream node must
//! expose the *same* root-cause object, not a copy. [`FailureContext`] holds
//! the causing error behind an `Arc`; cloning the context shares the Arc, so
//! identity survives arbitrarily many hops and diamond-shaped fan-outs.

use std::error::Error;
use std::sync::Arc;

type RootCause = Arc<dyn Error + Send + Sync + 'static>;

/// Shared handle to the original error behind a failed node.
///
/// Propagation clones this context; it never re-wraps the inner error, so
/// [`FailureContext::same_root_cause`] holds across every hop.
#[derive(Clone)]
pub struct FailureContext {
    root_cause: RootCause,
}

impl FailureContext {
    /// Wrap a freshly captured error. This is a new failure origin.
    pub fn new(error: impl Error + Send + Sync + 'static) -> Self {
        Self {
            root_cause: Arc::new(error),
        }
    }

    /// Wrap an already shared error without adding a layer.
    pub fn from_arc(root_cause: RootCause) -> Self {
        Self { root_cause }
    }

    /// Take ownership of a boxed error without adding a layer.
    pub fn from_boxed(error: Box<dyn Error + Send + Sync + 'static>) -> Self {
        Self {
            root_cause: Arc::from(error),
        }
    }

    /// The original error, shared with every other context derived from it.
    pub fn root_cause(&self) -> RootCause {
        Arc::clone(&self.root_cause)
    }

    /// True when both contexts point at the very same error object.
    pub fn same_root_cause(&self, other: &FailureContext) -> bool {
        Arc::ptr_eq(&self.root_cause, &other.root_cause)
    }
}

impl std::fmt::Display for FailureContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.root_cause)
    }
}

impl std::fmt::Debug for FailureContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureContext")
            .field("root_cause", &format_args!("{}", self.root_cause))
            .finish()
    }
}

impl Error for FailureContext {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.root_cause.as_ref())
    }
}
