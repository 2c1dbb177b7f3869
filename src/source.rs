//! Push-source abstraction feeding source-backed nodes.
//!
//! A [`PushSource`] delivers notifications into a queue owned by the
//! connector; one worker task per connector drains the queue and applies the
//! readings to the graph. Subscribing happens once at connector start,
//! outside the graph lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::triplet::{Quality, Value};

/// Push subscription flavors, tried in this order by the connector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubscriptionKind {
    /// Deliver a notification on every value change.
    Change,
    /// Deliver notifications at the source's polling period.
    Periodic,
}

impl std::fmt::Display for SubscriptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionKind::Change => write!(f, "CHANGE"),
            SubscriptionKind::Periodic => write!(f, "PERIODIC"),
        }
    }
}

/// Opaque handle identifying an active subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Error reported by a source, carrying the source's error code verbatim.
#[derive(Clone, Debug, Error)]
#[error("{code}: {message}")]
pub struct SourceError {
    pub code: String,
    pub message: String,
}

impl SourceError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Benign desync codes are swallowed by the connector: no state change,
    /// no event.
    pub fn is_benign(&self) -> bool {
        BENIGN_ERROR_CODES.contains(&self.code.as_str())
    }
}

/// Source error codes known to be transient polling desyncs.
pub const BENIGN_ERROR_CODES: &[&str] = &["API_PollThreadOutOfSync"];

/// One inbound notification from a push source.
#[derive(Clone, Debug)]
pub enum SourceNotification {
    /// A settled remote reading.
    Reading {
        attribute: String,
        value: Value,
        timestamp: DateTime<Utc>,
        quality: Quality,
    },
    /// The source reported one or more errors; the first one is the cause.
    Error {
        attribute: String,
        errors: Vec<SourceError>,
    },
    /// An envelope the connector could not decode. Ignored silently.
    Malformed,
}

/// Remote push source exposing subscriptions and a write entry point.
///
/// `subscribe` must start delivering notifications into `tx` before it
/// returns, or fail with a [`SourceError`] when the requested kind is
/// unsupported; the connector then falls back from CHANGE to PERIODIC.
#[async_trait]
pub trait PushSource: Send + Sync {
    async fn subscribe(
        &self,
        attribute: &str,
        kind: SubscriptionKind,
        tx: flume::Sender<SourceNotification>,
    ) -> Result<SubscriptionId, SourceError>;

    async fn unsubscribe(&self, id: SubscriptionId);

    /// Write a value to the remote attribute.
    async fn write(&self, attribute: &str, value: Value) -> Result<(), SourceError>;

    /// Whether the remote attribute accepts writes.
    async fn is_writable(&self, attribute: &str) -> Result<bool, SourceError>;
}
