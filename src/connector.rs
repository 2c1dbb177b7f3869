//! Connector binding a source-backed node to a remote push source.
//!
//! The connector resolves its configured address once at start, checks
//! writability when write access was requested, subscribes with a
//! CHANGE→PERIODIC fallback and spawns one worker task that drains the
//! notification queue. The worker acquires the graph lock only for the
//! brief `write`/`fail` call per notification, never across source I/O.
//!
//! A connector whose address is the disabled sentinel (`"none"`, any case)
//! never subscribes and never faults the device: its node simply stays
//! unavailable and write-through is rejected with a disabled-specific
//! message. Every other start-time failure is fatal for the device and is
//! reported through the [`FaultHandle`].

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::errors::ConnectorError;
use crate::failure::FailureContext;
use crate::fault::FaultHandle;
use crate::graph::Graph;
use crate::source::{PushSource, SourceNotification, SubscriptionId, SubscriptionKind};
use crate::triplet::{Triplet, UpdateError, Value};

/// Producer-supplied conversion applied to inbound raw values.
pub type ConvertFn = Arc<dyn Fn(Value) -> Result<Value, UpdateError> + Send + Sync>;

/// Resolved form of a configured source address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceAddress {
    /// The disabled sentinel: never subscribe, never fault.
    Disabled,
    /// `<endpoint>/<attribute>`, e.g. `a/b/c/d` → endpoint `a/b/c`,
    /// attribute `d`.
    Resolved { endpoint: String, attribute: String },
}

impl SourceAddress {
    /// Resolve a configured address string. Case-insensitive `"none"` is
    /// the disabled sentinel; otherwise the last `/` segment names the
    /// remote attribute.
    pub fn parse(address: &str) -> Result<Self, ConnectorError> {
        let trimmed = address.trim();
        if trimmed.eq_ignore_ascii_case("none") {
            return Ok(SourceAddress::Disabled);
        }
        match trimmed.rsplit_once('/') {
            Some((endpoint, attribute)) if !endpoint.is_empty() && !attribute.is_empty() => {
                Ok(SourceAddress::Resolved {
                    endpoint: endpoint.to_owned(),
                    attribute: attribute.to_owned(),
                })
            }
            _ => Err(ConnectorError::InvalidAddress {
                address: address.to_owned(),
            }),
        }
    }
}

/// Start-time configuration of one connector.
pub struct ConnectorSettings {
    node: String,
    address: String,
    write_access: bool,
    convert: Option<ConvertFn>,
}

impl ConnectorSettings {
    pub fn new(node: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            address: address.into(),
            write_access: false,
            convert: None,
        }
    }

    /// Request write access; the remote attribute's writability is checked
    /// once at connector start.
    #[must_use]
    pub fn with_write_access(mut self) -> Self {
        self.write_access = true;
        self
    }

    /// Apply a conversion to every inbound value (identity by default).
    #[must_use]
    pub fn with_convert(
        mut self,
        convert: impl Fn(Value) -> Result<Value, UpdateError> + Send + Sync + 'static,
    ) -> Self {
        self.convert = Some(Arc::new(convert));
        self
    }
}

enum Mode {
    Disabled,
    Connected {
        attribute: String,
        subscription: SubscriptionId,
        kind: SubscriptionKind,
        worker: Option<Worker>,
    },
}

struct Worker {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// A started connector. Dropping it aborts the worker; [`stop`](Self::stop)
/// shuts it down cleanly and unsubscribes.
pub struct SourceConnector {
    node: String,
    source: Arc<dyn PushSource>,
    mode: Mode,
}

impl SourceConnector {
    /// Resolve, check writability, subscribe and spawn the worker.
    ///
    /// Runs outside the graph lock; a pending subscribe attempt is aborted
    /// by dropping the future at shutdown. Fatal conditions (read-only
    /// remote with write access requested, both subscription kinds
    /// refused) are recorded on `fault` before the error returns.
    pub async fn start(
        settings: ConnectorSettings,
        source: Arc<dyn PushSource>,
        graph: Graph,
        fault: FaultHandle,
    ) -> Result<Self, ConnectorError> {
        let ConnectorSettings {
            node,
            address,
            write_access,
            convert,
        } = settings;

        let (endpoint, attribute) = match SourceAddress::parse(&address) {
            Ok(SourceAddress::Disabled) => {
                tracing::info!(attribute = %node, "connector disabled, not subscribing");
                return Ok(Self {
                    node,
                    source,
                    mode: Mode::Disabled,
                });
            }
            Ok(SourceAddress::Resolved {
                endpoint,
                attribute,
            }) => (endpoint, attribute),
            Err(error) => {
                fault.set_fault(error.to_string());
                return Err(error);
            }
        };

        if write_access {
            match source.is_writable(&attribute).await {
                Ok(true) => {}
                Ok(false) => {
                    let error = ConnectorError::NotWritable {
                        address: format!("{endpoint}/{attribute}"),
                    };
                    fault.set_fault(error.to_string());
                    return Err(error);
                }
                Err(last) => {
                    let error = ConnectorError::SubscribeFailed {
                        node: node.clone(),
                        last,
                    };
                    fault.set_fault(error.to_string());
                    return Err(error);
                }
            }
        }

        let (tx, rx) = flume::unbounded();
        let (subscription, kind) = match source
            .subscribe(&attribute, SubscriptionKind::Change, tx.clone())
            .await
        {
            Ok(id) => (id, SubscriptionKind::Change),
            Err(change_err) => {
                tracing::debug!(
                    attribute = %node,
                    error = %change_err,
                    "change subscription refused, falling back to periodic"
                );
                match source
                    .subscribe(&attribute, SubscriptionKind::Periodic, tx)
                    .await
                {
                    Ok(id) => (id, SubscriptionKind::Periodic),
                    Err(last) => {
                        let error = ConnectorError::SubscribeFailed {
                            node: node.clone(),
                            last,
                        };
                        fault.set_fault(error.to_string());
                        return Err(error);
                    }
                }
            }
        };
        tracing::info!(attribute = %node, remote = %attribute, %kind, "connector subscribed");

        let worker = spawn_worker(node.clone(), graph, convert, rx);

        Ok(Self {
            node,
            source,
            mode: Mode::Connected {
                attribute,
                subscription,
                kind,
                worker: Some(worker),
            },
        })
    }

    /// Name of the graph node this connector feeds.
    pub fn node(&self) -> &str {
        &self.node
    }

    /// The subscription kind in effect, if connected.
    pub fn subscription_kind(&self) -> Option<SubscriptionKind> {
        match &self.mode {
            Mode::Connected { kind, .. } => Some(*kind),
            Mode::Disabled => None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self.mode, Mode::Disabled)
    }

    /// Forward a write to the remote source at the resolved address.
    ///
    /// Remote failures surface unchanged; local node state is never
    /// mutated here, only by the notification that follows.
    pub async fn write_through(&self, value: Value) -> Result<(), ConnectorError> {
        match &self.mode {
            Mode::Disabled => Err(ConnectorError::Disabled),
            Mode::Connected { attribute, .. } => {
                self.source.write(attribute, value).await?;
                Ok(())
            }
        }
    }

    /// Stop the worker and unsubscribe from the source.
    ///
    /// An in-flight propagation cycle always completes: the worker only
    /// observes the shutdown signal between notifications.
    pub async fn stop(mut self) {
        if let Mode::Connected {
            subscription,
            worker,
            ..
        } = &mut self.mode
        {
            if let Some(worker) = worker.take() {
                let _ = worker.shutdown_tx.send(());
                let _ = worker.handle.await;
            }
            self.source.unsubscribe(*subscription).await;
        }
    }
}

impl Drop for SourceConnector {
    fn drop(&mut self) {
        if let Mode::Connected { worker, .. } = &mut self.mode {
            if let Some(worker) = worker.take() {
                let _ = worker.shutdown_tx.send(());
                worker.handle.abort();
            }
        }
    }
}

fn spawn_worker(
    node: String,
    graph: Graph,
    convert: Option<ConvertFn>,
    rx: flume::Receiver<SourceNotification>,
) -> Worker {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                recv = rx.recv_async() => match recv {
                    Err(_) => break,
                    Ok(notification) => {
                        handle_notification(&node, &graph, convert.as_ref(), notification);
                    }
                }
            }
        }
    });
    Worker {
        shutdown_tx,
        handle,
    }
}

/// Apply one inbound notification to the graph.
fn handle_notification(
    node: &str,
    graph: &Graph,
    convert: Option<&ConvertFn>,
    notification: SourceNotification,
) {
    let result = match notification {
        SourceNotification::Malformed => {
            tracing::debug!(attribute = node, "ignoring malformed notification");
            return;
        }
        SourceNotification::Error { errors, .. } => {
            let Some(first) = errors.into_iter().next() else {
                tracing::debug!(attribute = node, "ignoring empty error notification");
                return;
            };
            if first.is_benign() {
                tracing::debug!(attribute = node, code = %first.code, "ignoring benign source error");
                return;
            }
            graph.fail(node, FailureContext::new(first))
        }
        SourceNotification::Reading {
            value,
            timestamp,
            quality,
            ..
        } => {
            let converted = match convert {
                Some(convert) => (convert.as_ref())(value),
                None => Ok(value),
            };
            match converted {
                Ok(value) => graph.write(node, Triplet::new(value, timestamp, quality)),
                Err(error) => {
                    tracing::debug!(attribute = node, %error, "conversion failed");
                    graph.fail(node, FailureContext::from_boxed(error))
                }
            }
        }
    };
    if let Err(error) = result {
        tracing::warn!(attribute = node, %error, "dropping notification");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_endpoint_and_attribute() {
        let parsed = SourceAddress::parse("a/b/c/d").unwrap();
        assert_eq!(
            parsed,
            SourceAddress::Resolved {
                endpoint: "a/b/c".into(),
                attribute: "d".into(),
            }
        );
    }

    #[test]
    fn disabled_sentinel_is_case_insensitive() {
        for sentinel in ["none", "None", "NONE"] {
            assert_eq!(
                SourceAddress::parse(sentinel).unwrap(),
                SourceAddress::Disabled
            );
        }
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        for bad in ["", "noslash", "/leading", "trailing/"] {
            assert!(matches!(
                SourceAddress::parse(bad),
                Err(ConnectorError::InvalidAddress { .. })
            ));
        }
    }
}
