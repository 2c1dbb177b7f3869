use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use attrgraph::source::{
    PushSource, SourceError, SourceNotification, SubscriptionId, SubscriptionKind,
};
use attrgraph::triplet::Value;

/// Scriptable push source: tests choose which subscription kinds succeed,
/// whether the attribute is writable, and push notifications by hand.
#[derive(Clone)]
pub struct MockSource {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    accepted_kinds: Vec<SubscriptionKind>,
    writable: bool,
    write_error: Option<SourceError>,
    writes: Vec<(String, Value)>,
    attempts: Vec<(String, SubscriptionKind)>,
    delivery: Option<flume::Sender<SourceNotification>>,
    unsubscribed: Vec<SubscriptionId>,
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSource {
    /// Accepts CHANGE and PERIODIC, writable.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                accepted_kinds: vec![SubscriptionKind::Change, SubscriptionKind::Periodic],
                writable: true,
                write_error: None,
                writes: Vec::new(),
                attempts: Vec::new(),
                delivery: None,
                unsubscribed: Vec::new(),
            })),
        }
    }

    pub fn accept_only(self, kinds: &[SubscriptionKind]) -> Self {
        self.inner.lock().accepted_kinds = kinds.to_vec();
        self
    }

    pub fn read_only(self) -> Self {
        self.inner.lock().writable = false;
        self
    }

    pub fn fail_writes_with(self, error: SourceError) -> Self {
        self.inner.lock().write_error = Some(error);
        self
    }

    /// Deliver a notification through the active subscription.
    pub fn push(&self, notification: SourceNotification) {
        let tx = self
            .inner
            .lock()
            .delivery
            .clone()
            .expect("push before any subscription succeeded");
        tx.send(notification).expect("worker dropped the queue");
    }

    pub fn writes(&self) -> Vec<(String, Value)> {
        self.inner.lock().writes.clone()
    }

    pub fn subscription_attempts(&self) -> Vec<(String, SubscriptionKind)> {
        self.inner.lock().attempts.clone()
    }

    pub fn unsubscribed(&self) -> Vec<SubscriptionId> {
        self.inner.lock().unsubscribed.clone()
    }
}

#[async_trait]
impl PushSource for MockSource {
    async fn subscribe(
        &self,
        attribute: &str,
        kind: SubscriptionKind,
        tx: flume::Sender<SourceNotification>,
    ) -> Result<SubscriptionId, SourceError> {
        let mut inner = self.inner.lock();
        inner.attempts.push((attribute.to_owned(), kind));
        if !inner.accepted_kinds.contains(&kind) {
            return Err(SourceError::new(
                "API_EventNotSupported",
                format!("{kind} events not supported on {attribute}"),
            ));
        }
        inner.delivery = Some(tx);
        Ok(SubscriptionId::new())
    }

    async fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.lock().unsubscribed.push(id);
    }

    async fn write(&self, attribute: &str, value: Value) -> Result<(), SourceError> {
        let mut inner = self.inner.lock();
        if let Some(error) = inner.write_error.clone() {
            return Err(error);
        }
        inner.writes.push((attribute.to_owned(), value));
        Ok(())
    }

    async fn is_writable(&self, _attribute: &str) -> Result<bool, SourceError> {
        Ok(self.inner.lock().writable)
    }
}
