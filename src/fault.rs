//! Device-fault reporting handle.
//!
//! The engine never owns the device state machine; it only reports fatal
//! conditions. The hosting device server holds a [`FaultHandle`], maps a set
//! fault to its FAULT state and exposes the message as its status string.

use parking_lot::Mutex;
use std::sync::Arc;

/// Shared handle recording a device-wide fatal condition.
///
/// Clones share the same slot. The first message wins; later faults are
/// appended to the status so none are lost.
#[derive(Clone, Default)]
pub struct FaultHandle {
    status: Arc<Mutex<Option<String>>>,
}

impl FaultHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fatal condition. The device stays faulted until it is
    /// reinitialized with a fresh handle.
    pub fn set_fault(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(status = %message, "device fault");
        let mut slot = self.status.lock();
        match slot.as_mut() {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(&message);
            }
            None => *slot = Some(message),
        }
    }

    pub fn is_fault(&self) -> bool {
        self.status.lock().is_some()
    }

    /// The accumulated status text, if any fault was recorded.
    pub fn status(&self) -> Option<String> {
        self.status.lock().clone()
    }
}
