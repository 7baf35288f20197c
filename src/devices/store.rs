//! Observable device state owned by the application root
//!
//! Holds the Device Set and the session status behind `watch` channels.
//! The reconciler is the only writer; every subscriber receives the full
//! replacement value on each publish.

use std::sync::Arc;
use tokio::sync::watch;

use super::types::{LogicalDevice, SessionStatus};

#[derive(Clone)]
pub struct DeviceStore {
    inner: Arc<Inner>,
}

struct Inner {
    devices: watch::Sender<Vec<LogicalDevice>>,
    status: watch::Sender<SessionStatus>,
}

impl DeviceStore {
    pub fn new() -> Self {
        let (devices, _) = watch::channel(Vec::new());
        let (status, _) = watch::channel(SessionStatus::default());

        Self {
            inner: Arc::new(Inner { devices, status }),
        }
    }

    /// Snapshot of the current Device Set
    pub fn devices(&self) -> Vec<LogicalDevice> {
        self.inner.devices.borrow().clone()
    }

    pub fn contains(&self, raw_name: &str) -> bool {
        self.inner.devices.borrow().iter().any(|d| d.raw_name == raw_name)
    }

    /// Append one device and publish
    pub(crate) fn push(&self, device: LogicalDevice) {
        self.inner.devices.send_modify(|devices| devices.push(device));
    }

    /// Replace the whole set and publish
    pub(crate) fn replace(&self, devices: Vec<LogicalDevice>) {
        self.inner.devices.send_replace(devices);
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<LogicalDevice>> {
        self.inner.devices.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        *self.inner.status.borrow()
    }

    pub(crate) fn set_status(&self, status: SessionStatus) {
        self.inner.status.send_replace(status);
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status.subscribe()
    }
}

impl Default for DeviceStore {
    fn default() -> Self {
        Self::new()
    }
}
