//! In-memory registry, guesser and profile store for tests

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use super::error::DeviceError;
use super::guesser::DeviceTypeGuesser;
use super::profile::{DeviceProfile, ProfileStore};
use super::registry::{MidiAccess, PortRegistry};
use super::types::{DeviceType, Port, PortEvent};

pub struct FakeRegistry {
    inputs: Mutex<Vec<Port>>,
    outputs: Mutex<Vec<Port>>,
    events_tx: broadcast::Sender<PortEvent>,
    list_output_calls: AtomicUsize,
}

impl FakeRegistry {
    pub fn new() -> Arc<Self> {
        let (events_tx, _) = broadcast::channel(64);
        Arc::new(Self {
            inputs: Mutex::new(Vec::new()),
            outputs: Mutex::new(Vec::new()),
            events_tx,
            list_output_calls: AtomicUsize::new(0),
        })
    }

    pub fn with_ports(inputs: Vec<Port>, outputs: Vec<Port>) -> Arc<Self> {
        let registry = Self::new();
        *registry.inputs.lock() = inputs;
        *registry.outputs.lock() = outputs;
        registry
    }

    /// Plug a port in and announce it
    pub fn plug(&self, port: Port) {
        match port.direction {
            super::types::PortDirection::Input => self.inputs.lock().push(port),
            super::types::PortDirection::Output => self.outputs.lock().push(port),
        }
        let _ = self.events_tx.send(PortEvent::Connected);
    }

    /// Remove a port by id and announce it
    pub fn unplug(&self, id: &str) {
        self.inputs.lock().retain(|p| p.id != id);
        self.outputs.lock().retain(|p| p.id != id);
        let _ = self.events_tx.send(PortEvent::Disconnected);
    }

    pub fn emit(&self, event: PortEvent) {
        let _ = self.events_tx.send(event);
    }

    /// Number of enumerations so far; each pass enumerates outputs once
    pub fn passes(&self) -> usize {
        self.list_output_calls.load(Ordering::SeqCst)
    }
}

impl PortRegistry for FakeRegistry {
    fn list_inputs(&self) -> Result<Vec<Port>, DeviceError> {
        Ok(self.inputs.lock().clone())
    }

    fn list_outputs(&self) -> Result<Vec<Port>, DeviceError> {
        self.list_output_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.outputs.lock().clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<PortEvent> {
        self.events_tx.subscribe()
    }
}

pub enum GuessBehavior {
    Answer(DeviceType),
    Fail,
    Hang,
}

pub struct FakeGuesser {
    behavior: GuessBehavior,
    calls: AtomicUsize,
}

impl FakeGuesser {
    pub fn answering(device_type: DeviceType) -> Arc<Self> {
        Self::with_behavior(GuessBehavior::Answer(device_type))
    }

    pub fn with_behavior(behavior: GuessBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceTypeGuesser for FakeGuesser {
    async fn guess(&self, _output: &Port, _input: &Port) -> Result<DeviceType, DeviceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            GuessBehavior::Answer(device_type) => Ok(device_type),
            GuessBehavior::Fail => Err(DeviceError::Timeout(Duration::from_millis(1))),
            GuessBehavior::Hang => {
                std::future::pending::<()>().await;
                Ok(DeviceType::Unknown)
            }
        }
    }
}

pub struct MemoryProfiles(pub Vec<DeviceProfile>);

#[async_trait]
impl ProfileStore for MemoryProfiles {
    async fn load(&self) -> Result<Vec<DeviceProfile>> {
        Ok(self.0.clone())
    }
}

pub struct FailingProfiles;

#[async_trait]
impl ProfileStore for FailingProfiles {
    async fn load(&self) -> Result<Vec<DeviceProfile>> {
        anyhow::bail!("profile storage unavailable")
    }
}

/// Access that hands out a prepared registry, or refuses
pub struct FakeAccess {
    pub registry: Option<Arc<FakeRegistry>>,
}

#[async_trait]
impl MidiAccess for FakeAccess {
    async fn request(&self, _sysex: bool) -> Result<Arc<dyn PortRegistry>, DeviceError> {
        match &self.registry {
            Some(registry) => Ok(registry.clone() as Arc<dyn PortRegistry>),
            None => Err(DeviceError::AccessDenied("not supported".to_string())),
        }
    }
}
