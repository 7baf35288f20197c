//! Port registry: enumeration of MIDI ports and hot-plug notifications
//!
//! midir offers no hot-plug callbacks, so [`MidirPortRegistry`] polls the
//! port lists and emits one [`PortEvent`] per port that appeared or vanished.

use async_trait::async_trait;
use midir::{MidiInput, MidiOutput};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::error::DeviceError;
use super::types::{Port, PortEvent};

/// Source of truth for which ports currently exist
pub trait PortRegistry: Send + Sync {
    fn list_inputs(&self) -> Result<Vec<Port>, DeviceError>;

    fn list_outputs(&self) -> Result<Vec<Port>, DeviceError>;

    /// Raw connect/disconnect notifications, one per port
    fn subscribe(&self) -> broadcast::Receiver<PortEvent>;
}

/// Acquires MIDI system access and hands out a registry
#[async_trait]
pub trait MidiAccess: Send + Sync {
    /// Request access, with or without SysEx permission
    async fn request(&self, sysex: bool) -> Result<Arc<dyn PortRegistry>, DeviceError>;
}

/// Registry backed by the platform MIDI API through midir
pub struct MidirPortRegistry {
    client_name: String,
    events_tx: broadcast::Sender<PortEvent>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl MidirPortRegistry {
    /// Create a registry, failing if the MIDI backend is unavailable
    pub fn new(client_name: impl Into<String>) -> Result<Self, DeviceError> {
        let client_name = client_name.into();

        // Probe both directions once so an unusable backend fails here
        MidiInput::new(&client_name).map_err(|e| DeviceError::AccessDenied(e.to_string()))?;
        MidiOutput::new(&client_name).map_err(|e| DeviceError::AccessDenied(e.to_string()))?;

        let (events_tx, _) = broadcast::channel(64);

        Ok(Self {
            client_name,
            events_tx,
            poll_task: Mutex::new(None),
        })
    }

    /// Start the hot-plug polling task
    pub fn start_polling(self: &Arc<Self>, interval: Duration) {
        // The task must not keep the registry alive
        let weak = Arc::downgrade(self);
        let (mut known_inputs, mut known_outputs) =
            (self.input_ids().unwrap_or_default(), self.output_ids().unwrap_or_default());

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            info!("Port polling started (interval: {:?})", interval);

            loop {
                ticker.tick().await;

                let Some(registry) = weak.upgrade() else {
                    debug!("Port registry dropped, polling stopped");
                    break;
                };

                let (inputs, outputs) = match (registry.input_ids(), registry.output_ids()) {
                    (Ok(inputs), Ok(outputs)) => (inputs, outputs),
                    (Err(e), _) | (_, Err(e)) => {
                        warn!("Port polling failed: {}", e);
                        continue;
                    }
                };

                let events = tick_events(
                    diff_ids(&known_inputs, &inputs),
                    diff_ids(&known_outputs, &outputs),
                );
                if !events.is_empty() {
                    debug!("Ports changed: {} port events", events.len());
                }
                for event in events {
                    registry.emit(event);
                }

                known_inputs = inputs;
                known_outputs = outputs;
            }
        });

        if let Some(previous) = self.poll_task.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Stop the polling task
    pub fn stop_polling(&self) {
        if let Some(handle) = self.poll_task.lock().take() {
            handle.abort();
        }
    }

    fn emit(&self, event: PortEvent) {
        trace!("Port event: {:?}", event);
        // No subscribers is fine
        let _ = self.events_tx.send(event);
    }

    fn input_ids(&self) -> Result<HashSet<String>, DeviceError> {
        Ok(self.list_inputs()?.into_iter().map(|p| p.id).collect())
    }

    fn output_ids(&self) -> Result<HashSet<String>, DeviceError> {
        Ok(self.list_outputs()?.into_iter().map(|p| p.id).collect())
    }
}

impl Drop for MidirPortRegistry {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

impl PortRegistry for MidirPortRegistry {
    fn list_inputs(&self) -> Result<Vec<Port>, DeviceError> {
        let midi_in = MidiInput::new(&format!("{}-scan", self.client_name))
            .map_err(|e| DeviceError::Enumeration(e.to_string()))?;

        let mut ports = Vec::new();
        for port in midi_in.ports() {
            if let Ok(name) = midi_in.port_name(&port) {
                ports.push(Port::input(port.id(), name));
            }
        }

        Ok(ports)
    }

    fn list_outputs(&self) -> Result<Vec<Port>, DeviceError> {
        let midi_out = MidiOutput::new(&format!("{}-scan", self.client_name))
            .map_err(|e| DeviceError::Enumeration(e.to_string()))?;

        let mut ports = Vec::new();
        for port in midi_out.ports() {
            if let Ok(name) = midi_out.port_name(&port) {
                ports.push(Port::output(port.id(), name));
            }
        }

        Ok(ports)
    }

    fn subscribe(&self) -> broadcast::Receiver<PortEvent> {
        self.events_tx.subscribe()
    }
}

/// Count ids that appeared in `current` and ids missing from it
fn diff_ids(previous: &HashSet<String>, current: &HashSet<String>) -> (usize, usize) {
    let added = current.difference(previous).count();
    let removed = previous.difference(current).count();
    (added, removed)
}

/// Events for one poll tick from the `(added, removed)` counts of inputs and
/// outputs. Removals come first so a port replugged under a new id is seen
/// gone before it is seen back.
fn tick_events(inputs: (usize, usize), outputs: (usize, usize)) -> Vec<PortEvent> {
    let (added, removed) = (inputs.0 + outputs.0, inputs.1 + outputs.1);

    std::iter::repeat(PortEvent::Disconnected)
        .take(removed)
        .chain(std::iter::repeat(PortEvent::Connected).take(added))
        .collect()
}

/// midir-backed access: builds a polling [`MidirPortRegistry`]
pub struct MidirAccess {
    client_name: String,
    poll_interval: Duration,
}

impl MidirAccess {
    pub fn new(client_name: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            client_name: client_name.into(),
            poll_interval,
        }
    }
}

#[async_trait]
impl MidiAccess for MidirAccess {
    async fn request(&self, sysex: bool) -> Result<Arc<dyn PortRegistry>, DeviceError> {
        // midir always delivers SysEx; the probe connections opt in explicitly
        debug!("Requesting MIDI access (sysex: {})", sysex);

        let registry = Arc::new(MidirPortRegistry::new(self.client_name.clone())?);
        registry.start_polling(self.poll_interval);

        Ok(registry)
    }
}
