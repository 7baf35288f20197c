//! Device reconciler
//!
//! Keeps the Device Set in line with the ports the registry reports:
//! pairs new input/output ports into logical devices on connect passes and
//! drops devices whose ports vanished on disconnect passes.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use super::debounce::{sleep_until_deadline, Debouncer};
use super::guesser::DeviceTypeGuesser;
use super::naming::raw_name;
use super::profile::{merge_profile, DeviceProfile, Identity, ProfileStore};
use super::registry::PortRegistry;
use super::store::DeviceStore;
use super::types::{DeviceType, LogicalDevice, Port, PortEvent};

/// What a connect pass does with an output that has no matching input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedOutputPolicy {
    /// Skip the output and keep going
    #[default]
    Skip,
    /// Stop the whole pass at the first unmatched output (legacy behavior)
    AbortPass,
}

/// Timing and policy knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerSettings {
    /// Pause before probing a newly seen device
    pub settle_delay: Duration,
    /// Quiet period required before a pass runs
    pub debounce: Duration,
    /// Upper bound on a single guesser call
    pub guess_timeout: Duration,
    pub unmatched_output: UnmatchedOutputPolicy,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(50),
            debounce: Duration::from_millis(100),
            guess_timeout: Duration::from_millis(1000),
            unmatched_output: UnmatchedOutputPolicy::Skip,
        }
    }
}

pub struct Reconciler {
    registry: Arc<dyn PortRegistry>,
    guesser: Arc<dyn DeviceTypeGuesser>,
    profiles: Arc<dyn ProfileStore>,
    store: DeviceStore,
    settings: ReconcilerSettings,
}

impl Reconciler {
    pub fn new(
        registry: Arc<dyn PortRegistry>,
        guesser: Arc<dyn DeviceTypeGuesser>,
        profiles: Arc<dyn ProfileStore>,
        store: DeviceStore,
        settings: ReconcilerSettings,
    ) -> Self {
        Self {
            registry,
            guesser,
            profiles,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &ReconcilerSettings {
        &self.settings
    }

    /// Pair every new output with its input and publish each device as soon
    /// as it has been probed.
    pub async fn reconcile_connected(&self) {
        debug!("Checking for connected devices...");

        let Some((inputs, outputs)) = self.enumerate() else {
            return;
        };

        let profiles = match self.profiles.load().await {
            Ok(profiles) => profiles,
            Err(e) => {
                warn!("Failed to load device profiles, using none: {:#}", e);
                Vec::new()
            }
        };

        for output in &outputs {
            let device_raw_name = raw_name(&output.name);

            let Some(input) = inputs.iter().find(|input| raw_name(&input.name) == device_raw_name) else {
                match self.settings.unmatched_output {
                    UnmatchedOutputPolicy::Skip => {
                        debug!("No input paired with output '{}', skipping", output.name);
                        continue;
                    }
                    UnmatchedOutputPolicy::AbortPass => {
                        debug!("No input paired with output '{}', ending pass", output.name);
                        return;
                    }
                }
            };

            if self.store.contains(&device_raw_name) {
                trace!("'{}' already known", device_raw_name);
                continue;
            }

            // Give freshly plugged hardware time to boot before querying it
            tokio::time::sleep(self.settings.settle_delay).await;

            let guessed_type = self.guess(output, input).await;
            let device = self.build_device(device_raw_name, guessed_type, &profiles, input, output);

            info!(
                "Adding {} ({}) to the device set",
                device.name, device.device_type
            );
            self.store.push(device);
        }
    }

    /// Drop every device whose input or output is no longer enumerated.
    pub async fn reconcile_disconnected(&self) {
        debug!("Checking for disconnected devices...");

        let Some((inputs, outputs)) = self.enumerate() else {
            return;
        };

        let input_ids: HashSet<&str> = inputs.iter().map(|p| p.id.as_str()).collect();
        let output_ids: HashSet<&str> = outputs.iter().map(|p| p.id.as_str()).collect();

        let remaining: Vec<LogicalDevice> = self
            .store
            .devices()
            .into_iter()
            .filter(|device| {
                let still_connected =
                    input_ids.contains(device.input.id.as_str()) && output_ids.contains(device.output.id.as_str());

                if !still_connected {
                    info!("Removing {} from the device set", device.name);
                }
                still_connected
            })
            .collect();

        self.store.replace(remaining);
    }

    /// Debounce raw port events and run the matching pass once each burst settles.
    ///
    /// Passes run inline, so connect and disconnect passes never overlap;
    /// events arriving meanwhile queue up in the broadcast channel. When both
    /// classes are due at once the disconnect pass runs first.
    pub async fn run(self: Arc<Self>, mut events: broadcast::Receiver<PortEvent>, mut shutdown: watch::Receiver<bool>) {
        let mut connected = Debouncer::new(self.settings.debounce);
        let mut disconnected = Debouncer::new(self.settings.debounce);

        info!("Device reconciler started (debounce: {:?})", self.settings.debounce);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    debug!("Device reconciler stopping");
                    break;
                }
                event = events.recv() => match event {
                    Ok(PortEvent::Connected) => connected.trigger(Instant::now()),
                    Ok(PortEvent::Disconnected) => disconnected.trigger(Instant::now()),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Missed {} port events, rechecking everything", skipped);
                        connected.trigger(Instant::now());
                        disconnected.trigger(Instant::now());
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Port event channel closed");
                        break;
                    }
                },
                _ = sleep_until_deadline(connected.deadline()) => {
                    let now = Instant::now();
                    // A due disconnect pass goes first: a device replugged under
                    // new port ids must leave the set before it can be paired again
                    if disconnected.fire(now) {
                        self.reconcile_disconnected().await;
                    }
                    if connected.fire(now) {
                        self.reconcile_connected().await;
                    }
                }
                _ = sleep_until_deadline(disconnected.deadline()) => {
                    if disconnected.fire(Instant::now()) {
                        self.reconcile_disconnected().await;
                    }
                }
            }
        }
    }

    fn enumerate(&self) -> Option<(Vec<Port>, Vec<Port>)> {
        let inputs = self.registry.list_inputs();
        let outputs = self.registry.list_outputs();

        match (inputs, outputs) {
            (Ok(inputs), Ok(outputs)) => Some((inputs, outputs)),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Failed to enumerate MIDI ports: {}", e);
                None
            }
        }
    }

    /// Guesser failures and timeouts degrade to `Unknown`
    async fn guess(&self, output: &Port, input: &Port) -> DeviceType {
        match tokio::time::timeout(self.settings.guess_timeout, self.guesser.guess(output, input)).await {
            Ok(Ok(device_type)) => device_type,
            Ok(Err(e)) => {
                warn!("Could not guess type of '{}': {}", output.name, e);
                DeviceType::Unknown
            }
            Err(_) => {
                warn!(
                    "Guessing type of '{}' timed out after {:?}",
                    output.name, self.settings.guess_timeout
                );
                DeviceType::Unknown
            }
        }
    }

    fn build_device(
        &self,
        device_raw_name: String,
        guessed_type: DeviceType,
        profiles: &[DeviceProfile],
        input: &Port,
        output: &Port,
    ) -> LogicalDevice {
        let profile = profiles.iter().find(|p| p.raw_name == device_raw_name);
        if profile.is_some() {
            debug!("Found the profile for {}", device_raw_name);
        }

        let identity = merge_profile(
            profile,
            Identity {
                name: device_raw_name.clone(),
                device_type: guessed_type,
            },
        );

        LogicalDevice {
            raw_name: device_raw_name,
            name: identity.name,
            guessed_type,
            device_type: identity.device_type,
            input: input.clone(),
            output: output.clone(),
        }
    }
}
