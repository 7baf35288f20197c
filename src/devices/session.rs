//! MIDI session enablement
//!
//! Acquires MIDI access once, captures already-connected hardware and wires
//! the debounced reconciler to the registry's events. A refused request is
//! final for the session.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::guesser::DeviceTypeGuesser;
use super::profile::ProfileStore;
use super::reconciler::{Reconciler, ReconcilerSettings};
use super::registry::MidiAccess;
use super::store::DeviceStore;
use super::types::SessionStatus;

pub struct MidiSession {
    store: DeviceStore,
    guesser: Arc<dyn DeviceTypeGuesser>,
    profiles: Arc<dyn ProfileStore>,
    settings: ReconcilerSettings,
    sysex: bool,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MidiSession {
    pub fn new(
        store: DeviceStore,
        guesser: Arc<dyn DeviceTypeGuesser>,
        profiles: Arc<dyn ProfileStore>,
        settings: ReconcilerSettings,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            store,
            guesser,
            profiles,
            settings,
            sysex: true,
            shutdown_tx,
            task: Mutex::new(None),
        }
    }

    /// Whether SysEx permission is requested with MIDI access
    pub fn with_sysex(mut self, sysex: bool) -> Self {
        self.sysex = sysex;
        self
    }

    pub fn store(&self) -> &DeviceStore {
        &self.store
    }

    /// Enable MIDI (with SysEx unless disabled) and start tracking devices.
    ///
    /// Returns `false` when access is refused; MIDI features should then stay
    /// disabled for the rest of the session.
    pub async fn enable_and_setup(&self, access: &dyn MidiAccess) -> bool {
        let registry = match access.request(self.sysex).await {
            Ok(registry) => registry,
            Err(e) => {
                error!("MIDI unavailable: {}", e);
                self.store.set_status(SessionStatus {
                    is_enabled: false,
                    was_requested: true,
                });
                return false;
            }
        };

        info!("MIDI successfully enabled");

        // Subscribe before the first pass so no event is lost
        let events = registry.subscribe();
        let reconciler = Arc::new(Reconciler::new(
            registry,
            self.guesser.clone(),
            self.profiles.clone(),
            self.store.clone(),
            self.settings,
        ));
        let shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            // Pick up hardware that was already plugged in
            reconciler.reconcile_connected().await;
            reconciler.run(events, shutdown_rx).await;
        });

        if let Some(previous) = self.task.lock().replace(handle) {
            previous.abort();
        }

        self.store.set_status(SessionStatus {
            is_enabled: true,
            was_requested: true,
        });
        true
    }

    /// Stop reconciling; the Device Set keeps its last value
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);

        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!("Device reconciler task failed: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::testing::{FakeAccess, FakeGuesser, FakeRegistry, MemoryProfiles};
    use crate::devices::types::{DeviceType, Port};

    fn make_session() -> MidiSession {
        MidiSession::new(
            DeviceStore::new(),
            FakeGuesser::answering(DeviceType::LaunchpadX),
            Arc::new(MemoryProfiles(Vec::new())),
            ReconcilerSettings::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_captures_connected_hardware() {
        let registry = FakeRegistry::with_ports(vec![Port::input("1", "Pad IN")], vec![Port::output("2", "Pad OUT")]);
        let session = make_session();
        let mut devices_rx = session.store().subscribe();

        let enabled = session
            .enable_and_setup(&FakeAccess {
                registry: Some(registry),
            })
            .await;

        assert!(enabled);
        assert_eq!(
            session.store().status(),
            SessionStatus {
                is_enabled: true,
                was_requested: true
            }
        );

        devices_rx.changed().await.unwrap();
        assert_eq!(devices_rx.borrow_and_update()[0].raw_name, "Pad");

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_access_denied_disables_midi() {
        let session = make_session();

        let enabled = session.enable_and_setup(&FakeAccess { registry: None }).await;

        assert!(!enabled);
        assert_eq!(
            session.store().status(),
            SessionStatus {
                is_enabled: false,
                was_requested: true
            }
        );
        assert!(session.store().devices().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_listeners_follow_hot_plug() {
        let registry = FakeRegistry::new();
        let session = make_session();

        assert!(
            session
                .enable_and_setup(&FakeAccess {
                    registry: Some(registry.clone()),
                })
                .await
        );

        let mut devices_rx = session.store().subscribe();
        registry.plug(Port::input("1", "Pad IN"));
        registry.plug(Port::output("2", "Pad OUT"));

        devices_rx.changed().await.unwrap();
        assert_eq!(devices_rx.borrow_and_update().len(), 1);

        session.shutdown().await;
    }
}
