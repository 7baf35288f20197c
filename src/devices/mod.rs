//! Launchpad detection and pairing
//!
//! Ports reported by the [`PortRegistry`] are paired into [`LogicalDevice`]s
//! by the [`Reconciler`], typed by a [`DeviceTypeGuesser`], renamed or
//! retyped by user [`DeviceProfile`]s, and published through the
//! [`DeviceStore`]. [`MidiSession`] ties it all together at startup.

pub mod debounce;
pub mod error;
pub mod guesser;
pub mod naming;
pub mod profile;
pub mod reconciler;
pub mod registry;
pub mod session;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use error::DeviceError;
pub use guesser::{DeviceTypeGuesser, SysexGuesser};
pub use naming::raw_name;
pub use profile::{merge_profile, DeviceProfile, Identity, JsonProfileStore, ProfileStore};
pub use reconciler::{Reconciler, ReconcilerSettings, UnmatchedOutputPolicy};
pub use registry::{MidiAccess, MidirAccess, MidirPortRegistry, PortRegistry};
pub use session::MidiSession;
pub use store::DeviceStore;
pub use types::{DeviceType, LogicalDevice, Port, PortDirection, PortEvent, SessionStatus};
