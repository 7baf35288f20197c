//! lpadder device host
//!
//! Detects launchpads, pairs their MIDI ports into logical devices and keeps
//! the local store of cover projects.

pub mod config;
pub mod devices;
pub mod midi;
pub mod palette;
pub mod paths;
pub mod projects;
