//! Port and device types shared across the device layer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::midi::IdentityReply;

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

/// A physical MIDI endpoint as enumerated by the port registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Port {
    /// Stable for as long as the hardware stays connected
    pub id: String,
    pub name: String,
    pub direction: PortDirection,
}

impl Port {
    pub fn input(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            direction: PortDirection::Input,
        }
    }

    pub fn output(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            direction: PortDirection::Output,
        }
    }
}

/// Raw port-level notification from the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortEvent {
    Connected,
    Disconnected,
}

/// Known controller models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    LaunchpadMk2,
    LaunchpadProMk2,
    LaunchpadX,
    LaunchpadMiniMk3,
    LaunchpadProMk3,
    Unknown,
}

impl DeviceType {
    pub const ALL: [DeviceType; 6] = [
        DeviceType::LaunchpadMk2,
        DeviceType::LaunchpadProMk2,
        DeviceType::LaunchpadX,
        DeviceType::LaunchpadMiniMk3,
        DeviceType::LaunchpadProMk3,
        DeviceType::Unknown,
    ];

    /// Stable identifier, as stored in device profiles
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::LaunchpadMk2 => "launchpad_mk2",
            DeviceType::LaunchpadProMk2 => "launchpad_pro_mk2",
            DeviceType::LaunchpadX => "launchpad_x",
            DeviceType::LaunchpadMiniMk3 => "launchpad_mini_mk3",
            DeviceType::LaunchpadProMk3 => "launchpad_pro_mk3",
            DeviceType::Unknown => "unknown",
        }
    }

    /// Map an Identity Reply to a model using Novation family codes.
    ///
    /// Bootloader family codes are not recognized; a device in bootloader
    /// mode is reported as `Unknown`.
    pub fn from_identity(reply: &IdentityReply) -> Self {
        if !reply.is_novation() {
            return DeviceType::Unknown;
        }

        match reply.family {
            0x0069 => DeviceType::LaunchpadMk2,
            0x0051 => DeviceType::LaunchpadProMk2,
            0x0103 => DeviceType::LaunchpadX,
            0x0113 => DeviceType::LaunchpadMiniMk3,
            0x0123 => DeviceType::LaunchpadProMk3,
            _ => DeviceType::Unknown,
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        DeviceType::ALL
            .iter()
            .find(|t| t.as_str() == normalized)
            .copied()
            .ok_or_else(|| format!("unknown device type '{}'", s))
    }
}

/// An input and an output port believed to be the same physical controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalDevice {
    /// Port name with the IN/OUT markers stripped; pairing and profile key
    pub raw_name: String,
    /// Display name, `raw_name` unless a profile overrides it
    pub name: String,
    /// What the guesser reported when the device was paired
    pub guessed_type: DeviceType,
    /// Effective type, profile override first
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub input: Port,
    pub output: Port,
}

/// Session status exposed for gating MIDI features
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub is_enabled: bool,
    pub was_requested: bool,
}
