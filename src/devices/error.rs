//! Error types for the device layer

use std::time::Duration;
use thiserror::Error;

/// Failures raised by MIDI access, port enumeration and probing
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("MIDI access denied: {0}")]
    AccessDenied(String),

    #[error("Failed to enumerate MIDI ports: {0}")]
    Enumeration(String),

    #[error("Port '{0}' not found")]
    PortNotFound(String),

    #[error("Failed to connect to port '{port}': {message}")]
    Connection { port: String, message: String },

    #[error("Failed to send SysEx to '{port}': {message}")]
    Send { port: String, message: String },

    #[error("No identity reply within {0:?}")]
    Timeout(Duration),

    #[error("Probe task failed: {0}")]
    Probe(String),
}
