//! Device type guessing through a SysEx identity probe

use async_trait::async_trait;
use crossbeam::channel;
use midir::{Ignore, MidiInput, MidiOutput};
use std::time::Duration;
use tracing::{debug, trace};

use super::error::DeviceError;
use super::types::{DeviceType, Port};
use crate::midi::{format_hex, IdentityReply, DEVICE_INQUIRY};

/// Infers the model of a controller from its port pair
#[async_trait]
pub trait DeviceTypeGuesser: Send + Sync {
    async fn guess(&self, output: &Port, input: &Port) -> Result<DeviceType, DeviceError>;
}

/// Sends a Universal Device Inquiry and decodes the Identity Reply
pub struct SysexGuesser {
    client_name: String,
    reply_timeout: Duration,
}

impl SysexGuesser {
    pub fn new(client_name: impl Into<String>, reply_timeout: Duration) -> Self {
        Self {
            client_name: client_name.into(),
            reply_timeout,
        }
    }
}

#[async_trait]
impl DeviceTypeGuesser for SysexGuesser {
    async fn guess(&self, output: &Port, input: &Port) -> Result<DeviceType, DeviceError> {
        let client_name = self.client_name.clone();
        let output = output.clone();
        let input = input.clone();
        let timeout = self.reply_timeout;

        // midir connections are not Send; the whole probe lives on one blocking thread
        let reply = tokio::task::spawn_blocking(move || probe_identity(&client_name, &output, &input, timeout))
            .await
            .map_err(|e| DeviceError::Probe(e.to_string()))??;

        let device_type = DeviceType::from_identity(&reply);
        debug!(
            "Identity reply family={:#06X} member={:#06X} -> {}",
            reply.family, reply.member, device_type
        );

        Ok(device_type)
    }
}

/// Blocking probe: open both ports, send the inquiry, wait for a reply
fn probe_identity(
    client_name: &str,
    output: &Port,
    input: &Port,
    timeout: Duration,
) -> Result<IdentityReply, DeviceError> {
    let mut midi_in =
        MidiInput::new(&format!("{}-probe-in", client_name)).map_err(|e| DeviceError::AccessDenied(e.to_string()))?;
    midi_in.ignore(Ignore::None);

    let in_port = midi_in
        .ports()
        .into_iter()
        .find(|p| p.id() == input.id)
        .ok_or_else(|| DeviceError::PortNotFound(input.name.clone()))?;

    let (reply_tx, reply_rx) = channel::bounded::<IdentityReply>(1);

    let _input_conn = midi_in
        .connect(
            &in_port,
            "lpadder-probe",
            move |_timestamp, data, _| {
                trace!("Probe RX: {}", format_hex(data));
                if let Some(reply) = IdentityReply::parse(data) {
                    let _ = reply_tx.try_send(reply);
                }
            },
            (),
        )
        .map_err(|e| DeviceError::Connection {
            port: input.name.clone(),
            message: e.to_string(),
        })?;

    let midi_out =
        MidiOutput::new(&format!("{}-probe-out", client_name)).map_err(|e| DeviceError::AccessDenied(e.to_string()))?;

    let out_port = midi_out
        .ports()
        .into_iter()
        .find(|p| p.id() == output.id)
        .ok_or_else(|| DeviceError::PortNotFound(output.name.clone()))?;

    let mut output_conn = midi_out
        .connect(&out_port, "lpadder-probe")
        .map_err(|e| DeviceError::Connection {
            port: output.name.clone(),
            message: e.to_string(),
        })?;

    trace!("Probe TX -> {}: {}", output.name, format_hex(&DEVICE_INQUIRY));
    output_conn.send(&DEVICE_INQUIRY).map_err(|e| DeviceError::Send {
        port: output.name.clone(),
        message: e.to_string(),
    })?;

    let reply = reply_rx
        .recv_timeout(timeout)
        .map_err(|_| DeviceError::Timeout(timeout));

    output_conn.close();
    reply
}
