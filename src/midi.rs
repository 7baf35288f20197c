//! MIDI SysEx helpers
//!
//! Universal Device Inquiry encoding and Identity Reply parsing, used to
//! recognize which controller sits behind a pair of ports.

/// Universal Device Inquiry, broadcast to every device id (0x7F)
pub const DEVICE_INQUIRY: [u8; 6] = [0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7];

/// Novation's three-byte manufacturer id
pub const NOVATION_ID: [u8; 3] = [0x00, 0x20, 0x29];

/// Parsed Identity Reply (`F0 7E <dev> 06 02 <manufacturer> <family> <member> <version> F7`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityReply {
    /// Device id the controller answered with
    pub device_id: u8,
    /// Manufacturer id, one byte or three bytes when the first is 0x00
    pub manufacturer: Vec<u8>,
    /// Family code (LSB first on the wire)
    pub family: u16,
    /// Family member code (LSB first on the wire)
    pub member: u16,
    /// Firmware revision bytes
    pub version: [u8; 4],
}

impl IdentityReply {
    /// Parse an Identity Reply from raw bytes
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 6 || data[0] != 0xF0 || data[1] != 0x7E {
            return None;
        }
        if data[3] != 0x06 || data[4] != 0x02 {
            return None;
        }

        let device_id = data[2];
        let body = &data[5..];

        // Extended manufacturer ids start with 0x00 and span three bytes
        let manufacturer_len = if body.first() == Some(&0x00) { 3 } else { 1 };
        // manufacturer + family (2) + member (2) + version (4)
        if body.len() < manufacturer_len + 8 {
            return None;
        }

        let manufacturer = body[..manufacturer_len].to_vec();
        let rest = &body[manufacturer_len..];

        let family = (rest[0] & 0x7F) as u16 | (((rest[1] & 0x7F) as u16) << 8);
        let member = (rest[2] & 0x7F) as u16 | (((rest[3] & 0x7F) as u16) << 8);
        let version = [rest[4], rest[5], rest[6], rest[7]];

        Some(Self {
            device_id,
            manufacturer,
            family,
            member,
            version,
        })
    }

    /// Check if the reply comes from a Novation device
    pub fn is_novation(&self) -> bool {
        self.manufacturer == NOVATION_ID
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
