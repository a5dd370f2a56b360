//! RAK811 AT framing used by the judge remote.
//!
//! The modem reports every received LoRa packet as one text line:
//!
//! ```text
//! at+recv=<port>,<rssi>,<len>,<hex payload>
//! ```
//!
//! The payload is the remote's ASCII message, e.g. `ID8888888888888888COM1P36END`.
//! The character after the first `M` selects the command, and counter events
//! carry their value from a fixed offset up to the next `E`.

use crate::domain::model::{JudgeCommand, RawChunk};
use crate::utils::error::{BoardError, Result};

/// First byte of every modem response line we care about.
pub const FRAME_PREFIX: u8 = b'a';

/// Chunks of this length or shorter are never frames.
pub const MIN_FRAME_LEN: usize = 3;

pub const PAYLOAD_SEPARATOR: u8 = b',';

/// The hex payload starts after this many separators.
pub const PAYLOAD_SEPARATOR_COUNT: usize = 3;

/// Marks the start of the command tail inside the decoded payload.
pub const COMMAND_MARKER: char = 'M';

/// Counter digits start at this character offset of the decoded payload.
pub const COUNTER_OFFSET: usize = 23;

pub const COUNTER_TERMINATOR: char = 'E';

/// Appended to every command written to the modem.
pub const MODEM_TRAILER: &[u8; 3] = b"P\r\n";

pub const MODE_COMMAND: &str = "at+mode=1";
pub const RF_CONFIG_COMMAND: &str = "at+rf_config=";
pub const RX_ENABLE_COMMAND: &str = "at+rxc=1";

/// Decode one chunk read from the link.
///
/// `Ok(None)` means the chunk is not a judge frame, or carries a command we
/// do not act on. `Err` means it looked like a frame but the payload was
/// garbled.
pub fn decode_chunk(chunk: &RawChunk) -> Result<Option<JudgeCommand>> {
    let bytes = chunk.as_bytes().trim_ascii();
    if bytes.len() <= MIN_FRAME_LEN || bytes[0] != FRAME_PREFIX {
        return Ok(None);
    }

    let start = payload_start(bytes).ok_or_else(|| {
        BoardError::frame(format!(
            "expected {} '{}' separators before the payload",
            PAYLOAD_SEPARATOR_COUNT, PAYLOAD_SEPARATOR as char
        ))
    })?;

    let raw = hex::decode(&bytes[start..])?;
    let payload = String::from_utf8(raw)
        .map_err(|e| BoardError::frame(format!("payload is not valid UTF-8: {}", e)))?;

    tracing::debug!("📡 Received message: {}", payload);
    decode_payload(&payload)
}

/// Interpret an already hex-decoded payload.
pub fn decode_payload(payload: &str) -> Result<Option<JudgeCommand>> {
    let Some(marker) = payload.find(COMMAND_MARKER) else {
        return Ok(None);
    };
    let tail = &payload[marker + COMMAND_MARKER.len_utf8()..];

    let command = match tail.chars().next() {
        Some('1') | Some('2') => Some(JudgeCommand::SetAbsolute(counter_value(payload)?)),
        Some('3') => Some(JudgeCommand::StartTimer),
        Some('4') => Some(JudgeCommand::Commit),
        _ => None,
    };
    Ok(command)
}

fn payload_start(bytes: &[u8]) -> Option<usize> {
    bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == PAYLOAD_SEPARATOR)
        .nth(PAYLOAD_SEPARATOR_COUNT - 1)
        .map(|(i, _)| i + 1)
}

fn counter_value(payload: &str) -> Result<u32> {
    let digits: String = payload
        .chars()
        .skip(COUNTER_OFFSET)
        .take_while(|c| *c != COUNTER_TERMINATOR)
        .collect();

    digits
        .parse()
        .map_err(|_| BoardError::frame(format!("invalid counter value '{}'", digits)))
}

/// Hex form of a payload, as the modem reports it.
pub fn encode_payload(payload: &str) -> String {
    hex::encode_upper(payload.as_bytes())
}

/// Build the line the modem prints when it receives `payload`.
pub fn encode_frame(payload: &str) -> String {
    format!("at+recv=0,0,{},{}", payload.len(), encode_payload(payload))
}

/// Bytes to write to the modem for one AT command.
pub fn modem_command(command: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(command.len() + MODEM_TRAILER.len());
    bytes.extend_from_slice(command.as_bytes());
    bytes.extend_from_slice(MODEM_TRAILER);
    bytes
}
