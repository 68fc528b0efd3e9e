//! RTCM 3 differential correction messages.
//!
//! Wire layout: `D3 <6 reserved bits><10-bit length> <payload> <CRC-24Q>`. The payload
//! is bit packed; its first 12 bits are the message type. The CRC covers the preamble,
//! header and payload and is stored big-endian.
mod msg1005;
mod msg1029;

use std::sync::OnceLock;

use crate::bits::read_unsigned;
use crate::framing::{Advance, DiscardReason, Frame, Grammar, ParserState};
use crate::integrity::crc24q;
use crate::message::{Encode, Message, MessageId, ProtocolId};
use crate::prelude::*;
use crate::registry::{new_message, Registry};

pub use msg1005::StationArp;
pub use msg1029::UnicodeText;

pub const PREAMBLE: u8 = 0xd3;
/// Preamble, reserved bits and length.
pub const HEADER_LEN: usize = 3;
pub const CRC_LEN: usize = 3;
/// Largest payload the 10-bit length can express.
pub const MAX_PAYLOAD: usize = 1023;

/// Framing rules for RTCM 3.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rtcm3;

impl Rtcm3 {
    fn payload_len(buf: &[u8]) -> usize {
        usize::from(buf[1] & 0x03) << 8 | usize::from(buf[2])
    }
}

impl Grammar for Rtcm3 {
    fn protocol(&self) -> ProtocolId {
        ProtocolId::Rtcm3
    }

    fn is_start(&self, byte: u8) -> bool {
        byte == PREAMBLE
    }

    fn advance(&self, buf: &[u8]) -> Advance {
        let len = buf.len();
        match len {
            0 | 1 => return Advance::Need(ParserState::SeekingSync),
            // reserved bits must be zero, otherwise the preamble was a data byte
            2 if buf[1] & 0xfc != 0 => return Advance::Mismatch,
            2 => return Advance::Need(ParserState::AccumulatingLength),
            _ => {}
        }
        let payload_len = Self::payload_len(buf);
        if payload_len < 2 {
            return Advance::Reject(DiscardReason::Malformed("payload too short for message type"));
        }
        let payload_end = HEADER_LEN + payload_len;
        if len < payload_end {
            return Advance::Need(ParserState::AccumulatingBody);
        }
        if len < payload_end + CRC_LEN {
            return Advance::Need(ParserState::AwaitingChecksum);
        }
        let computed = crc24q(&buf[..payload_end]);
        let expected = u32::from_be_bytes([0, buf[payload_end], buf[payload_end + 1], buf[payload_end + 2]]);
        if computed != expected {
            return Advance::Reject(DiscardReason::ChecksumMismatch { expected, computed });
        }
        let Ok((message_type, _)) = read_unsigned(&buf[HEADER_LEN..payload_end], 0, 12) else {
            return Advance::Reject(DiscardReason::Malformed("payload too short for message type"));
        };
        Advance::Complete {
            message_id: MessageId::Code(message_type as u16),
            payload: HEADER_LEN..payload_end,
            len,
            valid: true,
        }
    }

    fn frame_len(&self, buf: &[u8]) -> Option<usize> {
        if buf.len() < HEADER_LEN {
            return None;
        }
        Some(HEADER_LEN + Self::payload_len(buf) + CRC_LEN)
    }
}

/// Shared registry of the supported RTCM 3 messages.
///
/// # Panics
/// If the built-in message table contains a duplicate, which is a programming error.
pub fn registry() -> &'static Registry<dyn Message> {
    static REGISTRY: OnceLock<Registry<dyn Message>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        Registry::<dyn Message>::new()
            .with(MessageId::Code(1005), "1005", msg1005::new_1005)
            .and_then(|r| r.with(MessageId::Code(1006), "1006", msg1005::new_1006))
            .and_then(|r| r.with(MessageId::Code(UnicodeText::TYPE), "1029", new_message::<UnicodeText>))
            .expect("built-in RTCM registry is not valid")
    })
}

/// Decode a synchronized RTCM 3 frame into its registered message type.
///
/// # Errors
/// [Error::WrongProtocol] for a non-RTCM frame, [Error::UnknownMessageId] if the type
/// is not registered, or any payload decode error.
pub fn decode(frame: &Frame) -> Result<Box<dyn Message>> {
    if frame.protocol != ProtocolId::Rtcm3 {
        return Err(Error::WrongProtocol {
            expected: ProtocolId::Rtcm3,
            actual: frame.protocol,
        });
    }
    registry().decode(&frame.message_id, frame.payload())
}

/// Encode `msg` as a complete RTCM 3 frame.
///
/// # Errors
/// [Error::WrongProtocol] if `msg` is not an RTCM 3 message, or [Error::InvalidField]
/// if its payload does not fit the 10-bit length.
pub fn serialize(msg: &dyn Message) -> Result<Vec<u8>> {
    if msg.protocol() != ProtocolId::Rtcm3 {
        return Err(Error::WrongProtocol {
            expected: ProtocolId::Rtcm3,
            actual: msg.protocol(),
        });
    }
    let mut out = Vec::with_capacity(HEADER_LEN + msg.encoded_len() + CRC_LEN);
    out.extend_from_slice(&[PREAMBLE, 0, 0]);
    msg.encode(&mut out)?;
    let payload_len = out.len() - HEADER_LEN;
    if payload_len > MAX_PAYLOAD {
        return Err(Error::InvalidField {
            field: "length",
            value: payload_len.to_string(),
        });
    }
    out[1] = (payload_len >> 8) as u8;
    out[2] = (payload_len & 0xff) as u8;
    let crc = crc24q(&out);
    out.extend_from_slice(&crc.to_be_bytes()[1..]);
    Ok(out)
}
