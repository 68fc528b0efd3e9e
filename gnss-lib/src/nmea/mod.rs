//! NMEA 0183 sentences.
//!
//! Wire layout: `<$ or !><address>,<fields>*<2 hex digit XOR checksum><CR><LF>`. The
//! frame payload is the address and fields, i.e., everything between the start marker
//! and the `*`.
mod fields;
mod gbs;
mod gga;
mod gll;

use std::sync::OnceLock;

use crate::framing::{Advance, DiscardReason, Frame, Grammar, ParserState};
use crate::integrity::{xor_checksum, xor_checksum_hex};
use crate::message::{AsciiCode, Encode, Message, MessageId, ProtocolId};
use crate::prelude::*;
use crate::registry::{new_message, Registry};

pub use fields::Talker;
pub use gbs::Gbs;
pub use gga::Gga;
pub use gll::Gll;

/// Framing rules for NMEA 0183 sentences.
///
/// A sentence completes on the second checksum digit, so a final sentence without a
/// line ending is not lost. A sentence without a checksum completes at its line ending
/// and is emitted with [Frame::is_valid] unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nmea;

impl Nmea {
    pub const CHECKSUM_DELIM: u8 = b'*';
    /// Longest accepted sentence, marker through checksum. NMEA 0183 allows 82 bytes
    /// including the line ending; receivers with proprietary sentences exceed that.
    pub const MAX_LEN: usize = 256;

    fn is_marker(byte: u8) -> bool {
        byte == b'$' || byte == b'!'
    }

    fn complete(buf: &[u8], payload_end: usize, len: usize, valid: bool) -> Advance {
        match message_id(&buf[1..payload_end]) {
            Some(message_id) => Advance::Complete {
                message_id,
                payload: 1..payload_end,
                len,
                valid,
            },
            None => Advance::Reject(DiscardReason::Malformed("invalid address field")),
        }
    }
}

impl Grammar for Nmea {
    fn protocol(&self) -> ProtocolId {
        ProtocolId::Nmea
    }

    fn is_start(&self, byte: u8) -> bool {
        Self::is_marker(byte)
    }

    fn is_filler(&self, byte: u8) -> bool {
        byte.is_ascii_whitespace()
    }

    fn advance(&self, buf: &[u8]) -> Advance {
        let len = buf.len();
        if len == 1 {
            return Advance::Need(ParserState::AccumulatingBody);
        }
        if len > Self::MAX_LEN {
            return Advance::Reject(DiscardReason::Malformed("sentence too long"));
        }
        let byte = buf[len - 1];

        // a sentence completes or is rejected on the second digit after `*`
        if len >= 3 && buf[len - 2] == Self::CHECKSUM_DELIM {
            if !byte.is_ascii_hexdigit() {
                return Advance::Reject(DiscardReason::Malformed("invalid checksum digit"));
            }
            return Advance::Need(ParserState::AwaitingChecksum);
        }
        if len >= 4 && buf[len - 3] == Self::CHECKSUM_DELIM {
            let star = len - 3;
            let expected = match std::str::from_utf8(&buf[star + 1..])
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok())
            {
                Some(v) => v,
                None => return Advance::Reject(DiscardReason::Malformed("invalid checksum digit")),
            };
            let computed = xor_checksum(&buf[1..star]);
            if computed != expected {
                return Advance::Reject(DiscardReason::ChecksumMismatch {
                    expected: expected.into(),
                    computed: computed.into(),
                });
            }
            return Self::complete(buf, star, len, true);
        }

        match byte {
            Self::CHECKSUM_DELIM => Advance::Need(ParserState::AwaitingChecksum),
            b'\r' | b'\n' => {
                if len == 2 {
                    Advance::Reject(DiscardReason::Malformed("empty sentence"))
                } else {
                    Self::complete(buf, len - 1, len - 1, false)
                }
            }
            b if Self::is_marker(b) => {
                Advance::Reject(DiscardReason::Malformed("unexpected start marker"))
            }
            b if !(0x20..=0x7e).contains(&b) => {
                Advance::Reject(DiscardReason::Malformed("non-printable byte"))
            }
            _ => Advance::Need(ParserState::AccumulatingBody),
        }
    }
}

/// Message identifier for a sentence payload (address plus fields).
///
/// Standard addresses are a 2 character talker plus a 3 character formatter and the
/// formatter is the identifier. Proprietary addresses start with `P` and are identified
/// by their first 5 characters.
#[must_use]
pub fn message_id(payload: &[u8]) -> Option<MessageId> {
    let end = payload
        .iter()
        .position(|b| *b == b',')
        .unwrap_or(payload.len());
    let address = &payload[..end];
    let code = if address.first().is_some_and(|b| b.eq_ignore_ascii_case(&b'P')) {
        AsciiCode::from_bytes(&address[..address.len().min(AsciiCode::MAX_LEN)])?
    } else if address.len() == 5 {
        AsciiCode::from_bytes(&address[2..])?
    } else {
        return None;
    };
    Some(MessageId::Ascii(code))
}

/// Shared registry of the supported sentences.
///
/// # Panics
/// If the built-in sentence table contains a duplicate, which is a programming error.
pub fn registry() -> &'static Registry<dyn Message> {
    static REGISTRY: OnceLock<Registry<dyn Message>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut reg: Registry<dyn Message> = Registry::new();
        reg.register(Gbs::CODE.into(), "GBS", new_message::<Gbs>)
            .expect("built-in NMEA registry is not valid");
        reg.register(Gga::CODE.into(), "GGA", new_message::<Gga>)
            .expect("built-in NMEA registry is not valid");
        reg.register(Gll::CODE.into(), "GLL", new_message::<Gll>)
            .expect("built-in NMEA registry is not valid");
        reg
    })
}

/// Decode a synchronized NMEA frame into its registered sentence type.
///
/// # Errors
/// [Error::WrongProtocol] for a non-NMEA frame, [Error::UnknownMessageId] if the
/// sentence is not registered, or any field decode error.
pub fn decode(frame: &Frame) -> Result<Box<dyn Message>> {
    if frame.protocol != ProtocolId::Nmea {
        return Err(Error::WrongProtocol {
            expected: ProtocolId::Nmea,
            actual: frame.protocol,
        });
    }
    registry().decode(&frame.message_id, frame.payload())
}

/// Encode `msg` as a complete sentence with a freshly computed checksum and CRLF.
///
/// # Errors
/// [Error::WrongProtocol] if `msg` is not an NMEA sentence.
pub fn serialize(msg: &dyn Message) -> Result<Vec<u8>> {
    if msg.protocol() != ProtocolId::Nmea {
        return Err(Error::WrongProtocol {
            expected: ProtocolId::Nmea,
            actual: msg.protocol(),
        });
    }
    let mut out = Vec::with_capacity(msg.encoded_len() + 6);
    out.push(b'$');
    msg.encode(&mut out)?;
    let sum = xor_checksum(&out[1..]);
    out.push(Nmea::CHECKSUM_DELIM);
    out.extend_from_slice(&xor_checksum_hex(sum));
    out.extend_from_slice(b"\r\n");
    Ok(out)
}
