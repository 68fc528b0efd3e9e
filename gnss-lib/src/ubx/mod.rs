//! u-blox UBX binary protocol.
//!
//! Wire layout: `B5 62 <class> <id> <u16 LE length> <payload> <CK_A> <CK_B>`, where the
//! checksum is the running-sum pair over class through payload.
mod ack;
mod inf;
mod mon_ver;
mod nav_posllh;
mod rxm_sfrbx;

use std::sync::OnceLock;

use crate::framing::{Advance, DiscardReason, Frame, Grammar, ParserState};
use crate::integrity::running_sum;
use crate::message::{Encode, Message, MessageId, ProtocolId};
use crate::prelude::*;
use crate::registry::{new_message, Registry};

pub use ack::Ack;
pub use inf::{Inf, InfLevel};
pub use mon_ver::MonVer;
pub use nav_posllh::NavPosllh;
pub use rxm_sfrbx::RxmSfrbx;

pub const SYNC: [u8; 2] = [0xb5, 0x62];
/// Sync, class, id and length.
pub const HEADER_LEN: usize = 6;
pub const CHECKSUM_LEN: usize = 2;

pub mod class {
    pub const NAV: u8 = 0x01;
    pub const RXM: u8 = 0x02;
    pub const INF: u8 = 0x04;
    pub const ACK: u8 = 0x05;
    pub const MON: u8 = 0x0a;
}

/// Framing rules for UBX.
///
/// The minimum payload length is zero: empty payloads are poll requests and frame as
/// header plus checksum.
#[derive(Debug, Clone)]
pub struct Ubx {
    /// Frames declaring a longer payload are discarded.
    pub max_payload: usize,
}

impl Default for Ubx {
    fn default() -> Self {
        Ubx { max_payload: 8192 }
    }
}

impl Grammar for Ubx {
    fn protocol(&self) -> ProtocolId {
        ProtocolId::Ubx
    }

    fn is_start(&self, byte: u8) -> bool {
        byte == SYNC[0]
    }

    fn advance(&self, buf: &[u8]) -> Advance {
        let len = buf.len();
        match len {
            0 | 1 => return Advance::Need(ParserState::SeekingSync),
            2 if buf[1] != SYNC[1] => return Advance::Mismatch,
            2..=5 => return Advance::Need(ParserState::AccumulatingLength),
            _ => {}
        }
        let payload_len = usize::from(u16::from_le_bytes([buf[4], buf[5]]));
        if payload_len > self.max_payload {
            return Advance::Reject(DiscardReason::Malformed("payload length exceeds maximum"));
        }
        let payload_end = HEADER_LEN + payload_len;
        if len < payload_end {
            return Advance::Need(ParserState::AccumulatingBody);
        }
        if len < payload_end + CHECKSUM_LEN {
            return Advance::Need(ParserState::AwaitingChecksum);
        }
        let (ck_a, ck_b) = running_sum(&buf[2..payload_end]);
        let computed = u32::from(u16::from_be_bytes([ck_a, ck_b]));
        let expected = u32::from(u16::from_be_bytes([buf[payload_end], buf[payload_end + 1]]));
        if computed != expected {
            return Advance::Reject(DiscardReason::ChecksumMismatch { expected, computed });
        }
        Advance::Complete {
            message_id: MessageId::Pair {
                class: buf[2],
                id: buf[3],
            },
            payload: HEADER_LEN..payload_end,
            len,
            valid: true,
        }
    }

    fn frame_len(&self, buf: &[u8]) -> Option<usize> {
        if buf.len() < HEADER_LEN {
            return None;
        }
        Some(HEADER_LEN + usize::from(u16::from_le_bytes([buf[4], buf[5]])) + CHECKSUM_LEN)
    }
}

/// Shared registry of the supported UBX messages.
///
/// # Panics
/// If the built-in message table contains a duplicate, which is a programming error.
pub fn registry() -> &'static Registry<dyn Message> {
    static REGISTRY: OnceLock<Registry<dyn Message>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let entries: [(u8, u8, &'static str, fn() -> Box<dyn Message>); 10] = [
            (class::ACK, Ack::ID_ACK, "ACK-ACK", ack::new_ack),
            (class::ACK, Ack::ID_NAK, "ACK-NAK", ack::new_nak),
            (class::INF, InfLevel::Error as u8, "INF-ERROR", inf::new_inf::<0>),
            (class::INF, InfLevel::Warning as u8, "INF-WARNING", inf::new_inf::<1>),
            (class::INF, InfLevel::Notice as u8, "INF-NOTICE", inf::new_inf::<2>),
            (class::INF, InfLevel::Test as u8, "INF-TEST", inf::new_inf::<3>),
            (class::INF, InfLevel::Debug as u8, "INF-DEBUG", inf::new_inf::<4>),
            (class::MON, MonVer::ID, "MON-VER", new_message::<MonVer>),
            (class::NAV, NavPosllh::ID, "NAV-POSLLH", new_message::<NavPosllh>),
            (class::RXM, RxmSfrbx::ID, "RXM-SFRBX", new_message::<RxmSfrbx>),
        ];
        let mut reg = Registry::new();
        for (class, id, name, factory) in entries {
            reg.register(MessageId::Pair { class, id }, name, factory)
                .expect("built-in UBX registry is not valid");
        }
        reg
    })
}

/// Decode a synchronized UBX frame into its registered message type.
///
/// # Errors
/// [Error::WrongProtocol] for a non-UBX frame, [Error::UnknownMessageId] if the message
/// is not registered, or any payload decode error.
pub fn decode(frame: &Frame) -> Result<Box<dyn Message>> {
    if frame.protocol != ProtocolId::Ubx {
        return Err(Error::WrongProtocol {
            expected: ProtocolId::Ubx,
            actual: frame.protocol,
        });
    }
    registry().decode(&frame.message_id, frame.payload())
}

/// Encode `msg` as a complete UBX frame.
///
/// # Errors
/// [Error::WrongProtocol] if `msg` is not a UBX message, or [Error::InvalidField] if
/// its payload does not fit the 16-bit length field.
pub fn serialize(msg: &dyn Message) -> Result<Vec<u8>> {
    let MessageId::Pair { class, id } = msg.message_id() else {
        return Err(Error::WrongProtocol {
            expected: ProtocolId::Ubx,
            actual: msg.protocol(),
        });
    };
    if msg.protocol() != ProtocolId::Ubx {
        return Err(Error::WrongProtocol {
            expected: ProtocolId::Ubx,
            actual: msg.protocol(),
        });
    }
    let mut out = Vec::with_capacity(HEADER_LEN + msg.encoded_len() + CHECKSUM_LEN);
    out.extend_from_slice(&SYNC);
    out.extend_from_slice(&[class, id, 0, 0]);
    msg.encode(&mut out)?;
    let payload_len = u16::try_from(out.len() - HEADER_LEN).map_err(|_| Error::InvalidField {
        field: "length",
        value: (out.len() - HEADER_LEN).to_string(),
    })?;
    out[4..6].copy_from_slice(&payload_len.to_le_bytes());
    let (ck_a, ck_b) = running_sum(&out[2..]);
    out.extend_from_slice(&[ck_a, ck_b]);
    Ok(out)
}

/// Fixed width, NUL padded string field.
pub(crate) fn read_fixed_str(dat: &[u8]) -> String {
    let end = dat.iter().position(|b| *b == 0).unwrap_or(dat.len());
    String::from_utf8_lossy(&dat[..end]).into_owned()
}

/// Write `value` NUL padded to `width`, truncating if longer.
pub(crate) fn write_fixed_str(out: &mut Vec<u8>, value: &str, width: usize) {
    let bytes = value.as_bytes();
    let n = bytes.len().min(width);
    out.extend_from_slice(&bytes[..n]);
    out.resize(out.len() + width - n, 0);
}
