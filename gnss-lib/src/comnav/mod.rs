//! ComNav binary protocol, the OEM style `AA 44 12` framing.
//!
//! Wire layout: a 28 byte header (sync, header length, message id, message length,
//! receiver time and status), the payload, then a CRC-32 over header and payload stored
//! little-endian.
mod bestpos;
mod glorawstring;
mod rawgpssubframe;

use std::sync::OnceLock;

use crate::framing::{Advance, DiscardReason, Frame, Grammar, ParserState};
use crate::integrity::crc32;
use crate::message::{require_len, take, Encode, Message, MessageId, ProtocolId};
use crate::prelude::*;
use crate::registry::{new_message, Registry};

pub use bestpos::BestPos;
pub use glorawstring::GloRawString;
pub use rawgpssubframe::RawGpsSubframe;

#[cfg(feature = "serde")]
use serde::Serialize;

pub const SYNC: [u8; 3] = [0xaa, 0x44, 0x12];
pub const CRC_LEN: usize = 4;

/// Framing rules for ComNav binary messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComNav;

impl ComNav {
    /// Bytes needed to read the message length.
    const LENGTH_END: usize = 10;
}

impl Grammar for ComNav {
    fn protocol(&self) -> ProtocolId {
        ProtocolId::ComNav
    }

    fn is_start(&self, byte: u8) -> bool {
        byte == SYNC[0]
    }

    fn advance(&self, buf: &[u8]) -> Advance {
        let len = buf.len();
        if len <= SYNC.len() {
            if buf[len - 1] != SYNC[len - 1] {
                return Advance::Mismatch;
            }
            return Advance::Need(ParserState::SeekingSync);
        }
        let header_len = usize::from(buf[3]);
        if header_len < Header::LEN {
            return Advance::Reject(DiscardReason::Malformed("header length below minimum"));
        }
        if len < Self::LENGTH_END {
            return Advance::Need(ParserState::AccumulatingLength);
        }
        let payload_end = header_len + usize::from(u16::from_le_bytes([buf[8], buf[9]]));
        if len < payload_end {
            return Advance::Need(ParserState::AccumulatingBody);
        }
        if len < payload_end + CRC_LEN {
            return Advance::Need(ParserState::AwaitingChecksum);
        }
        let computed = crc32(&buf[..payload_end]);
        let expected = u32::from_le_bytes([
            buf[payload_end],
            buf[payload_end + 1],
            buf[payload_end + 2],
            buf[payload_end + 3],
        ]);
        if computed != expected {
            return Advance::Reject(DiscardReason::ChecksumMismatch { expected, computed });
        }
        Advance::Complete {
            message_id: MessageId::Code(u16::from_le_bytes([buf[4], buf[5]])),
            payload: header_len..payload_end,
            len,
            valid: true,
        }
    }

    fn frame_len(&self, buf: &[u8]) -> Option<usize> {
        if buf.len() < Self::LENGTH_END {
            return None;
        }
        Some(usize::from(buf[3]) + usize::from(u16::from_le_bytes([buf[8], buf[9]])) + CRC_LEN)
    }
}

/// Standard message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Header {
    /// Header length as sent. Encoding always writes [Header::LEN].
    pub header_len: u8,
    pub message_id: u16,
    /// Format and response bits.
    pub message_type: u8,
    pub port_address: u8,
    /// Payload length as sent. Encoding writes the encoded payload length.
    pub message_len: u16,
    pub sequence: u16,
    pub idle_time: u8,
    pub time_status: u8,
    pub week: u16,
    /// GPS time of week, ms.
    pub ms: u32,
    pub receiver_status: u32,
    pub reserved: u16,
    pub sw_version: u16,
}

impl Default for Header {
    fn default() -> Self {
        Header {
            header_len: Header::LEN as u8,
            message_id: 0,
            message_type: 0,
            port_address: 0,
            message_len: 0,
            sequence: 0,
            idle_time: 0,
            time_status: 0,
            week: 0,
            ms: 0,
            receiver_status: 0,
            reserved: 0,
            sw_version: 0,
        }
    }
}

impl Header {
    pub const LEN: usize = 28;

    /// Decode the header at the start of `dat`, which includes the sync bytes.
    ///
    /// # Errors
    /// [Error::TruncatedInput] if `dat` is shorter than a header,
    /// [Error::StructureMismatch] if the sync bytes are wrong.
    pub fn decode(dat: &[u8]) -> Result<Self> {
        require_len(dat, Self::LEN)?;
        if dat[..SYNC.len()] != SYNC {
            return Err(Error::StructureMismatch(format!(
                "bad sync {:02x?}",
                &dat[..SYNC.len()]
            )));
        }
        Ok(Header {
            header_len: dat[3],
            message_id: u16::from_le_bytes(take(dat, 4)?),
            message_type: dat[6],
            port_address: dat[7],
            message_len: u16::from_le_bytes(take(dat, 8)?),
            sequence: u16::from_le_bytes(take(dat, 10)?),
            idle_time: dat[12],
            time_status: dat[13],
            week: u16::from_le_bytes(take(dat, 14)?),
            ms: u32::from_le_bytes(take(dat, 16)?),
            receiver_status: u32::from_le_bytes(take(dat, 20)?),
            reserved: u16::from_le_bytes(take(dat, 24)?),
            sw_version: u16::from_le_bytes(take(dat, 26)?),
        })
    }

    fn encode(&self, message_id: u16, message_len: u16, out: &mut Vec<u8>) {
        out.extend_from_slice(&SYNC);
        out.push(Self::LEN as u8);
        out.extend_from_slice(&message_id.to_le_bytes());
        out.extend_from_slice(&[self.message_type, self.port_address]);
        out.extend_from_slice(&message_len.to_le_bytes());
        out.extend_from_slice(&self.sequence.to_le_bytes());
        out.extend_from_slice(&[self.idle_time, self.time_status]);
        out.extend_from_slice(&self.week.to_le_bytes());
        out.extend_from_slice(&self.ms.to_le_bytes());
        out.extend_from_slice(&self.receiver_status.to_le_bytes());
        out.extend_from_slice(&self.reserved.to_le_bytes());
        out.extend_from_slice(&self.sw_version.to_le_bytes());
    }
}

/// Shared registry of the supported ComNav messages.
///
/// # Panics
/// If the built-in message table contains a duplicate, which is a programming error.
pub fn registry() -> &'static Registry<dyn Message> {
    static REGISTRY: OnceLock<Registry<dyn Message>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        Registry::<dyn Message>::new()
            .with(MessageId::Code(BestPos::ID), "BESTPOS", new_message::<BestPos>)
            .and_then(|r| {
                r.with(
                    MessageId::Code(RawGpsSubframe::ID),
                    "RAWGPSSUBFRAME",
                    new_message::<RawGpsSubframe>,
                )
            })
            .and_then(|r| {
                r.with(
                    MessageId::Code(GloRawString::ID),
                    "GLORAWSTRING",
                    new_message::<GloRawString>,
                )
            })
            .expect("built-in ComNav registry is not valid")
    })
}

/// Decode a synchronized ComNav frame into its header and registered message type.
///
/// # Errors
/// [Error::WrongProtocol] for a non-ComNav frame, [Error::UnknownMessageId] if the
/// message is not registered, or any header or payload decode error.
pub fn decode(frame: &Frame) -> Result<(Header, Box<dyn Message>)> {
    if frame.protocol != ProtocolId::ComNav {
        return Err(Error::WrongProtocol {
            expected: ProtocolId::ComNav,
            actual: frame.protocol,
        });
    }
    let header = Header::decode(&frame.data)?;
    let msg = registry().decode(&frame.message_id, frame.payload())?;
    Ok((header, msg))
}

/// Encode `msg` with `header` as a complete ComNav frame.
///
/// The header's message id, length and header length fields are derived from `msg`.
///
/// # Errors
/// [Error::WrongProtocol] if `msg` is not a ComNav message, or [Error::InvalidField] if
/// its payload does not fit the 16-bit length.
pub fn serialize(header: &Header, msg: &dyn Message) -> Result<Vec<u8>> {
    let (ProtocolId::ComNav, MessageId::Code(message_id)) = (msg.protocol(), msg.message_id()) else {
        return Err(Error::WrongProtocol {
            expected: ProtocolId::ComNav,
            actual: msg.protocol(),
        });
    };
    let mut payload = Vec::with_capacity(msg.encoded_len());
    msg.encode(&mut payload)?;
    let message_len = u16::try_from(payload.len()).map_err(|_| Error::InvalidField {
        field: "length",
        value: payload.len().to_string(),
    })?;

    let mut out = Vec::with_capacity(Header::LEN + payload.len() + CRC_LEN);
    header.encode(message_id, message_len, &mut out);
    out.extend_from_slice(&payload);
    let crc = crc32(&out);
    out.extend_from_slice(&crc.to_le_bytes());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::{decode_one, Synchronizer};

    fn bestpos_frame() -> Vec<u8> {
        let header = Header {
            sequence: 3,
            week: 2300,
            ms: 345_600_000,
            ..Header::default()
        };
        let msg = BestPos {
            lat: 31.2,
            lon: 121.5,
            hgt: 12.25,
            num_svs: 18,
            ..BestPos::default()
        };
        serialize(&header, &msg).unwrap()
    }

    #[test]
    fn frame_layout() {
        let dat = bestpos_frame();
        assert_eq!(&dat[..4], &[0xaa, 0x44, 0x12, 28]);
        assert_eq!(u16::from_le_bytes([dat[4], dat[5]]), 42);
        assert_eq!(u16::from_le_bytes([dat[8], dat[9]]), 72);
        assert_eq!(dat.len(), 28 + 72 + 4);

        let (body, trailer) = dat.split_at(dat.len() - 4);
        assert_eq!(crc32(body).to_le_bytes(), trailer);
    }

    #[test]
    fn decode_round_trip() {
        let dat = bestpos_frame();
        let frame = decode_one(ComNav, &dat).unwrap();
        assert_eq!(frame.message_id, MessageId::Code(42));
        assert_eq!(frame.payload().len(), 72);

        let (header, msg) = decode(&frame).unwrap();
        assert_eq!(header.week, 2300);
        assert_eq!(header.message_len, 72);
        let pos = msg.downcast_ref::<BestPos>().unwrap();
        assert_eq!(pos.num_svs, 18);
        assert_eq!(serialize(&header, msg.as_ref()).unwrap(), dat);
    }

    #[test]
    fn short_header_length_is_discarded() {
        let mut dat = bestpos_frame();
        dat[3] = 20;
        assert!(matches!(
            ComNav.advance(&dat[..4]),
            Advance::Reject(DiscardReason::Malformed(_))
        ));
    }

    #[test]
    fn partial_sync_is_silent() {
        let mut dat = vec![0xaa, 0x44, 0x00, 0xaa];
        dat.extend(bestpos_frame());
        let mut sync = Synchronizer::new(ComNav);
        let events = sync.feed_chunk(&dat);
        assert_eq!(events.len(), 1);
        assert!(events[0].clone().into_frame().is_some());
    }

    #[test]
    fn crc_mismatch() {
        let mut dat = bestpos_frame();
        dat[40] ^= 0x01;
        assert!(matches!(
            decode_one(ComNav, &dat),
            Err(Error::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn header_sync_checked() {
        let mut dat = bestpos_frame();
        dat[1] = 0x45;
        assert!(matches!(
            Header::decode(&dat),
            Err(Error::StructureMismatch(_))
        ));
        assert!(matches!(
            Header::decode(&dat[..27]),
            Err(Error::TruncatedInput { .. })
        ));
    }
}
