//! Message identifiers and the capability traits shared by every decodable message.
use std::any::Any;
use std::fmt::{self, Debug, Display};

use crate::prelude::*;

#[cfg(feature = "serde")]
use serde::{Serialize, Serializer};

/// The wire protocol a frame or message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ProtocolId {
    /// NMEA 0183 sentences.
    Nmea,
    /// u-blox UBX binary.
    Ubx,
    /// RTCM version 3.
    Rtcm3,
    /// ComNav/OEM binary with a CRC-32 trailer.
    ComNav,
}

impl ProtocolId {
    pub const ALL: [ProtocolId; 4] = [
        ProtocolId::Nmea,
        ProtocolId::Ubx,
        ProtocolId::Rtcm3,
        ProtocolId::ComNav,
    ];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolId::Nmea => "NMEA",
            ProtocolId::Ubx => "UBX",
            ProtocolId::Rtcm3 => "RTCM3",
            ProtocolId::ComNav => "ComNav",
        }
    }
}

impl Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A 3 to 5 character ASCII message code, e.g., the `GGA` in `$GPGGA`.
///
/// Codes are stored upper-cased so equality and hashing ignore case.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AsciiCode {
    bytes: [u8; 5],
    len: u8,
}

impl AsciiCode {
    pub const MIN_LEN: usize = 3;
    pub const MAX_LEN: usize = 5;

    /// Create from `code`, or `None` if it is not 3 to 5 ASCII alphanumerics.
    #[must_use]
    pub fn new(code: &str) -> Option<Self> {
        Self::from_bytes(code.as_bytes())
    }

    /// Create from raw bytes, or `None` if they are not 3 to 5 ASCII alphanumerics.
    #[must_use]
    pub fn from_bytes(dat: &[u8]) -> Option<Self> {
        if !(Self::MIN_LEN..=Self::MAX_LEN).contains(&dat.len())
            || !dat.iter().all(u8::is_ascii_alphanumeric)
        {
            return None;
        }
        let mut bytes = [0u8; 5];
        for (dst, src) in bytes.iter_mut().zip(dat) {
            *dst = src.to_ascii_uppercase();
        }
        Some(AsciiCode {
            bytes,
            len: dat.len() as u8,
        })
    }

    /// Compile time constructor for the built-in message tables.
    ///
    /// # Panics
    /// If `code` is not 3 to 5 upper-case ASCII alphanumerics.
    #[must_use]
    pub const fn from_static(code: &'static str) -> Self {
        let dat = code.as_bytes();
        assert!(dat.len() >= Self::MIN_LEN && dat.len() <= Self::MAX_LEN);
        let mut bytes = [0u8; 5];
        let mut i = 0;
        while i < dat.len() {
            assert!(dat[i].is_ascii_uppercase() || dat[i].is_ascii_digit());
            bytes[i] = dat[i];
            i += 1;
        }
        AsciiCode {
            bytes,
            len: dat.len() as u8,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        // only ever constructed from ASCII alphanumerics
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }

    /// Proprietary codes start with `P` followed by a manufacturer code.
    #[must_use]
    pub fn is_proprietary(&self) -> bool {
        self.bytes[0].eq_ignore_ascii_case(&b'P') && self.len >= 4
    }
}

impl Debug for AsciiCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AsciiCode({:?})", self.as_str())
    }
}

impl Display for AsciiCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl Serialize for AsciiCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Protocol specific message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum MessageId {
    /// ASCII code, e.g., NMEA formatter `GGA`.
    Ascii(AsciiCode),
    /// Class and id byte pair, e.g., UBX `0x05 0x01`.
    Pair { class: u8, id: u8 },
    /// Numeric type code, e.g., RTCM `1005`.
    Code(u16),
}

impl Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Ascii(code) => write!(f, "{code}"),
            MessageId::Pair { class, id } => write!(f, "{class:#04x}-{id:#04x}"),
            MessageId::Code(code) => write!(f, "{code}"),
        }
    }
}

impl From<AsciiCode> for MessageId {
    fn from(code: AsciiCode) -> Self {
        MessageId::Ascii(code)
    }
}

/// Fill a default constructed value from its encoded payload bytes.
pub trait Decode {
    /// # Errors
    /// [Error::TruncatedInput] if `payload` is too short, or another decode error if
    /// the contents are not valid for the type.
    fn decode(&mut self, payload: &[u8]) -> Result<()>;
}

/// Encode a value into its payload bytes, i.e., without framing or checksum.
pub trait Encode {
    /// Number of payload bytes [Encode::encode] will append.
    fn encoded_len(&self) -> usize;

    /// Append the encoded payload to `out`.
    ///
    /// # Errors
    /// If a field cannot be represented in its wire encoding.
    fn encode(&self, out: &mut Vec<u8>) -> Result<()>;
}

/// Upcast to [Any] so trait objects can be downcast to their concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A decodable and encodable top-level protocol message.
pub trait Message: Decode + Encode + AsAny + Debug + Send + Sync {
    fn protocol(&self) -> ProtocolId;
    fn message_id(&self) -> MessageId;
    /// Short display name, e.g., `GGA` or `NAV-POSLLH`.
    fn name(&self) -> &'static str;
}

impl dyn Message {
    /// Borrow as the concrete message type `T`, if that is what this is.
    #[must_use]
    pub fn downcast_ref<T: Message>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    #[must_use]
    pub fn downcast_mut<T: Message>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Borrow as `T` or fail with [Error::InvalidField] naming the actual message.
    ///
    /// # Errors
    /// If this is not a `T`.
    pub fn expect_type<T: Message>(&self) -> Result<&T> {
        let name = self.name();
        self.downcast_ref::<T>().ok_or_else(|| Error::InvalidField {
            field: "message",
            value: name.to_string(),
        })
    }
}

/// Read `N` bytes starting at `offset`, failing with [Error::TruncatedInput] when short.
pub(crate) fn take<const N: usize>(dat: &[u8], offset: usize) -> Result<[u8; N]> {
    dat.get(offset..offset + N)
        .and_then(|s| s.try_into().ok())
        .ok_or(Error::TruncatedInput {
            actual: dat.len(),
            minimum: offset + N,
        })
}

/// Fail with [Error::TruncatedInput] unless `dat` has at least `minimum` bytes.
pub(crate) fn require_len(dat: &[u8], minimum: usize) -> Result<()> {
    if dat.len() < minimum {
        return Err(Error::TruncatedInput {
            actual: dat.len(),
            minimum,
        });
    }
    Ok(())
}

/// Drop every trailing NUL byte and nothing else.
pub(crate) fn trim_trailing_nul(dat: &[u8]) -> &[u8] {
    let end = dat.iter().rposition(|b| *b != 0).map_or(0, |p| p + 1);
    &dat[..end]
}
