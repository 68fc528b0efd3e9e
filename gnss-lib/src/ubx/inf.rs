use super::class;
use crate::message::{trim_trailing_nul, Decode, Encode, Message, MessageId, ProtocolId};
use crate::prelude::*;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Severity of an informational message; the value is the UBX message id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[repr(u8)]
pub enum InfLevel {
    Error = 0x00,
    Warning = 0x01,
    #[default]
    Notice = 0x02,
    Test = 0x03,
    Debug = 0x04,
}

impl InfLevel {
    #[must_use]
    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0x00 => InfLevel::Error,
            0x01 => InfLevel::Warning,
            0x02 => InfLevel::Notice,
            0x03 => InfLevel::Test,
            0x04 => InfLevel::Debug,
            _ => return None,
        })
    }
}

/// INF-ERROR, INF-WARNING, INF-NOTICE, INF-TEST or INF-DEBUG text.
///
/// Trailing NUL bytes are trimmed on decode; interior NULs are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Inf {
    pub level: InfLevel,
    pub text: String,
}

pub(super) fn new_inf<const ID: u8>() -> Box<dyn Message> {
    Box::new(Inf {
        level: InfLevel::from_id(ID).unwrap_or_default(),
        text: String::new(),
    })
}

impl Decode for Inf {
    fn decode(&mut self, payload: &[u8]) -> Result<()> {
        self.text = String::from_utf8_lossy(trim_trailing_nul(payload)).into_owned();
        Ok(())
    }
}

impl Encode for Inf {
    fn encoded_len(&self) -> usize {
        self.text.len()
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(self.text.as_bytes());
        Ok(())
    }
}

impl Message for Inf {
    fn protocol(&self) -> ProtocolId {
        ProtocolId::Ubx
    }

    fn message_id(&self) -> MessageId {
        MessageId::Pair {
            class: class::INF,
            id: self.level as u8,
        }
    }

    fn name(&self) -> &'static str {
        match self.level {
            InfLevel::Error => "INF-ERROR",
            InfLevel::Warning => "INF-WARNING",
            InfLevel::Notice => "INF-NOTICE",
            InfLevel::Test => "INF-TEST",
            InfLevel::Debug => "INF-DEBUG",
        }
    }
}
