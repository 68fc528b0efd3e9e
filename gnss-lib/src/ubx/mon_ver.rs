use super::{class, read_fixed_str, write_fixed_str};
use crate::message::{require_len, Decode, Encode, Message, MessageId, ProtocolId};
use crate::prelude::*;

#[cfg(feature = "serde")]
use serde::Serialize;

/// MON-VER receiver and software version.
///
/// Each field is a fixed width, NUL padded string cut at its first NUL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MonVer {
    pub sw_version: String,
    pub hw_version: String,
    /// Extended version strings, e.g., `PROTVER=18.00`.
    pub extensions: Vec<String>,
}

impl MonVer {
    pub const ID: u8 = 0x04;
    const SW_LEN: usize = 30;
    const HW_LEN: usize = 10;
    const EXT_LEN: usize = 30;
}

impl Decode for MonVer {
    fn decode(&mut self, payload: &[u8]) -> Result<()> {
        require_len(payload, Self::SW_LEN + Self::HW_LEN)?;
        let (sw, rest) = payload.split_at(Self::SW_LEN);
        let (hw, ext) = rest.split_at(Self::HW_LEN);
        if ext.len() % Self::EXT_LEN != 0 {
            return Err(Error::InvalidField {
                field: "length",
                value: payload.len().to_string(),
            });
        }
        self.sw_version = read_fixed_str(sw);
        self.hw_version = read_fixed_str(hw);
        self.extensions = ext.chunks(Self::EXT_LEN).map(read_fixed_str).collect();
        Ok(())
    }
}

impl Encode for MonVer {
    fn encoded_len(&self) -> usize {
        Self::SW_LEN + Self::HW_LEN + self.extensions.len() * Self::EXT_LEN
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        write_fixed_str(out, &self.sw_version, Self::SW_LEN);
        write_fixed_str(out, &self.hw_version, Self::HW_LEN);
        for ext in &self.extensions {
            write_fixed_str(out, ext, Self::EXT_LEN);
        }
        Ok(())
    }
}

impl Message for MonVer {
    fn protocol(&self) -> ProtocolId {
        ProtocolId::Ubx
    }

    fn message_id(&self) -> MessageId {
        MessageId::Pair {
            class: class::MON,
            id: Self::ID,
        }
    }

    fn name(&self) -> &'static str {
        "MON-VER"
    }
}
