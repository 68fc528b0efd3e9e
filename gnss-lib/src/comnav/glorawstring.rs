use crate::message::{take, Decode, Encode, Message, MessageId, ProtocolId};
use crate::nav::{glonass, NavData};
use crate::prelude::*;

#[cfg(feature = "serde")]
use serde::Serialize;

/// GLORAWSTRING, one raw GLONASS navigation string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct GloRawString {
    pub slot: u8,
    /// Frequency channel + 7.
    pub freq: u8,
    pub string: [u8; glonass::STRING_LEN],
    pub reserved: u8,
}

impl GloRawString {
    pub const ID: u16 = 722;
    pub const LEN: usize = 14;

    /// Frequency channel number, -7 to +6.
    #[must_use]
    pub fn channel(&self) -> i16 {
        i16::from(self.freq) - 7
    }

    /// Decode the embedded string.
    ///
    /// # Errors
    /// [Error::StructureMismatch] if the string number is not 1-15.
    pub fn nav_data(&self) -> Result<Box<dyn NavData>> {
        glonass::decode_string(&self.string)
    }
}

impl Decode for GloRawString {
    fn decode(&mut self, payload: &[u8]) -> Result<()> {
        let [slot, freq] = take::<2>(payload, 0)?;
        self.slot = slot;
        self.freq = freq;
        self.string = take(payload, 2)?;
        self.reserved = take::<1>(payload, 2 + glonass::STRING_LEN)?[0];
        Ok(())
    }
}

impl Encode for GloRawString {
    fn encoded_len(&self) -> usize {
        Self::LEN
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&[self.slot, self.freq]);
        out.extend_from_slice(&self.string);
        out.push(self.reserved);
        Ok(())
    }
}

impl Message for GloRawString {
    fn protocol(&self) -> ProtocolId {
        ProtocolId::ComNav
    }

    fn message_id(&self) -> MessageId {
        MessageId::Code(Self::ID)
    }

    fn name(&self) -> &'static str {
        "GLORAWSTRING"
    }
}
