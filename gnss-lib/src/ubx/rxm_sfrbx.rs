use super::class;
use crate::message::{require_len, Decode, Encode, Message, MessageId, ProtocolId};
use crate::nav::{glonass, gps, NavData};
use crate::prelude::*;

#[cfg(feature = "serde")]
use serde::Serialize;

/// RXM-SFRBX broadcast navigation data words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RxmSfrbx {
    pub gnss_id: u8,
    pub sv_id: u8,
    /// Signal id for message version 2, reserved in version 1.
    pub sig_id: u8,
    /// GLONASS frequency slot + 7.
    pub freq_id: u8,
    pub chn: u8,
    pub version: u8,
    pub reserved: u8,
    pub words: Vec<u32>,
}

impl RxmSfrbx {
    pub const ID: u8 = 0x13;
    pub const GNSS_GPS: u8 = 0;
    pub const GNSS_GLONASS: u8 = 6;
    const HEADER_LEN: usize = 8;

    /// GPS LNAV subframe with parity bits removed.
    ///
    /// # Errors
    /// [Error::StructureMismatch] if this is not GPS data, [Error::TruncatedInput] if
    /// there are fewer than 10 words.
    pub fn gps_subframe(&self) -> Result<[u8; gps::SUBFRAME_LEN]> {
        self.expect_gnss(Self::GNSS_GPS)?;
        gps::pack_words(&self.words)
    }

    /// GLONASS string, 85 bits MSB first in 11 bytes.
    ///
    /// # Errors
    /// [Error::StructureMismatch] if this is not GLONASS data, [Error::TruncatedInput] if
    /// there are fewer than 3 words.
    pub fn glonass_string(&self) -> Result<[u8; glonass::STRING_LEN]> {
        self.expect_gnss(Self::GNSS_GLONASS)?;
        let bytes: Vec<u8> = self.words.iter().flat_map(|w| w.to_be_bytes()).collect();
        require_len(&bytes, glonass::STRING_LEN)?;
        let mut out = [0u8; glonass::STRING_LEN];
        out.copy_from_slice(&bytes[..glonass::STRING_LEN]);
        Ok(out)
    }

    /// Decode the embedded navigation unit.
    ///
    /// # Errors
    /// [Error::StructureMismatch] for constellations without a navigation decoder or
    /// words that fail preamble or id checks.
    pub fn nav_data(&self) -> Result<Box<dyn NavData>> {
        match self.gnss_id {
            Self::GNSS_GPS => gps::decode_subframe(&self.gps_subframe()?),
            Self::GNSS_GLONASS => glonass::decode_string(&self.glonass_string()?),
            other => Err(Error::StructureMismatch(format!(
                "no navigation decoder for gnss id {other}"
            ))),
        }
    }

    fn expect_gnss(&self, gnss_id: u8) -> Result<()> {
        if self.gnss_id != gnss_id {
            return Err(Error::StructureMismatch(format!(
                "expected gnss id {gnss_id}, got {}",
                self.gnss_id
            )));
        }
        Ok(())
    }
}

impl Decode for RxmSfrbx {
    fn decode(&mut self, payload: &[u8]) -> Result<()> {
        require_len(payload, Self::HEADER_LEN)?;
        let num_words = usize::from(payload[4]);
        require_len(payload, Self::HEADER_LEN + num_words * 4)?;
        self.gnss_id = payload[0];
        self.sv_id = payload[1];
        self.sig_id = payload[2];
        self.freq_id = payload[3];
        self.chn = payload[5];
        self.version = payload[6];
        self.reserved = payload[7];
        self.words = payload[Self::HEADER_LEN..Self::HEADER_LEN + num_words * 4]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(())
    }
}

impl Encode for RxmSfrbx {
    fn encoded_len(&self) -> usize {
        Self::HEADER_LEN + self.words.len() * 4
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let num_words = u8::try_from(self.words.len()).map_err(|_| Error::InvalidField {
            field: "num_words",
            value: self.words.len().to_string(),
        })?;
        out.extend_from_slice(&[
            self.gnss_id,
            self.sv_id,
            self.sig_id,
            self.freq_id,
            num_words,
            self.chn,
            self.version,
            self.reserved,
        ]);
        for word in &self.words {
            out.extend_from_slice(&word.to_le_bytes());
        }
        Ok(())
    }
}

impl Message for RxmSfrbx {
    fn protocol(&self) -> ProtocolId {
        ProtocolId::Ubx
    }

    fn message_id(&self) -> MessageId {
        MessageId::Pair {
            class: class::RXM,
            id: Self::ID,
        }
    }

    fn name(&self) -> &'static str {
        "RXM-SFRBX"
    }
}
