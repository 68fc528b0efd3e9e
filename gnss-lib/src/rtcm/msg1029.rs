use crate::bits::{BitReader, BitWriter};
use crate::message::{require_len, trim_trailing_nul, Decode, Encode, Message, MessageId, ProtocolId};
use crate::prelude::*;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Message 1029, free form UTF-8 text from a reference station.
///
/// Trailing NUL bytes are trimmed on decode; interior NULs are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct UnicodeText {
    pub station_id: u16,
    /// Modified Julian day.
    pub mjd: u16,
    /// Seconds of day, UTC.
    pub seconds_of_day: u32,
    pub text: String,
}

impl UnicodeText {
    pub const TYPE: u16 = 1029;
    /// Bytes up to and including the code unit count.
    const HEADER_LEN: usize = 9;
}

impl Decode for UnicodeText {
    fn decode(&mut self, payload: &[u8]) -> Result<()> {
        require_len(payload, Self::HEADER_LEN)?;
        let mut rdr = BitReader::new(payload);
        let message_type = rdr.unsigned(12)? as u16;
        if message_type != Self::TYPE {
            return Err(Error::StructureMismatch(format!(
                "message type {message_type} is not unicode text"
            )));
        }
        self.station_id = rdr.unsigned(12)? as u16;
        self.mjd = rdr.unsigned(16)? as u16;
        self.seconds_of_day = rdr.unsigned(17)? as u32;
        // character count is implied by the code units
        rdr.skip(7)?;
        let units = rdr.unsigned(8)? as usize;
        require_len(payload, Self::HEADER_LEN + units)?;
        let text = &payload[Self::HEADER_LEN..Self::HEADER_LEN + units];
        self.text = String::from_utf8_lossy(trim_trailing_nul(text)).into_owned();
        Ok(())
    }
}

impl Encode for UnicodeText {
    fn encoded_len(&self) -> usize {
        Self::HEADER_LEN + self.text.len()
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let units = u8::try_from(self.text.len()).map_err(|_| Error::InvalidField {
            field: "text",
            value: format!("{} code units", self.text.len()),
        })?;
        let chars = self.text.chars().count();
        if chars > 127 {
            return Err(Error::InvalidField {
                field: "text",
                value: format!("{chars} characters"),
            });
        }
        let start = out.len();
        out.resize(start + Self::HEADER_LEN, 0);
        let mut w = BitWriter::new(&mut out[start..]);
        w.unsigned(12, Self::TYPE.into())?;
        w.unsigned(12, self.station_id.into())?;
        w.unsigned(16, self.mjd.into())?;
        w.unsigned(17, self.seconds_of_day.into())?;
        w.unsigned(7, chars as u64)?;
        w.unsigned(8, units.into())?;
        out.extend_from_slice(self.text.as_bytes());
        Ok(())
    }
}

impl Message for UnicodeText {
    fn protocol(&self) -> ProtocolId {
        ProtocolId::Rtcm3
    }

    fn message_id(&self) -> MessageId {
        MessageId::Code(Self::TYPE)
    }

    fn name(&self) -> &'static str {
        "1029"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UnicodeText {
        UnicodeText {
            station_id: 23,
            mjd: 60_000,
            seconds_of_day: 86_399,
            text: "UTF-8 \u{00e9}t\u{00e9}".to_string(),
        }
    }

    #[test]
    fn encode_decode() {
        let msg = sample();
        let mut out = Vec::new();
        msg.encode(&mut out).unwrap();
        assert_eq!(out.len(), msg.encoded_len());

        let mut decoded = UnicodeText::default();
        decoded.decode(&out).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn trailing_nuls_trimmed() {
        let msg = UnicodeText {
            text: "A\0B\0\0".to_string(),
            ..sample()
        };
        let mut out = Vec::new();
        msg.encode(&mut out).unwrap();

        let mut decoded = UnicodeText::default();
        decoded.decode(&out).unwrap();
        assert_eq!(decoded.text, "A\0B");
    }

    #[test]
    fn text_shorter_than_declared() {
        let mut out = Vec::new();
        sample().encode(&mut out).unwrap();
        out.pop();
        assert!(matches!(
            UnicodeText::default().decode(&out),
            Err(Error::TruncatedInput { .. })
        ));
    }

    #[test]
    fn too_long() {
        let msg = UnicodeText {
            text: "x".repeat(256),
            ..UnicodeText::default()
        };
        assert!(matches!(
            msg.encode(&mut Vec::new()),
            Err(Error::InvalidField { .. })
        ));
    }
}
