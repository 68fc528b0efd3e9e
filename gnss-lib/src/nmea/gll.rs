use chrono::NaiveTime;

use super::fields::{FieldReader, FieldWriter, Talker};
use crate::message::{AsciiCode, Decode, Encode, Message, MessageId, ProtocolId};
use crate::prelude::*;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Geographic position, latitude and longitude.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Gll {
    pub talker: Talker,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub time: Option<NaiveTime>,
    /// `A` valid, `V` invalid.
    pub status: Option<char>,
    /// NMEA 2.3 mode indicator.
    pub mode: Option<char>,
}

impl Gll {
    pub const CODE: AsciiCode = AsciiCode::from_static("GLL");

    fn write(&self, out: &mut Vec<u8>) {
        let mut w = FieldWriter::new(out, self.talker, Self::CODE);
        w.coord(self.latitude, 2, ('N', 'S'))
            .coord(self.longitude, 3, ('E', 'W'))
            .time(self.time)
            .char(self.status);
        if self.mode.is_some() {
            w.char(self.mode);
        }
    }

    /// True when the status flag marks the position valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.status == Some('A')
    }
}

impl Decode for Gll {
    fn decode(&mut self, payload: &[u8]) -> Result<()> {
        let (talker, mut rdr) = FieldReader::new(payload, Self::CODE)?;
        self.talker = talker;
        self.latitude = rdr.coord("latitude", 'S')?;
        self.longitude = rdr.coord("longitude", 'W')?;
        self.time = rdr.time("time")?;
        self.status = rdr.char("status")?;
        self.mode = rdr.char("mode")?;
        Ok(())
    }
}

impl Encode for Gll {
    fn encoded_len(&self) -> usize {
        let mut out = Vec::new();
        self.write(&mut out);
        out.len()
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.write(out);
        Ok(())
    }
}

impl Message for Gll {
    fn protocol(&self) -> ProtocolId {
        ProtocolId::Nmea
    }

    fn message_id(&self) -> MessageId {
        MessageId::Ascii(Self::CODE)
    }

    fn name(&self) -> &'static str {
        "GLL"
    }
}
