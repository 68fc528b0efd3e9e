use chrono::NaiveTime;

use super::fields::{FieldReader, FieldWriter, Talker};
use crate::message::{AsciiCode, Decode, Encode, Message, MessageId, ProtocolId};
use crate::prelude::*;

#[cfg(feature = "serde")]
use serde::Serialize;

/// GNSS satellite fault detection.
///
/// All values are rendered with 3 decimals when encoded. The NMEA 4.10 system id is
/// always written, possibly empty; the signal id only when present.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Gbs {
    pub talker: Talker,
    pub time: Option<NaiveTime>,
    /// Expected latitude error, meters.
    pub lat_error: Option<f64>,
    pub lon_error: Option<f64>,
    pub alt_error: Option<f64>,
    /// Most likely failed satellite.
    pub failed_sv: Option<u16>,
    pub missed_probability: Option<f64>,
    /// Estimated bias of the failed satellite, meters.
    pub bias: Option<f64>,
    pub bias_stddev: Option<f64>,
    pub system_id: Option<u8>,
    pub signal_id: Option<u8>,
}

impl Gbs {
    pub const CODE: AsciiCode = AsciiCode::from_static("GBS");
}

impl Decode for Gbs {
    fn decode(&mut self, payload: &[u8]) -> Result<()> {
        let (talker, mut rdr) = FieldReader::new(payload, Self::CODE)?;
        self.talker = talker;
        self.time = rdr.time("time")?;
        self.lat_error = rdr.f64("lat_error")?;
        self.lon_error = rdr.f64("lon_error")?;
        self.alt_error = rdr.f64("alt_error")?;
        self.failed_sv = rdr.u16("failed_sv")?;
        self.missed_probability = rdr.f64("missed_probability")?;
        self.bias = rdr.f64("bias")?;
        self.bias_stddev = rdr.f64("bias_stddev")?;
        self.system_id = rdr.u8("system_id")?;
        self.signal_id = rdr.u8("signal_id")?;
        Ok(())
    }
}

impl Encode for Gbs {
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

impl Gbs {
    fn write(&self, out: &mut Vec<u8>) {
        let mut w = FieldWriter::new(out, self.talker, Self::CODE);
        w.time(self.time)
            .f64(self.lat_error, 3)
            .f64(self.lon_error, 3)
            .f64(self.alt_error, 3)
            .int(self.failed_sv)
            .f64(self.missed_probability, 3)
            .f64(self.bias, 3)
            .f64(self.bias_stddev, 3)
            .int(self.system_id);
        if self.signal_id.is_some() {
            w.int(self.signal_id);
        }
    }
}

impl Message for Gbs {
    fn protocol(&self) -> ProtocolId {
        ProtocolId::Nmea
    }

    fn message_id(&self) -> MessageId {
        MessageId::Ascii(Self::CODE)
    }

    fn name(&self) -> &'static str {
        "GBS"
    }
}
