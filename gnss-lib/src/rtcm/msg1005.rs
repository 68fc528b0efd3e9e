use crate::bits::{scale, BitReader, BitWriter};
use crate::message::{require_len, Decode, Encode, Message, MessageId, ProtocolId};
use crate::prelude::*;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Stationary antenna reference point, message 1005, or 1006 which adds the antenna
/// height.
///
/// ECEF coordinates are kept in their raw 0.0001 m units so re-encoding is exact; use
/// [StationArp::ecef] for meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct StationArp {
    pub message_type: u16,
    pub station_id: u16,
    pub itrf_year: u8,
    pub gps: bool,
    pub glonass: bool,
    pub galileo: bool,
    pub reference_station: bool,
    pub x: i64,
    pub single_receiver_oscillator: bool,
    pub reserved: bool,
    pub y: i64,
    pub quarter_cycle: u8,
    pub z: i64,
    /// Raw antenna height, 1006 only.
    pub antenna_height: Option<u16>,
}

impl StationArp {
    pub const TYPE_ARP: u16 = 1005;
    pub const TYPE_ARP_HEIGHT: u16 = 1006;
    const LEN: usize = 19;
    const LEN_HEIGHT: usize = 21;

    /// Antenna reference point ECEF X, Y and Z in meters.
    #[must_use]
    pub fn ecef(&self) -> [f64; 3] {
        [self.x, self.y, self.z].map(|v| v as f64 * scale::MM_TENTH)
    }

    #[must_use]
    pub fn antenna_height_meters(&self) -> Option<f64> {
        self.antenna_height.map(|h| f64::from(h) * scale::MM_TENTH)
    }

    fn has_height(&self) -> bool {
        self.message_type == Self::TYPE_ARP_HEIGHT
    }
}

pub(super) fn new_1005() -> Box<dyn Message> {
    Box::new(StationArp {
        message_type: StationArp::TYPE_ARP,
        ..StationArp::default()
    })
}

pub(super) fn new_1006() -> Box<dyn Message> {
    Box::new(StationArp {
        message_type: StationArp::TYPE_ARP_HEIGHT,
        antenna_height: Some(0),
        ..StationArp::default()
    })
}

impl Decode for StationArp {
    fn decode(&mut self, payload: &[u8]) -> Result<()> {
        let mut rdr = BitReader::new(payload);
        let message_type = rdr.unsigned(12)? as u16;
        let len = match message_type {
            Self::TYPE_ARP => Self::LEN,
            Self::TYPE_ARP_HEIGHT => Self::LEN_HEIGHT,
            other => {
                return Err(Error::StructureMismatch(format!(
                    "message type {other} is not a station reference point"
                )))
            }
        };
        require_len(payload, len)?;
        self.message_type = message_type;
        self.station_id = rdr.unsigned(12)? as u16;
        self.itrf_year = rdr.unsigned(6)? as u8;
        self.gps = rdr.flag()?;
        self.glonass = rdr.flag()?;
        self.galileo = rdr.flag()?;
        self.reference_station = rdr.flag()?;
        self.x = rdr.extended_38()? as i64;
        self.single_receiver_oscillator = rdr.flag()?;
        self.reserved = rdr.flag()?;
        self.y = rdr.extended_38()? as i64;
        self.quarter_cycle = rdr.unsigned(2)? as u8;
        self.z = rdr.extended_38()? as i64;
        self.antenna_height = if self.has_height() {
            Some(rdr.unsigned(16)? as u16)
        } else {
            None
        };
        Ok(())
    }
}

impl Encode for StationArp {
    fn encoded_len(&self) -> usize {
        if self.has_height() {
            Self::LEN_HEIGHT
        } else {
            Self::LEN
        }
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let start = out.len();
        out.resize(start + self.encoded_len(), 0);
        let mut w = BitWriter::new(&mut out[start..]);
        w.unsigned(12, self.message_type.into())?;
        w.unsigned(12, self.station_id.into())?;
        w.unsigned(6, self.itrf_year.into())?;
        w.flag(self.gps)?;
        w.flag(self.glonass)?;
        w.flag(self.galileo)?;
        w.flag(self.reference_station)?;
        w.signed(38, self.x)?;
        w.flag(self.single_receiver_oscillator)?;
        w.flag(self.reserved)?;
        w.signed(38, self.y)?;
        w.unsigned(2, self.quarter_cycle.into())?;
        w.signed(38, self.z)?;
        if self.has_height() {
            w.unsigned(16, self.antenna_height.unwrap_or_default().into())?;
        }
        Ok(())
    }
}

impl Message for StationArp {
    fn protocol(&self) -> ProtocolId {
        ProtocolId::Rtcm3
    }

    fn message_id(&self) -> MessageId {
        MessageId::Code(self.message_type)
    }

    fn name(&self) -> &'static str {
        if self.has_height() {
            "1006"
        } else {
            "1005"
        }
    }
}
