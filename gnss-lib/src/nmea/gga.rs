use chrono::NaiveTime;

use super::fields::{FieldReader, FieldWriter, Talker};
use crate::message::{AsciiCode, Decode, Encode, Message, MessageId, ProtocolId};
use crate::prelude::*;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Global positioning system fix data.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Gga {
    pub talker: Talker,
    pub time: Option<NaiveTime>,
    /// Degrees, south negative.
    pub latitude: Option<f64>,
    /// Degrees, west negative.
    pub longitude: Option<f64>,
    /// 0 invalid, 1 GPS, 2 DGPS, 4 RTK fixed, 5 RTK float, ...
    pub quality: Option<u8>,
    pub satellites: Option<u8>,
    pub hdop: Option<f64>,
    /// Antenna altitude above mean sea level, meters.
    pub altitude: Option<f64>,
    /// Geoid separation, meters.
    pub geoid_separation: Option<f64>,
    /// Seconds since the last differential update.
    pub dgps_age: Option<f64>,
    pub dgps_station: Option<u16>,
}

impl Gga {
    pub const CODE: AsciiCode = AsciiCode::from_static("GGA");

    fn write(&self, out: &mut Vec<u8>) {
        let unit = |v: Option<f64>| v.map(|_| 'M');
        FieldWriter::new(out, self.talker, Self::CODE)
            .time(self.time)
            .coord(self.latitude, 2, ('N', 'S'))
            .coord(self.longitude, 3, ('E', 'W'))
            .int(self.quality)
            .int_padded(self.satellites, 2)
            .f64(self.hdop, 1)
            .f64(self.altitude, 1)
            .char(unit(self.altitude))
            .f64(self.geoid_separation, 1)
            .char(unit(self.geoid_separation))
            .f64(self.dgps_age, 1)
            .int_padded(self.dgps_station, 4);
    }
}

impl Decode for Gga {
    fn decode(&mut self, payload: &[u8]) -> Result<()> {
        let (talker, mut rdr) = FieldReader::new(payload, Self::CODE)?;
        self.talker = talker;
        self.time = rdr.time("time")?;
        self.latitude = rdr.coord("latitude", 'S')?;
        self.longitude = rdr.coord("longitude", 'W')?;
        self.quality = rdr.u8("quality")?;
        self.satellites = rdr.u8("satellites")?;
        self.hdop = rdr.f64("hdop")?;
        self.altitude = rdr.f64("altitude")?;
        rdr.skip();
        self.geoid_separation = rdr.f64("geoid_separation")?;
        rdr.skip();
        self.dgps_age = rdr.f64("dgps_age")?;
        self.dgps_station = rdr.u16("dgps_station")?;
        Ok(())
    }
}

impl Encode for Gga {
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

impl Message for Gga {
    fn protocol(&self) -> ProtocolId {
        ProtocolId::Nmea
    }

    fn message_id(&self) -> MessageId {
        MessageId::Ascii(Self::CODE)
    }

    fn name(&self) -> &'static str {
        "GGA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_fix() {
        let mut gga = Gga::default();
        gga.decode(b"GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,")
            .unwrap();
        assert_eq!(gga.time, NaiveTime::from_hms_opt(12, 35, 19));
        assert!((gga.latitude.unwrap() - (48.0 + 7.038 / 60.0)).abs() < 1e-9);
        assert!((gga.longitude.unwrap() - (11.0 + 31.0 / 60.0)).abs() < 1e-9);
        assert_eq!(gga.quality, Some(1));
        assert_eq!(gga.satellites, Some(8));
        assert_eq!(gga.altitude, Some(545.4));
        assert_eq!(gga.geoid_separation, Some(46.9));
        assert_eq!(gga.dgps_age, None);
        assert_eq!(gga.dgps_station, None);

        let mut out = Vec::new();
        gga.encode(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "GPGGA,123519.000,4807.03800,N,01131.00000,E,1,08,0.9,545.4,M,46.9,M,,"
        );
    }

    #[test]
    fn southern_western_with_dgps() {
        let mut gga = Gga::default();
        gga.decode(b"GNGGA,000001.50,3352.1200,S,15112.6000,W,2,12,1.2,10.0,M,-20.1,M,3.0,0042")
            .unwrap();
        assert!(gga.latitude.unwrap() < 0.0);
        assert!(gga.longitude.unwrap() < 0.0);
        assert_eq!(gga.dgps_station, Some(42));
        assert_eq!(gga.geoid_separation, Some(-20.1));
    }

    #[test]
    fn empty_fix() {
        let mut gga = Gga::default();
        gga.decode(b"GPGGA,,,,,,0,00,,,,,,,").unwrap();
        assert_eq!(gga.latitude, None);
        assert_eq!(gga.quality, Some(0));

        let mut out = Vec::new();
        gga.encode(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "GPGGA,,,,,,0,00,,,,,,,");
    }
}
