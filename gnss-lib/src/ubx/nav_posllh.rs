use super::class;
use crate::bits::scale;
use crate::message::{require_len, take, Decode, Encode, Message, MessageId, ProtocolId};
use crate::prelude::*;

#[cfg(feature = "serde")]
use serde::Serialize;

/// NAV-POSLLH geodetic position solution. Values are kept in their raw integer units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct NavPosllh {
    /// GPS time of week, ms.
    pub itow: u32,
    /// 1e-7 degrees.
    pub lon: i32,
    /// 1e-7 degrees.
    pub lat: i32,
    /// Height above ellipsoid, mm.
    pub height: i32,
    /// Height above mean sea level, mm.
    pub height_msl: i32,
    pub h_acc: u32,
    pub v_acc: u32,
}

impl NavPosllh {
    pub const ID: u8 = 0x02;
    pub const LEN: usize = 28;

    #[must_use]
    pub fn lon_degrees(&self) -> f64 {
        f64::from(self.lon) * scale::DEG_1E7
    }

    #[must_use]
    pub fn lat_degrees(&self) -> f64 {
        f64::from(self.lat) * scale::DEG_1E7
    }

    #[must_use]
    pub fn height_meters(&self) -> f64 {
        f64::from(self.height) / 1000.0
    }
}

impl Decode for NavPosllh {
    fn decode(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() != Self::LEN {
            require_len(payload, Self::LEN)?;
            return Err(Error::InvalidField {
                field: "length",
                value: payload.len().to_string(),
            });
        }
        self.itow = u32::from_le_bytes(take(payload, 0)?);
        self.lon = i32::from_le_bytes(take(payload, 4)?);
        self.lat = i32::from_le_bytes(take(payload, 8)?);
        self.height = i32::from_le_bytes(take(payload, 12)?);
        self.height_msl = i32::from_le_bytes(take(payload, 16)?);
        self.h_acc = u32::from_le_bytes(take(payload, 20)?);
        self.v_acc = u32::from_le_bytes(take(payload, 24)?);
        Ok(())
    }
}

impl Encode for NavPosllh {
    fn encoded_len(&self) -> usize {
        Self::LEN
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.itow.to_le_bytes());
        out.extend_from_slice(&self.lon.to_le_bytes());
        out.extend_from_slice(&self.lat.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.height_msl.to_le_bytes());
        out.extend_from_slice(&self.h_acc.to_le_bytes());
        out.extend_from_slice(&self.v_acc.to_le_bytes());
        Ok(())
    }
}

impl Message for NavPosllh {
    fn protocol(&self) -> ProtocolId {
        ProtocolId::Ubx
    }

    fn message_id(&self) -> MessageId {
        MessageId::Pair {
            class: class::NAV,
            id: Self::ID,
        }
    }

    fn name(&self) -> &'static str {
        "NAV-POSLLH"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_position() {
        let payload =
            hex::decode("d0d4c10b3a3d7bf1e8d9a21c5ac70000d1e60000a40100009e010000").unwrap();
        let mut pos = NavPosllh::default();
        pos.decode(&payload).unwrap();
        assert_eq!(pos.itow, 0x0bc1_d4d0);
        assert!((pos.lon_degrees() - f64::from(pos.lon) * 1e-7).abs() < 1e-12);
        assert_eq!(pos.height, 0xc75a);
        assert_eq!(pos.h_acc, 0x1a4);

        let mut out = Vec::new();
        pos.encode(&mut out).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn wrong_length() {
        assert!(matches!(
            NavPosllh::default().decode(&[0u8; 27]),
            Err(Error::TruncatedInput { minimum: 28, .. })
        ));
        assert!(matches!(
            NavPosllh::default().decode(&[0u8; 29]),
            Err(Error::InvalidField { .. })
        ));
    }
}
