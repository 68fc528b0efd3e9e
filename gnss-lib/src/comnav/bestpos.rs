use crate::message::{take, Decode, Encode, Message, MessageId, ProtocolId};
use crate::prelude::*;

#[cfg(feature = "serde")]
use serde::Serialize;

/// BESTPOS best available position solution.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BestPos {
    /// Solution status, 0 is solution computed.
    pub sol_status: u32,
    pub pos_type: u32,
    /// Degrees.
    pub lat: f64,
    /// Degrees.
    pub lon: f64,
    /// Height above mean sea level, m.
    pub hgt: f64,
    /// Geoid undulation, m.
    pub undulation: f32,
    pub datum_id: u32,
    pub lat_sigma: f32,
    pub lon_sigma: f32,
    pub hgt_sigma: f32,
    /// Base station id, 4 ASCII characters.
    pub station_id: [u8; 4],
    /// Differential age, s.
    pub diff_age: f32,
    /// Solution age, s.
    pub sol_age: f32,
    pub num_svs: u8,
    pub num_soln_svs: u8,
    pub num_soln_l1_svs: u8,
    pub num_soln_multi_svs: u8,
    pub reserved: u8,
    pub ext_sol_status: u8,
    pub galileo_beidou_sig_mask: u8,
    pub gps_glonass_sig_mask: u8,
}

impl BestPos {
    pub const ID: u16 = 42;
    pub const LEN: usize = 72;

    /// Base station id with trailing NULs and spaces removed.
    #[must_use]
    pub fn station(&self) -> String {
        String::from_utf8_lossy(&self.station_id)
            .trim_end_matches(['\0', ' '])
            .to_string()
    }
}

impl Decode for BestPos {
    fn decode(&mut self, payload: &[u8]) -> Result<()> {
        self.sol_status = u32::from_le_bytes(take(payload, 0)?);
        self.pos_type = u32::from_le_bytes(take(payload, 4)?);
        self.lat = f64::from_le_bytes(take(payload, 8)?);
        self.lon = f64::from_le_bytes(take(payload, 16)?);
        self.hgt = f64::from_le_bytes(take(payload, 24)?);
        self.undulation = f32::from_le_bytes(take(payload, 32)?);
        self.datum_id = u32::from_le_bytes(take(payload, 36)?);
        self.lat_sigma = f32::from_le_bytes(take(payload, 40)?);
        self.lon_sigma = f32::from_le_bytes(take(payload, 44)?);
        self.hgt_sigma = f32::from_le_bytes(take(payload, 48)?);
        self.station_id = take(payload, 52)?;
        self.diff_age = f32::from_le_bytes(take(payload, 56)?);
        self.sol_age = f32::from_le_bytes(take(payload, 60)?);
        let [svs, soln, l1, multi, reserved, ext, gal_bds, gps_glo] = take::<8>(payload, 64)?;
        self.num_svs = svs;
        self.num_soln_svs = soln;
        self.num_soln_l1_svs = l1;
        self.num_soln_multi_svs = multi;
        self.reserved = reserved;
        self.ext_sol_status = ext;
        self.galileo_beidou_sig_mask = gal_bds;
        self.gps_glonass_sig_mask = gps_glo;
        Ok(())
    }
}

impl Encode for BestPos {
    fn encoded_len(&self) -> usize {
        Self::LEN
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.sol_status.to_le_bytes());
        out.extend_from_slice(&self.pos_type.to_le_bytes());
        out.extend_from_slice(&self.lat.to_le_bytes());
        out.extend_from_slice(&self.lon.to_le_bytes());
        out.extend_from_slice(&self.hgt.to_le_bytes());
        out.extend_from_slice(&self.undulation.to_le_bytes());
        out.extend_from_slice(&self.datum_id.to_le_bytes());
        out.extend_from_slice(&self.lat_sigma.to_le_bytes());
        out.extend_from_slice(&self.lon_sigma.to_le_bytes());
        out.extend_from_slice(&self.hgt_sigma.to_le_bytes());
        out.extend_from_slice(&self.station_id);
        out.extend_from_slice(&self.diff_age.to_le_bytes());
        out.extend_from_slice(&self.sol_age.to_le_bytes());
        out.extend_from_slice(&[
            self.num_svs,
            self.num_soln_svs,
            self.num_soln_l1_svs,
            self.num_soln_multi_svs,
            self.reserved,
            self.ext_sol_status,
            self.galileo_beidou_sig_mask,
            self.gps_glonass_sig_mask,
        ]);
        Ok(())
    }
}

impl Message for BestPos {
    fn protocol(&self) -> ProtocolId {
        ProtocolId::ComNav
    }

    fn message_id(&self) -> MessageId {
        MessageId::Code(Self::ID)
    }

    fn name(&self) -> &'static str {
        "BESTPOS"
    }
}
