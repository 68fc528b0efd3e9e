use crate::message::{take, Decode, Encode, Message, MessageId, ProtocolId};
use crate::nav::{gps, NavData};
use crate::prelude::*;

#[cfg(feature = "serde")]
use serde::Serialize;

/// RAWGPSSUBFRAME, a GPS LNAV subframe with parity removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RawGpsSubframe {
    pub decode_id: i32,
    pub prn: u32,
    pub subframe_id: u32,
    pub data: [u8; gps::SUBFRAME_LEN],
    pub reserved: [u8; 2],
    pub channel: u32,
}

impl RawGpsSubframe {
    pub const ID: u16 = 25;
    pub const LEN: usize = 48;

    /// Decode the embedded subframe.
    ///
    /// # Errors
    /// [Error::StructureMismatch] if the preamble is wrong or the subframe id in the
    /// data disagrees with [RawGpsSubframe::subframe_id].
    pub fn nav_data(&self) -> Result<Box<dyn NavData>> {
        let nav = gps::decode_subframe(&self.data)?;
        if u32::from(nav.number()) != self.subframe_id {
            return Err(Error::StructureMismatch(format!(
                "subframe id {} does not match message subframe id {}",
                nav.number(),
                self.subframe_id
            )));
        }
        Ok(nav)
    }
}

impl Decode for RawGpsSubframe {
    fn decode(&mut self, payload: &[u8]) -> Result<()> {
        self.decode_id = i32::from_le_bytes(take(payload, 0)?);
        self.prn = u32::from_le_bytes(take(payload, 4)?);
        self.subframe_id = u32::from_le_bytes(take(payload, 8)?);
        self.data = take(payload, 12)?;
        self.reserved = take(payload, 42)?;
        self.channel = u32::from_le_bytes(take(payload, 44)?);
        Ok(())
    }
}

impl Encode for RawGpsSubframe {
    fn encoded_len(&self) -> usize {
        Self::LEN
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.decode_id.to_le_bytes());
        out.extend_from_slice(&self.prn.to_le_bytes());
        out.extend_from_slice(&self.subframe_id.to_le_bytes());
        out.extend_from_slice(&self.data);
        out.extend_from_slice(&self.reserved);
        out.extend_from_slice(&self.channel.to_le_bytes());
        Ok(())
    }
}

impl Message for RawGpsSubframe {
    fn protocol(&self) -> ProtocolId {
        ProtocolId::ComNav
    }

    fn message_id(&self) -> MessageId {
        MessageId::Code(Self::ID)
    }

    fn name(&self) -> &'static str {
        "RAWGPSSUBFRAME"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitWriter;
    use crate::nav::gps::Subframe3;

    fn subframe(id: u8) -> [u8; gps::SUBFRAME_LEN] {
        let mut sf = [0u8; gps::SUBFRAME_LEN];
        sf[0] = gps::PREAMBLE;
        BitWriter::at(&mut sf, 43).unsigned(3, id.into()).unwrap();
        sf
    }

    #[test]
    fn encode_decode() {
        let msg = RawGpsSubframe {
            decode_id: -1,
            prn: 17,
            subframe_id: 3,
            data: subframe(3),
            channel: 9,
            ..RawGpsSubframe::default()
        };
        let mut out = Vec::new();
        msg.encode(&mut out).unwrap();
        assert_eq!(out.len(), RawGpsSubframe::LEN);

        let mut decoded = RawGpsSubframe::default();
        decoded.decode(&out).unwrap();
        assert_eq!(decoded, msg);

        let nav = decoded.nav_data().unwrap();
        assert_eq!(nav.number(), 3);
        assert!(nav.downcast_ref::<Subframe3>().is_some());
    }

    #[test]
    fn subframe_id_cross_check() {
        let msg = RawGpsSubframe {
            subframe_id: 2,
            data: subframe(3),
            ..RawGpsSubframe::default()
        };
        assert!(matches!(msg.nav_data(), Err(Error::StructureMismatch(_))));
    }

    #[test]
    fn bad_preamble() {
        let msg = RawGpsSubframe {
            subframe_id: 1,
            ..RawGpsSubframe::default()
        };
        assert!(matches!(msg.nav_data(), Err(Error::StructureMismatch(_))));
    }
}
