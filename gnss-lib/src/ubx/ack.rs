use super::class;
use crate::message::{take, Decode, Encode, Message, MessageId, ProtocolId};
use crate::prelude::*;

#[cfg(feature = "serde")]
use serde::Serialize;

/// ACK-ACK or ACK-NAK reply to a configuration message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Ack {
    /// `true` for ACK-ACK, `false` for ACK-NAK.
    pub acknowledged: bool,
    /// Class of the message being acknowledged.
    pub class: u8,
    pub id: u8,
}

impl Ack {
    pub const ID_NAK: u8 = 0x00;
    pub const ID_ACK: u8 = 0x01;
    pub const LEN: usize = 2;
}

pub(super) fn new_ack() -> Box<dyn Message> {
    Box::new(Ack {
        acknowledged: true,
        ..Ack::default()
    })
}

pub(super) fn new_nak() -> Box<dyn Message> {
    Box::<Ack>::default()
}

impl Decode for Ack {
    fn decode(&mut self, payload: &[u8]) -> Result<()> {
        let [class, id] = take::<2>(payload, 0)?;
        self.class = class;
        self.id = id;
        Ok(())
    }
}

impl Encode for Ack {
    fn encoded_len(&self) -> usize {
        Self::LEN
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&[self.class, self.id]);
        Ok(())
    }
}

impl Message for Ack {
    fn protocol(&self) -> ProtocolId {
        ProtocolId::Ubx
    }

    fn message_id(&self) -> MessageId {
        MessageId::Pair {
            class: class::ACK,
            id: if self.acknowledged {
                Self::ID_ACK
            } else {
                Self::ID_NAK
            },
        }
    }

    fn name(&self) -> &'static str {
        if self.acknowledged {
            "ACK-ACK"
        } else {
            "ACK-NAK"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nak_identifier() {
        let nak = new_nak();
        assert_eq!(nak.message_id(), MessageId::Pair { class: 5, id: 0 });
        assert_eq!(nak.name(), "ACK-NAK");
    }

    #[test]
    fn short_payload() {
        let mut ack = Ack::default();
        assert!(matches!(
            ack.decode(&[0x06]),
            Err(Error::TruncatedInput {
                actual: 1,
                minimum: 2
            })
        ));
    }
}
