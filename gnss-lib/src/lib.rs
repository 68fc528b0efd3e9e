#![doc = include_str!("../README.md")]

mod error;

pub mod bits;
pub mod comnav;
pub mod framing;
pub mod integrity;
pub mod message;
pub mod nav;
pub mod nmea;
pub mod registry;
pub mod rtcm;
pub mod ubx;

pub use error::{Error, Result};
pub use framing::{Frame, FrameSource, MultiSynchronizer, SyncEvent, Synchronizer};
pub use message::{Message, MessageId, ProtocolId};
pub use registry::Registry;

pub(crate) mod prelude {
    pub(crate) use crate::error::{Error, Result};
}
