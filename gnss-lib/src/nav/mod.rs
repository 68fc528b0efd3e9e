//! Raw broadcast navigation data.
//!
//! Decodes fixed size navigation units carried inside receiver messages: GPS LNAV
//! subframes ([gps]) and GLONASS strings ([glonass]). Each unit checks its preamble or
//! id before any other field is trusted, and dispatch by subframe/string number uses a
//! [Registry] scoped to that constellation.
pub mod glonass;
pub mod gps;

use std::fmt::Debug;

use crate::message::{AsAny, Decode, MessageId};
use crate::prelude::*;
use crate::registry::Registry;

#[cfg(feature = "serde")]
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Constellation {
    Gps,
    Glonass,
}

/// A decoded navigation unit.
pub trait NavData: Decode + AsAny + Debug + Send + Sync {
    fn constellation(&self) -> Constellation;
    /// Subframe or string number.
    fn number(&self) -> u16;
    fn name(&self) -> &'static str;
}

impl dyn NavData {
    #[must_use]
    pub fn downcast_ref<T: NavData>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// [crate::registry::Factory] for any default constructible navigation unit.
#[must_use]
pub fn new_nav<N: NavData + Default>() -> Box<dyn NavData> {
    Box::<N>::default()
}

/// Create the unit registered for `number` and decode `dat` into it.
pub(crate) fn decode_with(registry: &Registry<dyn NavData>, number: u16, dat: &[u8]) -> Result<Box<dyn NavData>> {
    let id = MessageId::Code(number);
    let mut nav = registry.create(&id).ok_or(Error::UnknownMessageId(id))?;
    nav.decode(dat)?;
    Ok(nav)
}
