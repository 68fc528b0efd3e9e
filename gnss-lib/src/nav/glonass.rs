//! GLONASS navigation strings.
//!
//! A string is 85 bits sent MSB first and stored in 11 bytes: an idle bit, the 4-bit
//! string number, 72 data bits and 8 Hamming code bits. Strings 1-5 carry the
//! immediate data of the transmitting satellite; strings 6-15 carry almanac data in
//! even/odd pairs. Most fields are sign-magnitude encoded.
use std::sync::OnceLock;

use super::{decode_with, new_nav, Constellation, NavData};
use crate::bits::{read_unsigned, scale, BitReader};
use crate::message::{require_len, Decode, MessageId};
use crate::prelude::*;
use crate::registry::Registry;

#[cfg(feature = "serde")]
use serde::Serialize;

pub const STRING_LEN: usize = 11;
const NUMBER_OFFSET: usize = 1;
const DATA_START: usize = 5;

/// The string number from bits 1-4.
///
/// # Errors
/// [Error::TruncatedInput] if `dat` is shorter than a string.
pub fn string_number(dat: &[u8]) -> Result<u8> {
    require_len(dat, STRING_LEN)?;
    Ok(read_unsigned(dat, NUMBER_OFFSET, 4)?.0 as u8)
}

/// Validate the string number and position a reader at the first data bit.
fn open(dat: &[u8], accept: impl Fn(u8) -> bool) -> Result<(u8, BitReader<'_>)> {
    let number = string_number(dat)?;
    if !accept(number) {
        return Err(Error::StructureMismatch(format!(
            "unexpected GLONASS string number {number}"
        )));
    }
    Ok((number, BitReader::at(dat, DATA_START)))
}

/// Position, velocity and acceleration along one PZ-90 axis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Axis {
    /// km/s
    pub velocity: f64,
    /// km/s^2
    pub acceleration: f64,
    /// km
    pub position: f64,
}

impl Axis {
    fn read(rdr: &mut BitReader<'_>) -> Result<Self> {
        Ok(Axis {
            velocity: rdr.sign_magnitude_scaled(24, scale::P2_M20)?,
            acceleration: rdr.sign_magnitude_scaled(5, scale::P2_M30)?,
            position: rdr.sign_magnitude_scaled(27, scale::P2_M11)?,
        })
    }
}

/// String 1: frame time and X axis.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct String1 {
    pub p1: u8,
    /// Time of frame start within the day, seconds.
    pub tk: u32,
    pub x: Axis,
}

impl Decode for String1 {
    fn decode(&mut self, dat: &[u8]) -> Result<()> {
        let (_, mut rdr) = open(dat, |n| n == 1)?;
        rdr.skip(2)?;
        self.p1 = rdr.unsigned(2)? as u8;
        let hours = rdr.unsigned(5)? as u32;
        let minutes = rdr.unsigned(6)? as u32;
        let half_minutes = rdr.unsigned(1)? as u32;
        self.tk = hours * 3600 + minutes * 60 + half_minutes * 30;
        self.x = Axis::read(&mut rdr)?;
        Ok(())
    }
}

/// String 2: health, ephemeris reference time and Y axis.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct String2 {
    pub bn: u8,
    pub p2: bool,
    /// Ephemeris reference time within the day, seconds.
    pub tb: u32,
    pub y: Axis,
}

impl Decode for String2 {
    fn decode(&mut self, dat: &[u8]) -> Result<()> {
        let (_, mut rdr) = open(dat, |n| n == 2)?;
        self.bn = rdr.unsigned(3)? as u8;
        self.p2 = rdr.flag()?;
        self.tb = rdr.unsigned(7)? as u32 * 15 * 60;
        rdr.skip(5)?;
        self.y = Axis::read(&mut rdr)?;
        Ok(())
    }
}

/// String 3: frequency bias and Z axis.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct String3 {
    pub p3: bool,
    /// Relative carrier frequency deviation.
    pub gamma: f64,
    pub p: u8,
    pub ln: bool,
    pub z: Axis,
}

impl Decode for String3 {
    fn decode(&mut self, dat: &[u8]) -> Result<()> {
        let (_, mut rdr) = open(dat, |n| n == 3)?;
        self.p3 = rdr.flag()?;
        self.gamma = rdr.sign_magnitude_scaled(11, scale::P2_M40)?;
        rdr.skip(1)?;
        self.p = rdr.unsigned(2)? as u8;
        self.ln = rdr.flag()?;
        self.z = Axis::read(&mut rdr)?;
        Ok(())
    }
}

/// String 4: clock correction and day number.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct String4 {
    /// Clock offset from GLONASS time, seconds.
    pub tau: f64,
    /// L1/L2 delay difference, seconds.
    pub delta_tau: f64,
    /// Age of the data, days.
    pub en: u8,
    pub p4: bool,
    /// Accuracy index.
    pub ft: u8,
    /// Day within the four year interval.
    pub nt: u16,
    /// Slot number.
    pub n: u8,
    /// Satellite type, 0 GLONASS, 1 GLONASS-M.
    pub m: u8,
}

impl Decode for String4 {
    fn decode(&mut self, dat: &[u8]) -> Result<()> {
        let (_, mut rdr) = open(dat, |n| n == 4)?;
        self.tau = rdr.sign_magnitude_scaled(22, scale::P2_M30)?;
        self.delta_tau = rdr.sign_magnitude_scaled(5, scale::P2_M30)?;
        self.en = rdr.unsigned(5)? as u8;
        rdr.skip(14)?;
        self.p4 = rdr.flag()?;
        self.ft = rdr.unsigned(4)? as u8;
        rdr.skip(3)?;
        self.nt = rdr.unsigned(11)? as u16;
        self.n = rdr.unsigned(5)? as u8;
        self.m = rdr.unsigned(2)? as u8;
        Ok(())
    }
}

/// String 5: system time corrections.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct String5 {
    /// Day of the almanac within the four year interval.
    pub na: u16,
    /// GLONASS to UTC(SU) correction, seconds.
    pub tau_c: f64,
    /// Four year interval number.
    pub n4: u8,
    /// GLONASS to GPS time correction, seconds.
    pub tau_gps: f64,
    pub ln: bool,
}

impl Decode for String5 {
    fn decode(&mut self, dat: &[u8]) -> Result<()> {
        let (_, mut rdr) = open(dat, |n| n == 5)?;
        self.na = rdr.unsigned(11)? as u16;
        self.tau_c = rdr.sign_magnitude_scaled(32, scale::P2_M31)?;
        rdr.skip(1)?;
        self.n4 = rdr.unsigned(5)? as u8;
        self.tau_gps = rdr.sign_magnitude_scaled(22, scale::P2_M30)?;
        self.ln = rdr.flag()?;
        Ok(())
    }
}

fn is_even_almanac(n: u8) -> bool {
    (6..=15).contains(&n) && n % 2 == 0
}

fn is_odd_almanac(n: u8) -> bool {
    (6..=15).contains(&n) && n % 2 == 1
}

/// Even almanac string (6, 8, 10, 12, 14): slot, clock and orbit plane.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AlmanacEven {
    pub number: u8,
    /// Satellite usable.
    pub cn: bool,
    pub mn: u8,
    /// Slot number the almanac is for.
    pub slot: u8,
    /// Coarse clock offset, seconds.
    pub tau_n: f64,
    /// Longitude of the first ascending node, semicircles.
    pub lambda: f64,
    /// Inclination correction, semicircles.
    pub delta_i: f64,
    pub epsilon: f64,
}

impl Decode for AlmanacEven {
    fn decode(&mut self, dat: &[u8]) -> Result<()> {
        let (number, mut rdr) = open(dat, is_even_almanac)?;
        self.number = number;
        self.cn = rdr.flag()?;
        self.mn = rdr.unsigned(2)? as u8;
        self.slot = rdr.unsigned(5)? as u8;
        self.tau_n = rdr.sign_magnitude_scaled(10, scale::P2_M18)?;
        self.lambda = rdr.sign_magnitude_scaled(21, scale::P2_M20)?;
        self.delta_i = rdr.sign_magnitude_scaled(18, scale::P2_M20)?;
        self.epsilon = rdr.unsigned_scaled(15, scale::P2_M20)?;
        Ok(())
    }
}

/// Odd almanac string (7, 9, 11, 13, 15): perigee, timing and draconian period.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AlmanacOdd {
    pub number: u8,
    /// Argument of perigee, semicircles.
    pub omega: f64,
    /// Time of the first ascending node passage, seconds.
    pub t_lambda: f64,
    /// Draconian period correction, s/orbit.
    pub delta_t: f64,
    pub delta_t_dot: f64,
    /// Frequency channel.
    pub hn: u8,
    pub ln: bool,
}

impl Decode for AlmanacOdd {
    fn decode(&mut self, dat: &[u8]) -> Result<()> {
        let (number, mut rdr) = open(dat, is_odd_almanac)?;
        self.number = number;
        self.omega = rdr.sign_magnitude_scaled(16, scale::P2_M15)?;
        self.t_lambda = rdr.unsigned_scaled(21, scale::P2_M5)?;
        self.delta_t = rdr.sign_magnitude_scaled(22, scale::P2_M9)?;
        self.delta_t_dot = rdr.sign_magnitude_scaled(7, scale::P2_M14)?;
        self.hn = rdr.unsigned(5)? as u8;
        self.ln = rdr.flag()?;
        Ok(())
    }
}

impl NavData for String1 {
    fn constellation(&self) -> Constellation {
        Constellation::Glonass
    }
    fn number(&self) -> u16 {
        1
    }
    fn name(&self) -> &'static str {
        "GLO-STR1"
    }
}

impl NavData for String2 {
    fn constellation(&self) -> Constellation {
        Constellation::Glonass
    }
    fn number(&self) -> u16 {
        2
    }
    fn name(&self) -> &'static str {
        "GLO-STR2"
    }
}

impl NavData for String3 {
    fn constellation(&self) -> Constellation {
        Constellation::Glonass
    }
    fn number(&self) -> u16 {
        3
    }
    fn name(&self) -> &'static str {
        "GLO-STR3"
    }
}

impl NavData for String4 {
    fn constellation(&self) -> Constellation {
        Constellation::Glonass
    }
    fn number(&self) -> u16 {
        4
    }
    fn name(&self) -> &'static str {
        "GLO-STR4"
    }
}

impl NavData for String5 {
    fn constellation(&self) -> Constellation {
        Constellation::Glonass
    }
    fn number(&self) -> u16 {
        5
    }
    fn name(&self) -> &'static str {
        "GLO-STR5"
    }
}

impl NavData for AlmanacEven {
    fn constellation(&self) -> Constellation {
        Constellation::Glonass
    }
    fn number(&self) -> u16 {
        self.number.into()
    }
    fn name(&self) -> &'static str {
        "GLO-ALM-EVEN"
    }
}

impl NavData for AlmanacOdd {
    fn constellation(&self) -> Constellation {
        Constellation::Glonass
    }
    fn number(&self) -> u16 {
        self.number.into()
    }
    fn name(&self) -> &'static str {
        "GLO-ALM-ODD"
    }
}

/// Shared string registry, keyed by string number.
///
/// # Panics
/// If the built-in string table contains a duplicate, which is a programming error.
pub fn registry() -> &'static Registry<dyn NavData> {
    static REGISTRY: OnceLock<Registry<dyn NavData>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut reg = Registry::new();
        let immediate: [(u16, &'static str, fn() -> Box<dyn NavData>); 5] = [
            (1, "GLO-STR1", new_nav::<String1>),
            (2, "GLO-STR2", new_nav::<String2>),
            (3, "GLO-STR3", new_nav::<String3>),
            (4, "GLO-STR4", new_nav::<String4>),
            (5, "GLO-STR5", new_nav::<String5>),
        ];
        for (number, name, factory) in immediate {
            reg.register(MessageId::Code(number), name, factory)
                .expect("built-in GLONASS string registry is not valid");
        }
        for number in 6..=15u16 {
            let (name, factory): (&'static str, fn() -> Box<dyn NavData>) = if number % 2 == 0 {
                ("GLO-ALM-EVEN", new_nav::<AlmanacEven>)
            } else {
                ("GLO-ALM-ODD", new_nav::<AlmanacOdd>)
            };
            reg.register(MessageId::Code(number), name, factory)
                .expect("built-in GLONASS string registry is not valid");
        }
        reg
    })
}

/// Decode an 11 byte string into the type registered for its string number.
///
/// # Errors
/// [Error::TruncatedInput] if `dat` is short, [Error::StructureMismatch] if the
/// string number is not 1-15.
pub fn decode_string(dat: &[u8]) -> Result<Box<dyn NavData>> {
    let number = string_number(dat)?;
    if !(1..=15).contains(&number) {
        return Err(Error::StructureMismatch(format!(
            "invalid GLONASS string number {number}"
        )));
    }
    decode_with(registry(), number.into(), dat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitWriter;

    fn string(number: u8) -> [u8; STRING_LEN] {
        let mut s = [0u8; STRING_LEN];
        BitWriter::at(&mut s, 1).unsigned(4, number.into()).unwrap();
        s
    }

    #[test]
    fn string1_time_and_x() {
        let mut s = string(1);
        let mut w = BitWriter::at(&mut s, 7);
        w.unsigned(2, 3).unwrap();
        w.unsigned(5, 13).unwrap();
        w.unsigned(6, 45).unwrap();
        w.unsigned(1, 1).unwrap();
        w.sign_magnitude(24, -(1 << 20)).unwrap();
        w.sign_magnitude(5, 3).unwrap();
        w.sign_magnitude(27, 2048 * 12_000).unwrap();

        let nav = decode_string(&s).unwrap();
        assert_eq!(nav.number(), 1);
        assert_eq!(nav.constellation(), Constellation::Glonass);
        let s1 = nav.downcast_ref::<String1>().unwrap();
        assert_eq!(s1.p1, 3);
        assert_eq!(s1.tk, 13 * 3600 + 45 * 60 + 30);
        assert_eq!(s1.x.velocity, -1.0);
        assert_eq!(s1.x.acceleration, 3.0 * scale::P2_M30);
        assert_eq!(s1.x.position, 12_000.0);
    }

    #[test]
    fn string2_reference_time() {
        let mut s = string(2);
        let mut w = BitWriter::at(&mut s, 5);
        w.unsigned(3, 4).unwrap();
        w.flag(true).unwrap();
        w.unsigned(7, 10).unwrap();
        let mut s2 = String2::default();
        s2.decode(&s).unwrap();
        assert_eq!(s2.bn, 4);
        assert!(s2.p2);
        assert_eq!(s2.tb, 9_000);
    }

    #[test]
    fn string3_gamma_negative_zero() {
        let mut s = string(3);
        let mut w = BitWriter::at(&mut s, 5);
        w.flag(true).unwrap();
        // sign set, magnitude zero
        w.unsigned(11, 0x400).unwrap();
        let mut s3 = String3::default();
        s3.decode(&s).unwrap();
        assert!(s3.p3);
        assert_eq!(s3.gamma, 0.0);
        assert!(s3.gamma.is_sign_negative());
    }

    #[test]
    fn string4_clock() {
        let mut s = string(4);
        let mut w = BitWriter::at(&mut s, 5);
        w.sign_magnitude(22, -512).unwrap();
        w.skip(5).unwrap();
        w.unsigned(5, 2).unwrap();
        let mut w = BitWriter::at(&mut s, 59);
        w.unsigned(11, 1461).unwrap();
        w.unsigned(5, 24).unwrap();
        w.unsigned(2, 1).unwrap();

        let mut s4 = String4::default();
        s4.decode(&s).unwrap();
        assert_eq!(s4.tau, -512.0 * scale::P2_M30);
        assert_eq!(s4.en, 2);
        assert_eq!(s4.nt, 1461);
        assert_eq!(s4.n, 24);
        assert_eq!(s4.m, 1);
    }

    #[test]
    fn string5_time_corrections() {
        let mut s = string(5);
        let mut w = BitWriter::at(&mut s, 5);
        w.unsigned(11, 1000).unwrap();
        w.sign_magnitude(32, -7).unwrap();
        w.skip(1).unwrap();
        w.unsigned(5, 7).unwrap();
        w.sign_magnitude(22, 100).unwrap();
        w.flag(true).unwrap();

        let mut s5 = String5::default();
        s5.decode(&s).unwrap();
        assert_eq!(s5.na, 1000);
        assert_eq!(s5.tau_c, -7.0 * scale::P2_M31);
        assert_eq!(s5.n4, 7);
        assert_eq!(s5.tau_gps, 100.0 * scale::P2_M30);
        assert!(s5.ln);
    }

    #[test]
    fn almanac_pairs() {
        let mut even = string(8);
        let mut w = BitWriter::at(&mut even, 5);
        w.flag(true).unwrap();
        w.unsigned(2, 1).unwrap();
        w.unsigned(5, 17).unwrap();
        w.sign_magnitude(10, -3).unwrap();

        let nav = decode_string(&even).unwrap();
        assert_eq!(nav.number(), 8);
        let alm = nav.downcast_ref::<AlmanacEven>().unwrap();
        assert!(alm.cn);
        assert_eq!(alm.slot, 17);
        assert_eq!(alm.tau_n, -3.0 * scale::P2_M18);

        let mut odd = string(9);
        BitWriter::at(&mut odd, 71).unsigned(5, 22).unwrap();
        let nav = decode_string(&odd).unwrap();
        assert_eq!(nav.name(), "GLO-ALM-ODD");
        assert_eq!(nav.downcast_ref::<AlmanacOdd>().unwrap().hn, 22);
    }

    #[test]
    fn number_cross_check() {
        assert!(matches!(
            String2::default().decode(&string(1)),
            Err(Error::StructureMismatch(_))
        ));
        assert!(matches!(
            AlmanacOdd::default().decode(&string(8)),
            Err(Error::StructureMismatch(_))
        ));
        assert!(matches!(
            decode_string(&string(0)),
            Err(Error::StructureMismatch(_))
        ));
        assert!(matches!(
            decode_string(&string(1)[..10]),
            Err(Error::TruncatedInput { .. })
        ));
    }
}
