//! GPS LNAV subframes.
//!
//! A subframe is ten 30-bit words; with the 6 parity bits of each word removed it is
//! 30 bytes, bit 0 being the first bit of the preamble. Field positions below are bit
//! offsets into that 240-bit layout. Angles are in semicircles as broadcast.
use std::sync::OnceLock;

use super::{decode_with, new_nav, Constellation, NavData};
use crate::bits::{scale, BitReader};
use crate::message::{require_len, Decode, MessageId};
use crate::prelude::*;
use crate::registry::Registry;

#[cfg(feature = "serde")]
use serde::Serialize;

pub const SUBFRAME_LEN: usize = 30;
pub const PREAMBLE: u8 = 0x8b;
const WORDS: usize = 10;
// first bit after the TLM and HOW words
const DATA_START: usize = 48;

/// Pack ten 30-bit navigation words (data in bits 29..6, parity in 5..0) into a
/// subframe.
///
/// # Errors
/// [Error::TruncatedInput] if fewer than 10 words are given.
pub fn pack_words(words: &[u32]) -> Result<[u8; SUBFRAME_LEN]> {
    if words.len() < WORDS {
        return Err(Error::TruncatedInput {
            actual: words.len() * 4,
            minimum: WORDS * 4,
        });
    }
    let mut out = [0u8; SUBFRAME_LEN];
    for (chunk, word) in out.chunks_exact_mut(3).zip(words) {
        let data = (word >> 6) & 0xff_ffff;
        chunk.copy_from_slice(&data.to_be_bytes()[1..]);
    }
    Ok(out)
}

/// Telemetry (TLM) and handover (HOW) words present in every subframe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Header {
    pub tlm_message: u16,
    pub integrity: bool,
    /// Truncated time of week count of the next subframe, 6 second units.
    pub tow_count: u32,
    pub alert: bool,
    pub anti_spoof: bool,
    pub subframe_id: u8,
}

impl Header {
    /// Decode and validate the preamble.
    ///
    /// # Errors
    /// [Error::TruncatedInput] if `dat` is shorter than a subframe,
    /// [Error::StructureMismatch] if the preamble is wrong.
    pub fn decode(dat: &[u8]) -> Result<Self> {
        require_len(dat, SUBFRAME_LEN)?;
        let mut rdr = BitReader::new(dat);
        let preamble = rdr.unsigned(8)?;
        if preamble != u64::from(PREAMBLE) {
            return Err(Error::StructureMismatch(format!(
                "GPS subframe preamble {preamble:#04x}"
            )));
        }
        let tlm_message = rdr.unsigned(14)? as u16;
        let integrity = rdr.flag()?;
        rdr.skip(1)?;
        Ok(Header {
            tlm_message,
            integrity,
            tow_count: rdr.unsigned(17)? as u32,
            alert: rdr.flag()?,
            anti_spoof: rdr.flag()?,
            subframe_id: rdr.unsigned(3)? as u8,
        })
    }

    #[must_use]
    pub fn tow_seconds(&self) -> u32 {
        self.tow_count * 6
    }
}

/// Validate the header of `dat` and position a reader after the HOW word.
fn open(dat: &[u8], expected: u8) -> Result<(Header, BitReader<'_>)> {
    let header = Header::decode(dat)?;
    if header.subframe_id != expected {
        return Err(Error::StructureMismatch(format!(
            "expected GPS subframe {expected}, got {}",
            header.subframe_id
        )));
    }
    Ok((header, BitReader::at(dat, DATA_START)))
}

/// Subframe 1, clock correction and satellite health.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Subframe1 {
    pub header: Header,
    /// Week number modulo 1024.
    pub week: u16,
    pub l2_codes: u8,
    pub ura: u8,
    pub health: u8,
    pub iodc: u16,
    pub l2p_data_flag: bool,
    /// Group delay, seconds.
    pub tgd: f64,
    /// Clock reference time, seconds.
    pub toc: u32,
    pub af2: f64,
    pub af1: f64,
    pub af0: f64,
}

impl Decode for Subframe1 {
    fn decode(&mut self, dat: &[u8]) -> Result<()> {
        let (header, mut rdr) = open(dat, 1)?;
        self.header = header;
        self.week = rdr.unsigned(10)? as u16;
        self.l2_codes = rdr.unsigned(2)? as u8;
        self.ura = rdr.unsigned(4)? as u8;
        self.health = rdr.unsigned(6)? as u8;
        let iodc_msb = rdr.unsigned(2)? as u16;
        self.l2p_data_flag = rdr.flag()?;
        rdr.skip(160 - 73)?;
        self.tgd = rdr.signed_scaled(8, scale::P2_M31)?;
        self.iodc = iodc_msb << 8 | rdr.unsigned(8)? as u16;
        self.toc = rdr.unsigned(16)? as u32 * 16;
        self.af2 = rdr.signed_scaled(8, scale::P2_M55)?;
        self.af1 = rdr.signed_scaled(16, scale::P2_M43)?;
        self.af0 = rdr.signed_scaled(22, scale::P2_M31)?;
        Ok(())
    }
}

/// Subframe 2, ephemeris part 1.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Subframe2 {
    pub header: Header,
    pub iode: u8,
    /// Orbit radius sine harmonic correction, meters.
    pub crs: f64,
    /// Mean motion difference, semicircles/s.
    pub delta_n: f64,
    pub m0: f64,
    pub cuc: f64,
    pub e: f64,
    pub cus: f64,
    /// Square root of the semi-major axis, sqrt(m).
    pub sqrt_a: f64,
    /// Ephemeris reference time, seconds.
    pub toe: u32,
    pub fit_interval: bool,
    pub aodo: u8,
}

impl Decode for Subframe2 {
    fn decode(&mut self, dat: &[u8]) -> Result<()> {
        let (header, mut rdr) = open(dat, 2)?;
        self.header = header;
        self.iode = rdr.unsigned(8)? as u8;
        self.crs = rdr.signed_scaled(16, scale::P2_M5)?;
        self.delta_n = rdr.signed_scaled(16, scale::P2_M43)?;
        self.m0 = rdr.signed_scaled(32, scale::P2_M31)?;
        self.cuc = rdr.signed_scaled(16, scale::P2_M29)?;
        self.e = rdr.unsigned_scaled(32, scale::P2_M33)?;
        self.cus = rdr.signed_scaled(16, scale::P2_M29)?;
        self.sqrt_a = rdr.unsigned_scaled(32, scale::P2_M19)?;
        self.toe = rdr.unsigned(16)? as u32 * 16;
        self.fit_interval = rdr.flag()?;
        self.aodo = rdr.unsigned(5)? as u8;
        Ok(())
    }
}

/// Subframe 3, ephemeris part 2.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Subframe3 {
    pub header: Header,
    pub cic: f64,
    pub omega0: f64,
    pub cis: f64,
    pub i0: f64,
    pub crc: f64,
    pub omega: f64,
    pub omega_dot: f64,
    pub iode: u8,
    pub idot: f64,
}

impl Decode for Subframe3 {
    fn decode(&mut self, dat: &[u8]) -> Result<()> {
        let (header, mut rdr) = open(dat, 3)?;
        self.header = header;
        self.cic = rdr.signed_scaled(16, scale::P2_M29)?;
        self.omega0 = rdr.signed_scaled(32, scale::P2_M31)?;
        self.cis = rdr.signed_scaled(16, scale::P2_M29)?;
        self.i0 = rdr.signed_scaled(32, scale::P2_M31)?;
        self.crc = rdr.signed_scaled(16, scale::P2_M5)?;
        self.omega = rdr.signed_scaled(32, scale::P2_M31)?;
        self.omega_dot = rdr.signed_scaled(24, scale::P2_M43)?;
        self.iode = rdr.unsigned(8)? as u8;
        self.idot = rdr.signed_scaled(14, scale::P2_M43)?;
        Ok(())
    }
}

/// Almanac for one satellite, from subframe 5 pages 1-24 or subframe 4 pages 2-10.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Almanac {
    pub sv_id: u8,
    pub e: f64,
    /// Almanac reference time, seconds.
    pub toa: u32,
    pub delta_i: f64,
    pub omega_dot: f64,
    pub health: u8,
    pub sqrt_a: f64,
    pub omega0: f64,
    pub omega: f64,
    pub m0: f64,
    pub af0: f64,
    pub af1: f64,
}

impl Almanac {
    fn read(sv_id: u8, rdr: &mut BitReader<'_>) -> Result<Self> {
        let mut alm = Almanac {
            sv_id,
            e: rdr.unsigned_scaled(16, scale::P2_M21)?,
            toa: rdr.unsigned(8)? as u32 * 4096,
            delta_i: rdr.signed_scaled(16, scale::P2_M19)?,
            omega_dot: rdr.signed_scaled(16, scale::P2_M38)?,
            health: rdr.unsigned(8)? as u8,
            sqrt_a: rdr.unsigned_scaled(24, scale::P2_M11)?,
            omega0: rdr.signed_scaled(24, scale::P2_M23)?,
            omega: rdr.signed_scaled(24, scale::P2_M23)?,
            m0: rdr.signed_scaled(24, scale::P2_M23)?,
            ..Almanac::default()
        };
        // af0 is split around af1: 8 MSBs, then af1, then 3 LSBs
        let af0_msb = rdr.unsigned(8)?;
        alm.af1 = rdr.signed_scaled(11, scale::P2_M38)?;
        let af0_raw = (af0_msb << 3 | rdr.unsigned(3)?) as i64;
        let af0 = if af0_raw & 0x400 != 0 {
            af0_raw - 0x800
        } else {
            af0_raw
        };
        alm.af0 = af0 as f64 * scale::P2_M20;
        Ok(alm)
    }
}

/// Ionospheric model and UTC parameters, subframe 4 page 18 (SV id 56).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct IonoUtc {
    pub alpha: [f64; 4],
    pub beta: [f64; 4],
    pub a1: f64,
    pub a0: f64,
    /// UTC reference time of week, seconds.
    pub tot: u32,
    pub wnt: u8,
    pub delta_t_ls: i8,
    pub wn_lsf: u8,
    pub dn: u8,
    pub delta_t_lsf: i8,
}

impl IonoUtc {
    pub const SV_ID: u8 = 56;

    fn read(rdr: &mut BitReader<'_>) -> Result<Self> {
        Ok(IonoUtc {
            alpha: [
                rdr.signed_scaled(8, scale::P2_M30)?,
                rdr.signed_scaled(8, scale::P2_M27)?,
                rdr.signed_scaled(8, scale::P2_M24)?,
                rdr.signed_scaled(8, scale::P2_M24)?,
            ],
            beta: [
                rdr.signed_scaled(8, scale::P2_11)?,
                rdr.signed_scaled(8, scale::P2_14)?,
                rdr.signed_scaled(8, scale::P2_16)?,
                rdr.signed_scaled(8, scale::P2_16)?,
            ],
            a1: rdr.signed_scaled(24, scale::P2_M50)?,
            a0: rdr.signed_scaled(32, scale::P2_M30)?,
            tot: rdr.unsigned(8)? as u32 * 4096,
            wnt: rdr.unsigned(8)? as u8,
            delta_t_ls: rdr.signed(8)? as i8,
            wn_lsf: rdr.unsigned(8)? as u8,
            dn: rdr.unsigned(8)? as u8,
            delta_t_lsf: rdr.signed(8)? as i8,
        })
    }
}

/// Content of a subframe 4 or 5 page.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Page {
    Almanac(Almanac),
    IonoUtc(IonoUtc),
    /// Pages that are not decoded, e.g., health or reserved pages.
    #[default]
    Other,
}

fn read_page(subframe: u8, dat: &[u8]) -> Result<(Header, u8, u8, Page)> {
    let (header, mut rdr) = open(dat, subframe)?;
    let data_id = rdr.unsigned(2)? as u8;
    let sv_id = rdr.unsigned(6)? as u8;
    let page = match sv_id {
        1..=32 => Page::Almanac(Almanac::read(sv_id, &mut rdr)?),
        IonoUtc::SV_ID if subframe == 4 => Page::IonoUtc(IonoUtc::read(&mut rdr)?),
        _ => Page::Other,
    };
    Ok((header, data_id, sv_id, page))
}

/// Subframe 4, almanac for SVs 25-32, ionosphere and UTC, and reserved pages.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Subframe4 {
    pub header: Header,
    pub data_id: u8,
    /// Page identifier.
    pub sv_id: u8,
    pub page: Page,
}

impl Decode for Subframe4 {
    fn decode(&mut self, dat: &[u8]) -> Result<()> {
        (self.header, self.data_id, self.sv_id, self.page) = read_page(4, dat)?;
        Ok(())
    }
}

/// Subframe 5, almanac for SVs 1-24 and health.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Subframe5 {
    pub header: Header,
    pub data_id: u8,
    pub sv_id: u8,
    pub page: Page,
}

impl Decode for Subframe5 {
    fn decode(&mut self, dat: &[u8]) -> Result<()> {
        (self.header, self.data_id, self.sv_id, self.page) = read_page(5, dat)?;
        Ok(())
    }
}

macro_rules! gps_nav_data {
    ($($ty:ty => $number:literal, $name:literal;)+) => {
        $(
            impl NavData for $ty {
                fn constellation(&self) -> Constellation {
                    Constellation::Gps
                }
                fn number(&self) -> u16 {
                    $number
                }
                fn name(&self) -> &'static str {
                    $name
                }
            }
        )+
    };
}

gps_nav_data! {
    Subframe1 => 1, "GPS-SF1";
    Subframe2 => 2, "GPS-SF2";
    Subframe3 => 3, "GPS-SF3";
    Subframe4 => 4, "GPS-SF4";
    Subframe5 => 5, "GPS-SF5";
}

/// Shared subframe registry, keyed by subframe id.
///
/// # Panics
/// If the built-in subframe table contains a duplicate, which is a programming error.
pub fn registry() -> &'static Registry<dyn NavData> {
    static REGISTRY: OnceLock<Registry<dyn NavData>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let entries: [(u16, &'static str, fn() -> Box<dyn NavData>); 5] = [
            (1, "GPS-SF1", new_nav::<Subframe1>),
            (2, "GPS-SF2", new_nav::<Subframe2>),
            (3, "GPS-SF3", new_nav::<Subframe3>),
            (4, "GPS-SF4", new_nav::<Subframe4>),
            (5, "GPS-SF5", new_nav::<Subframe5>),
        ];
        let mut reg = Registry::new();
        for (number, name, factory) in entries {
            reg.register(MessageId::Code(number), name, factory)
                .expect("built-in GPS subframe registry is not valid");
        }
        reg
    })
}

/// Decode a 30 byte subframe into the type registered for its subframe id.
///
/// # Errors
/// [Error::TruncatedInput] if `dat` is short, [Error::StructureMismatch] on a bad
/// preamble or a subframe id outside 1-5.
pub fn decode_subframe(dat: &[u8]) -> Result<Box<dyn NavData>> {
    let header = Header::decode(dat)?;
    if !(1..=5).contains(&header.subframe_id) {
        return Err(Error::StructureMismatch(format!(
            "invalid GPS subframe id {}",
            header.subframe_id
        )));
    }
    decode_with(registry(), header.subframe_id.into(), dat)
}
