//! Comma separated field reading and writing shared by all sentences.
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};

use crate::message::AsciiCode;
use crate::prelude::*;

#[cfg(feature = "serde")]
use serde::{Serialize, Serializer};

/// Two character talker identifier, e.g., `GP` or `GN`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Talker([u8; 2]);

impl Talker {
    pub const GPS: Talker = Talker(*b"GP");
    pub const GNSS: Talker = Talker(*b"GN");

    #[must_use]
    pub fn new(dat: [u8; 2]) -> Option<Self> {
        if dat.iter().all(u8::is_ascii_alphanumeric) {
            Some(Talker([dat[0].to_ascii_uppercase(), dat[1].to_ascii_uppercase()]))
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 2] {
        &self.0
    }
}

impl Default for Talker {
    fn default() -> Self {
        Talker::GPS
    }
}

impl fmt::Display for Talker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0[0] as char, self.0[1] as char)
    }
}

impl fmt::Debug for Talker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Talker({self})")
    }
}

#[cfg(feature = "serde")]
impl Serialize for Talker {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Sequential reader over the fields of a sentence payload.
///
/// Fields missing from the end of a sentence read as empty, so older sentence versions
/// with fewer fields decode with the newer fields unset.
pub(crate) struct FieldReader<'a> {
    fields: std::str::Split<'a, char>,
}

impl<'a> FieldReader<'a> {
    /// Split `payload` (address plus fields) and check the address formatter is `code`.
    pub(crate) fn new(payload: &'a [u8], code: AsciiCode) -> Result<(Talker, Self)> {
        let text = std::str::from_utf8(payload).map_err(|_| Error::InvalidField {
            field: "sentence",
            value: String::from_utf8_lossy(payload).into_owned(),
        })?;
        let mut fields = text.split(',');
        let address = fields.next().unwrap_or_default();
        let invalid = || Error::InvalidField {
            field: "address",
            value: address.to_string(),
        };
        if address.len() != 5 {
            return Err(invalid());
        }
        let bytes = address.as_bytes();
        let talker = Talker::new([bytes[0], bytes[1]]).ok_or_else(invalid)?;
        if AsciiCode::from_bytes(&bytes[2..]) != Some(code) {
            return Err(invalid());
        }
        Ok((talker, FieldReader { fields }))
    }

    fn next_str(&mut self) -> &'a str {
        self.fields.next().unwrap_or_default().trim()
    }

    fn parse<T: FromStr>(&mut self, field: &'static str) -> Result<Option<T>> {
        let s = self.next_str();
        if s.is_empty() {
            return Ok(None);
        }
        s.parse::<T>().map(Some).map_err(|_| Error::InvalidField {
            field,
            value: s.to_string(),
        })
    }

    pub(crate) fn f64(&mut self, field: &'static str) -> Result<Option<f64>> {
        self.parse(field)
    }

    pub(crate) fn u8(&mut self, field: &'static str) -> Result<Option<u8>> {
        self.parse(field)
    }

    pub(crate) fn u16(&mut self, field: &'static str) -> Result<Option<u16>> {
        self.parse(field)
    }

    pub(crate) fn char(&mut self, field: &'static str) -> Result<Option<char>> {
        self.parse(field)
    }

    /// Skip a field whose content is fixed, e.g., the unit `M`.
    pub(crate) fn skip(&mut self) {
        self.next_str();
    }

    /// `hhmmss[.sss]` UTC time of day.
    pub(crate) fn time(&mut self, field: &'static str) -> Result<Option<NaiveTime>> {
        let s = self.next_str();
        if s.is_empty() {
            return Ok(None);
        }
        parse_time(s).map(Some).ok_or_else(|| Error::InvalidField {
            field,
            value: s.to_string(),
        })
    }

    /// `[d]ddmm.mmmm` coordinate followed by its hemisphere, as signed degrees.
    pub(crate) fn coord(&mut self, field: &'static str, negative: char) -> Result<Option<f64>> {
        let value = self.next_str();
        let hemisphere = self.next_str();
        if value.is_empty() {
            return Ok(None);
        }
        let invalid = || Error::InvalidField {
            field,
            value: format!("{value},{hemisphere}"),
        };
        let raw: f64 = value.parse().map_err(|_| invalid())?;
        let degrees = (raw / 100.0).trunc();
        let minutes = raw - degrees * 100.0;
        if !(0.0..60.0).contains(&minutes) {
            return Err(invalid());
        }
        let value = degrees + minutes / 60.0;
        match hemisphere.chars().next() {
            Some(c) if c.eq_ignore_ascii_case(&negative) => Ok(Some(-value)),
            Some(_) => Ok(Some(value)),
            None => Err(invalid()),
        }
    }
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    if s.len() < 6 || !s.is_ascii() {
        return None;
    }
    let hour: u32 = s[0..2].parse().ok()?;
    let min: u32 = s[2..4].parse().ok()?;
    let sec: f64 = s[4..].parse().ok()?;
    if !(0.0..60.0).contains(&sec) {
        return None;
    }
    let whole = sec.trunc();
    let nano = ((sec - whole) * 1e9).round() as u32;
    NaiveTime::from_hms_nano_opt(hour, min, whole as u32, nano.min(999_999_999))
}

/// Builds a sentence payload, address first, each following field preceded by a comma.
pub(crate) struct FieldWriter<'a> {
    out: &'a mut Vec<u8>,
}

impl<'a> FieldWriter<'a> {
    pub(crate) fn new(out: &'a mut Vec<u8>, talker: Talker, code: AsciiCode) -> Self {
        out.extend_from_slice(talker.as_bytes());
        out.extend_from_slice(code.as_str().as_bytes());
        FieldWriter { out }
    }

    pub(crate) fn str(&mut self, value: &str) -> &mut Self {
        self.out.push(b',');
        self.out.extend_from_slice(value.as_bytes());
        self
    }

    fn opt<T>(&mut self, value: Option<T>, render: impl FnOnce(T) -> String) -> &mut Self {
        match value {
            Some(v) => self.str(&render(v)),
            None => self.str(""),
        }
    }

    /// Fixed point with `decimals` digits after the point.
    pub(crate) fn f64(&mut self, value: Option<f64>, decimals: usize) -> &mut Self {
        self.opt(value, |v| format!("{v:.decimals$}"))
    }

    pub(crate) fn int<T: fmt::Display>(&mut self, value: Option<T>) -> &mut Self {
        self.opt(value, |v| v.to_string())
    }

    /// Zero padded integer of at least `width` digits.
    pub(crate) fn int_padded<T: fmt::Display>(&mut self, value: Option<T>, width: usize) -> &mut Self {
        self.opt(value, |v| format!("{v:0width$}"))
    }

    pub(crate) fn char(&mut self, value: Option<char>) -> &mut Self {
        self.opt(value, String::from)
    }

    /// `hhmmss.sss`
    pub(crate) fn time(&mut self, value: Option<NaiveTime>) -> &mut Self {
        self.opt(value, |t| {
            format!(
                "{:02}{:02}{:02}.{:03}",
                t.hour(),
                t.minute(),
                t.second(),
                (t.nanosecond() / 1_000_000).min(999)
            )
        })
    }

    /// `[d]ddmm.mmmmm` plus hemisphere, `deg_width` is 2 for latitude and 3 for longitude.
    pub(crate) fn coord(
        &mut self,
        value: Option<f64>,
        deg_width: usize,
        hemispheres: (char, char),
    ) -> &mut Self {
        match value {
            Some(v) => {
                let abs = v.abs();
                let mut degrees = abs.trunc();
                let mut minutes = ((abs - degrees) * 60.0 * 100_000.0).round() / 100_000.0;
                if minutes >= 60.0 {
                    degrees += 1.0;
                    minutes -= 60.0;
                }
                let hemisphere = if v < 0.0 { hemispheres.1 } else { hemispheres.0 };
                self.str(&format!(
                    "{:0deg_width$}{minutes:08.5}",
                    degrees as u32
                ));
                self.char(Some(hemisphere))
            }
            None => self.str("").str(""),
        }
    }
}
