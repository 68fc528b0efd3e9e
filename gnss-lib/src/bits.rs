//! MSB-first bit field access over byte buffers.
//!
//! Buffers are treated as one contiguous bit stream regardless of byte boundaries; bit 0
//! is the most significant bit of the first byte. Every function takes the buffer and a
//! bit offset explicitly and returns the offset just past the field, so a decode can be
//! threaded through a sequence of calls without copying the underlying bytes. The
//! [BitReader] and [BitWriter] cursors wrap the same functions for sequential access.
use crate::prelude::*;

/// Scale factors applied to raw fixed-point fields.
///
/// Named constants are used rather than computing `2f64.powi(n)` at each call site.
pub mod scale {
    pub const P2_4: f64 = 16.0;
    pub const P2_11: f64 = 2048.0;
    pub const P2_12: f64 = 4096.0;
    pub const P2_14: f64 = 16384.0;
    pub const P2_16: f64 = 65536.0;

    pub const P2_M5: f64 = 1.0 / (1u64 << 5) as f64;
    pub const P2_M9: f64 = 1.0 / (1u64 << 9) as f64;
    pub const P2_M11: f64 = 1.0 / (1u64 << 11) as f64;
    pub const P2_M14: f64 = 1.0 / (1u64 << 14) as f64;
    pub const P2_M15: f64 = 1.0 / (1u64 << 15) as f64;
    pub const P2_M18: f64 = 1.0 / (1u64 << 18) as f64;
    pub const P2_M19: f64 = 1.0 / (1u64 << 19) as f64;
    pub const P2_M20: f64 = 1.0 / (1u64 << 20) as f64;
    pub const P2_M21: f64 = 1.0 / (1u64 << 21) as f64;
    pub const P2_M23: f64 = 1.0 / (1u64 << 23) as f64;
    pub const P2_M24: f64 = 1.0 / (1u64 << 24) as f64;
    pub const P2_M27: f64 = 1.0 / (1u64 << 27) as f64;
    pub const P2_M29: f64 = 1.0 / (1u64 << 29) as f64;
    pub const P2_M30: f64 = 1.0 / (1u64 << 30) as f64;
    pub const P2_M31: f64 = 1.0 / (1u64 << 31) as f64;
    pub const P2_M33: f64 = 1.0 / (1u64 << 33) as f64;
    pub const P2_M38: f64 = 1.0 / (1u64 << 38) as f64;
    pub const P2_M40: f64 = 1.0 / (1u64 << 40) as f64;
    pub const P2_M43: f64 = 1.0 / (1u64 << 43) as f64;
    pub const P2_M50: f64 = 1.0 / (1u64 << 50) as f64;
    pub const P2_M55: f64 = 1.0 / (1u64 << 55) as f64;

    /// RTCM 3 antenna reference point resolution, meters.
    pub const MM_TENTH: f64 = 0.0001;
    /// Geodetic coordinates in 1e-7 degrees.
    pub const DEG_1E7: f64 = 1e-7;
}

/// Maximum width of a single field read or write.
pub const MAX_WIDTH: u32 = 64;

fn check_range(len: usize, offset: usize, width: u32, min_width: u32) -> Result<()> {
    let available = len * 8;
    if width < min_width || width > MAX_WIDTH || offset + width as usize > available {
        return Err(Error::OutOfRange {
            offset,
            width,
            available,
        });
    }
    Ok(())
}

/// Read `width` (1 to 64) bits starting at bit `offset` as an unsigned integer.
///
/// Returns the value and the offset of the first bit after the field.
///
/// # Errors
/// [Error::OutOfRange] if `width` is not valid or the field extends past the end of `buf`.
pub fn read_unsigned(buf: &[u8], offset: usize, width: u32) -> Result<(u64, usize)> {
    check_range(buf.len(), offset, width, 1)?;
    let end = offset + width as usize;
    let mut value = 0u64;
    let mut pos = offset;
    while pos < end {
        let avail = 8 - pos % 8;
        let take = avail.min(end - pos);
        let bits = (buf[pos / 8] >> (avail - take)) & (0xffu16 >> (8 - take)) as u8;
        value = (value << take) | u64::from(bits);
        pos += take;
    }
    Ok((value, end))
}

/// Write the low `width` bits of `value` starting at bit `offset`.
///
/// Bits of `value` above `width` are silently dropped; producers rely on that truncation
/// so it is not treated as an error. Bits outside the field are left untouched.
///
/// # Errors
/// [Error::OutOfRange] if `width` is not valid or the field extends past the end of `buf`.
pub fn write_unsigned(buf: &mut [u8], offset: usize, width: u32, value: u64) -> Result<usize> {
    check_range(buf.len(), offset, width, 1)?;
    let end = offset + width as usize;
    let mut pos = offset;
    while pos < end {
        let avail = 8 - pos % 8;
        let take = avail.min(end - pos);
        let shift = avail - take;
        let low = (0xffu16 >> (8 - take)) as u8;
        let chunk = (value >> (end - pos - take)) as u8 & low;
        let mask = low << shift;
        buf[pos / 8] = (buf[pos / 8] & !mask) | (chunk << shift);
        pos += take;
    }
    Ok(end)
}

/// Read a two's-complement signed field.
///
/// # Errors
/// See [read_unsigned].
pub fn read_signed(buf: &[u8], offset: usize, width: u32) -> Result<(i64, usize)> {
    let (raw, next) = read_unsigned(buf, offset, width)?;
    let shift = MAX_WIDTH - width;
    let value = ((raw << shift) as i64) >> shift;
    Ok((value, next))
}

/// Write a two's-complement signed field, truncating to `width` bits.
///
/// # Errors
/// See [write_unsigned].
pub fn write_signed(buf: &mut [u8], offset: usize, width: u32, value: i64) -> Result<usize> {
    write_unsigned(buf, offset, width, value as u64)
}

/// Read a sign-magnitude field: the first bit is the sign (1 is negative) and the
/// remaining `width - 1` bits are the magnitude.
///
/// A set sign bit with a zero magnitude produces `-0.0`.
///
/// # Errors
/// [Error::OutOfRange] if `width` is less than 2 or the field does not fit.
pub fn read_sign_magnitude(buf: &[u8], offset: usize, width: u32) -> Result<(f64, usize)> {
    check_range(buf.len(), offset, width, 2)?;
    let (sign, next) = read_unsigned(buf, offset, 1)?;
    let (magnitude, next) = read_unsigned(buf, next, width - 1)?;
    let magnitude = magnitude as f64;
    Ok((if sign == 1 { -magnitude } else { magnitude }, next))
}

/// Write `value` as a sign-magnitude field of `width` bits. The magnitude is truncated
/// to `width - 1` bits.
///
/// # Errors
/// [Error::OutOfRange] if `width` is less than 2 or the field does not fit.
pub fn write_sign_magnitude(buf: &mut [u8], offset: usize, width: u32, value: i64) -> Result<usize> {
    check_range(buf.len(), offset, width, 2)?;
    let next = write_unsigned(buf, offset, 1, u64::from(value < 0))?;
    write_unsigned(buf, next, width - 1, value.unsigned_abs())
}

/// Read a 38-bit two's-complement value as used by RTCM 3 antenna coordinates.
///
/// The value is assembled from a signed 32-bit read and an unsigned 6-bit read so the
/// result is identical whether or not the field is byte aligned.
///
/// # Errors
/// [Error::OutOfRange] if the field does not fit.
pub fn read_extended_38(buf: &[u8], offset: usize) -> Result<(f64, usize)> {
    check_range(buf.len(), offset, 38, 38)?;
    let (high, next) = read_signed(buf, offset, 32)?;
    let (low, next) = read_unsigned(buf, next, 6)?;
    Ok((high as f64 * 64.0 + low as f64, next))
}

/// Sequential reader over a bit stream.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> BitReader<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self::at(buf, 0)
    }

    /// Reader positioned at bit `offset`.
    #[must_use]
    pub fn at(buf: &'a [u8], offset: usize) -> Self {
        BitReader { buf, offset }
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of unread bits.
    #[must_use]
    pub fn remaining(&self) -> usize {
        (self.buf.len() * 8).saturating_sub(self.offset)
    }

    /// Advance past `width` bits without decoding them.
    ///
    /// # Errors
    /// [Error::OutOfRange] when fewer than `width` bits remain.
    pub fn skip(&mut self, width: usize) -> Result<()> {
        if width > self.remaining() {
            return Err(Error::OutOfRange {
                offset: self.offset,
                width: u32::try_from(width).unwrap_or(u32::MAX),
                available: self.buf.len() * 8,
            });
        }
        self.offset += width;
        Ok(())
    }

    pub fn unsigned(&mut self, width: u32) -> Result<u64> {
        let (value, next) = read_unsigned(self.buf, self.offset, width)?;
        self.offset = next;
        Ok(value)
    }

    pub fn signed(&mut self, width: u32) -> Result<i64> {
        let (value, next) = read_signed(self.buf, self.offset, width)?;
        self.offset = next;
        Ok(value)
    }

    pub fn flag(&mut self) -> Result<bool> {
        Ok(self.unsigned(1)? == 1)
    }

    pub fn sign_magnitude(&mut self, width: u32) -> Result<f64> {
        let (value, next) = read_sign_magnitude(self.buf, self.offset, width)?;
        self.offset = next;
        Ok(value)
    }

    pub fn extended_38(&mut self) -> Result<f64> {
        let (value, next) = read_extended_38(self.buf, self.offset)?;
        self.offset = next;
        Ok(value)
    }

    pub fn unsigned_scaled(&mut self, width: u32, scale: f64) -> Result<f64> {
        Ok(self.unsigned(width)? as f64 * scale)
    }

    pub fn signed_scaled(&mut self, width: u32, scale: f64) -> Result<f64> {
        Ok(self.signed(width)? as f64 * scale)
    }

    pub fn sign_magnitude_scaled(&mut self, width: u32, scale: f64) -> Result<f64> {
        Ok(self.sign_magnitude(width)? * scale)
    }
}

/// Sequential writer into a fixed size bit buffer.
#[derive(Debug)]
pub struct BitWriter<'a> {
    buf: &'a mut [u8],
    offset: usize,
}

impl<'a> BitWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self::at(buf, 0)
    }

    pub fn at(buf: &'a mut [u8], offset: usize) -> Self {
        BitWriter { buf, offset }
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Advance past `width` bits leaving their current value.
    ///
    /// # Errors
    /// [Error::OutOfRange] when fewer than `width` bits remain.
    pub fn skip(&mut self, width: usize) -> Result<()> {
        let available = self.buf.len() * 8;
        if self.offset + width > available {
            return Err(Error::OutOfRange {
                offset: self.offset,
                width: u32::try_from(width).unwrap_or(u32::MAX),
                available,
            });
        }
        self.offset += width;
        Ok(())
    }

    pub fn unsigned(&mut self, width: u32, value: u64) -> Result<()> {
        self.offset = write_unsigned(self.buf, self.offset, width, value)?;
        Ok(())
    }

    pub fn signed(&mut self, width: u32, value: i64) -> Result<()> {
        self.offset = write_signed(self.buf, self.offset, width, value)?;
        Ok(())
    }

    pub fn flag(&mut self, value: bool) -> Result<()> {
        self.unsigned(1, u64::from(value))
    }

    pub fn sign_magnitude(&mut self, width: u32, value: i64) -> Result<()> {
        self.offset = write_sign_magnitude(self.buf, self.offset, width, value)?;
        Ok(())
    }

    /// Write `value / scale` rounded to the nearest integer.
    pub fn unsigned_scaled(&mut self, width: u32, value: f64, scale: f64) -> Result<()> {
        self.unsigned(width, (value / scale).round() as u64)
    }

    pub fn signed_scaled(&mut self, width: u32, value: f64, scale: f64) -> Result<()> {
        self.signed(width, (value / scale).round() as i64)
    }

    pub fn sign_magnitude_scaled(&mut self, width: u32, value: f64, scale: f64) -> Result<()> {
        self.sign_magnitude(width, (value / scale).round() as i64)
    }
}
