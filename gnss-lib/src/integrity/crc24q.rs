use crate::bits::read_unsigned;
use crate::prelude::*;

/// CRC-24Q generator polynomial without the implicit x^24 term.
pub const CRC24Q_POLY: u32 = 0x86_4cfb;

const CRC24Q: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_24_LTE_A);

/// CRC-24Q over a byte aligned span, as used for the RTCM 3 frame trailer.
#[must_use]
pub fn crc24q(dat: &[u8]) -> u32 {
    CRC24Q.checksum(dat)
}

/// CRC-24Q over `len` bits of `buf` starting at bit `offset`.
///
/// Identical to [crc24q] for byte aligned spans, but can be computed over a span that
/// starts or ends mid-byte.
///
/// # Errors
/// [Error::OutOfRange] if the span extends past the end of `buf`.
pub fn crc24q_bits(buf: &[u8], offset: usize, len: usize) -> Result<u32> {
    if offset + len > buf.len() * 8 {
        return Err(Error::OutOfRange {
            offset,
            width: u32::try_from(len).unwrap_or(u32::MAX),
            available: buf.len() * 8,
        });
    }
    let mut crc = 0u32;
    let mut pos = offset;
    let end = offset + len;
    while pos < end {
        // whole bytes where possible, single bits otherwise
        let width: u32 = if end - pos >= 8 { 8 } else { 1 };
        let (value, next) = read_unsigned(buf, pos, width)?;
        for i in (0..width).rev() {
            let bit = ((value >> i) & 1) as u32;
            let top = ((crc >> 23) & 1) ^ bit;
            crc = (crc << 1) & 0xff_ffff;
            if top == 1 {
                crc ^= CRC24Q_POLY;
            }
        }
        pos = next;
    }
    Ok(crc)
}
