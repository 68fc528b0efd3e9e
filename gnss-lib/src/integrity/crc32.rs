/// Reflected CRC-32 polynomial.
pub const CRC32_POLY: u32 = 0xedb8_8320;

/// Bit-at-a-time reflected CRC-32 (polynomial `0xEDB88320`) with a zero initial value
/// and no final xor, as used for the ComNav/OEM binary frame trailer.
///
/// The CRC of an empty span is 0.
#[must_use]
pub fn crc32(dat: &[u8]) -> u32 {
    let mut crc = 0u32;
    for byte in dat {
        crc ^= u32::from(*byte);
        for _ in 0..8 {
            crc = if crc & 1 == 1 {
                (crc >> 1) ^ CRC32_POLY
            } else {
                crc >> 1
            };
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    const OEM_CRC32: crc::Algorithm<u32> = crc::Algorithm {
        width: 32,
        poly: 0x04c1_1db7,
        init: 0,
        refin: true,
        refout: true,
        xorout: 0,
        check: 0x2dfd_2d88,
        residue: 0,
    };

    #[test]
    fn empty_is_zero() {
        assert_eq!(crc32(&[]), 0);
    }

    #[test]
    fn check_value() {
        assert_eq!(crc32(b"123456789"), 0x2dfd_2d88);
    }

    #[test]
    fn matches_table_driven_implementation() {
        let alg = crc::Crc::<u32>::new(&OEM_CRC32);
        let dat: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        for len in [1, 7, 28, 100, 1000] {
            assert_eq!(crc32(&dat[..len]), alg.checksum(&dat[..len]), "len={len}");
        }
    }
}
