/// XOR of every byte in `dat`. Used by NMEA for the bytes between the start marker and
/// the `*` terminator. An empty span yields 0.
#[must_use]
pub fn xor_checksum(dat: &[u8]) -> u8 {
    dat.iter().fold(0, |acc, b| acc ^ b)
}

/// Render an XOR checksum as the two upper-case hex digits written after `*`.
#[must_use]
pub fn xor_checksum_hex(sum: u8) -> [u8; 2] {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    [DIGITS[(sum >> 4) as usize], DIGITS[(sum & 0xf) as usize]]
}

/// 8-bit Fletcher running-sum pair `(ck_a, ck_b)` as used by UBX.
///
/// For each byte `a += byte; b += a`, both modulo 256.
#[must_use]
pub fn running_sum(dat: &[u8]) -> (u8, u8) {
    let mut ck_a = 0u8;
    let mut ck_b = 0u8;
    for byte in dat {
        ck_a = ck_a.wrapping_add(*byte);
        ck_b = ck_b.wrapping_add(ck_a);
    }
    (ck_a, ck_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xor_empty_is_zero() {
        assert_eq!(xor_checksum(&[]), 0);
        assert_eq!(&xor_checksum_hex(xor_checksum(&[])), b"00");
    }

    #[test]
    fn xor_known_sentence() {
        let sum = xor_checksum(b"GPGLL,4916.45,N,12311.12,W,225444,A");
        assert_eq!(sum, 0x31);
        assert_eq!(&xor_checksum_hex(sum), b"31");
    }

    #[test]
    fn xor_hex_is_upper_case() {
        assert_eq!(&xor_checksum_hex(0x4d), b"4D");
        assert_eq!(&xor_checksum_hex(0xfa), b"FA");
    }

    #[test]
    fn running_sum_ack_ack() {
        // UBX-ACK-ACK for CFG-PRT: b5 62 05 01 02 00 06 00 0e 37
        assert_eq!(running_sum(&[0x05, 0x01, 0x02, 0x00, 0x06, 0x00]), (0x0e, 0x37));
    }

    #[test]
    fn running_sum_wraps() {
        let dat = [0xffu8; 300];
        let (a, b) = running_sum(&dat);
        let expected_a = (300u32 * 0xff % 256) as u8;
        let expected_b = ((1..=300u32).map(|i| i * 0xff).sum::<u32>() % 256) as u8;
        assert_eq!((a, b), (expected_a, expected_b));
    }
}
