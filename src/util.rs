//! General-purpose byte-string arithmetic.

/// Treat `number` as a little-endian, unsigned integer, and increment its value by 1.
///
/// Increments `number` in-place, wrapping to zero on overflow (the computation is calculated `mod
/// 2^(8 * len)`).
///
/// This function runs in constant time for a specific length of `number` (in bytes): Every byte
/// is visited regardless of where the carry stops. This is especially useful for incrementing
/// nonces for messages in sequence.
pub fn increment_le(number: &mut [u8]) {
    let mut carry = 1u16;

    for byte in number.iter_mut() {
        carry += u16::from(*byte);
        *byte = carry as u8;
        carry >>= 8;
    }
}

#[cfg(test)]
mod tests {
    use super::increment_le;

    #[test]
    fn increment_le_vectors() {
        let mut nonce = [0u8; 24];

        increment_le(&mut nonce);
        assert_eq!(
            &nonce,
            &[
                0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00
            ]
        );

        nonce.fill(0xff);
        increment_le(&mut nonce);
        assert_eq!(&nonce, &[0x00; 24]);

        nonce[1] = 0x01;
        increment_le(&mut nonce);
        assert_eq!(
            &nonce,
            &[
                0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00
            ]
        );

        nonce[0] = 0xff;
        nonce[1] = 0x00;
        nonce[2] = 0xff;
        increment_le(&mut nonce);
        assert_eq!(
            &nonce,
            &[
                0x00, 0x01, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00
            ]
        );

        // carry must stop at the end of the slice passed in, not run over the rest
        nonce.fill(0xfe);
        nonce[..6].fill(0xff);
        increment_le(&mut nonce[..8]);
        assert_eq!(
            &nonce,
            &[
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0xfe, 0xfe, 0xfe, 0xfe, 0xfe, 0xfe, 0xfe,
                0xfe, 0xfe, 0xfe, 0xfe, 0xfe, 0xfe, 0xfe, 0xfe, 0xfe, 0xfe
            ]
        );
    }

    #[test]
    fn increment_empty_is_noop() {
        let mut empty: [u8; 0] = [];
        increment_le(&mut empty);
    }

    #[test]
    fn increment_matches_u64() {
        let mut bytes = 0xffff_fffeu64.to_le_bytes();
        for expected in 0xffff_ffffu64..0x1_0000_0003 {
            increment_le(&mut bytes);
            assert_eq!(bytes, expected.to_le_bytes());
        }
    }
}
