use crate::{bitstream::Bitstream, Error};
use log::debug;

/// Size of the big-endian length written in front of every payload.
pub const LENGTH_PREFIX: usize = 3;

/// The largest payload the length prefix can describe.
pub const MAX_PAYLOAD: usize = (1 << (8 * LENGTH_PREFIX)) - 1;

const BITS: usize = u8::BITS as usize;

/// Expand a byte into its bits, most significant first.
/// ```rust
/// # use pngsteg::byte::byte_to_bits;
/// assert_eq!(byte_to_bits(0b0100_1000), [0, 1, 0, 0, 1, 0, 0, 0]);
/// ```
pub fn byte_to_bits(byte: u8) -> [u8; 8] {
    let mut bits = [0; 8];
    for (index, bit) in bits.iter_mut().enumerate() {
        *bit = (byte >> (7 - index)) & 1;
    }
    bits
}

/// Inverse of [`byte_to_bits`]. Only the low bit of each element is used.
pub fn bits_to_byte(bits: &[u8; 8]) -> u8 {
    bits.iter().fold(0, |byte, bit| (byte << 1) | (bit & 1))
}

/// Bitstream position of the `index`-th carrier bit: the LSB of the `index`-th sample.
fn carrier(index: usize) -> usize {
    BITS * index + (BITS - 1)
}

/// Number of carrier bits, one per color sample.
pub fn carrier_bits(bits: &Bitstream) -> usize {
    bits.len() / BITS
}

/// Largest payload in bytes that fits next to the length prefix.
pub fn capacity(bits: &Bitstream) -> usize {
    (carrier_bits(bits) / BITS)
        .saturating_sub(LENGTH_PREFIX)
        .min(MAX_PAYLOAD)
}

/// Hide `data` in the least significant bit of every color sample.
///
/// Nothing is written unless the prefixed payload fits in its entirety; carrier
/// bits past the payload keep their original value.
pub fn encode(bits: &mut Bitstream, data: &[u8]) -> Result<(), Error> {
    if data.len() > MAX_PAYLOAD {
        return Err(Error::PayloadTooLarge {
            length: data.len(),
            max: MAX_PAYLOAD,
        });
    }
    let available = carrier_bits(bits);
    let required = (LENGTH_PREFIX + data.len()) * BITS;
    if required > available {
        return Err(Error::Capacity {
            required,
            available,
        });
    }

    let size = (data.len() as u32).to_be_bytes();
    let prefixed = size[size.len() - LENGTH_PREFIX..].iter().chain(data);
    let payload_bits = prefixed.flat_map(|byte| byte_to_bits(*byte));
    for (index, bit) in payload_bits.enumerate() {
        bits.set(carrier(index), bit);
    }
    debug!("Wrote {required} of {available} carrier bits");
    Ok(())
}

/// Read `count` bytes starting at carrier byte `offset`.
fn decode_raw(bits: &Bitstream, offset: usize, count: usize) -> Vec<u8> {
    (offset..offset + count)
        .map(|byte| {
            let mut chunk = [0; 8];
            for (index, bit) in chunk.iter_mut().enumerate() {
                *bit = bits.get(carrier(byte * BITS + index)).unwrap_or(0);
            }
            bits_to_byte(&chunk)
        })
        .collect()
}

/// Recover a payload hidden by [`encode`].
///
/// The length prefix is read first, then exactly that many bytes. A prefix
/// claiming more than the image holds is an error rather than a short result.
pub fn decode(bits: &Bitstream) -> Result<Vec<u8>, Error> {
    let available = carrier_bits(bits) / BITS;
    if available < LENGTH_PREFIX {
        return Err(Error::Truncated {
            declared: LENGTH_PREFIX,
            available,
        });
    }
    let size = decode_raw(bits, 0, LENGTH_PREFIX)
        .into_iter()
        .fold(0usize, |size, byte| (size << 8) | usize::from(byte));
    if LENGTH_PREFIX + size > available {
        return Err(Error::Truncated {
            declared: size,
            available: available - LENGTH_PREFIX,
        });
    }
    debug!("Found a {size} byte payload");
    Ok(decode_raw(bits, LENGTH_PREFIX, size))
}

#[cfg(test)]
mod test {
    use super::*;

    fn carrier_of(pixels: usize) -> Bitstream {
        // 1 pixel wide, alpha is dropped by the projection
        let raw: Vec<u8> = (0..pixels)
            .flat_map(|index| [index as u8, index as u8, index as u8, 0x7F])
            .collect();
        Bitstream::from_rows(&raw, 1)
    }

    #[test]
    fn bit_codec_inverse() {
        for byte in 0..=u8::MAX {
            assert_eq!(bits_to_byte(&byte_to_bits(byte)), byte);
        }
        assert_eq!(bits_to_byte(&[1, 0, 0, 0, 0, 0, 0, 1]), 0x81);
    }

    #[test]
    fn length_prefix() {
        let mut bits = carrier_of(40);
        let payload = b"Hello";
        encode(&mut bits, payload).unwrap();

        let carried: Vec<u8> = (0..(LENGTH_PREFIX + payload.len()) * BITS)
            .map(|index| bits.get(index * BITS + 7).unwrap())
            .collect();
        let bytes: Vec<u8> = carried
            .chunks_exact(BITS)
            .map(|chunk| bits_to_byte(chunk.try_into().unwrap()))
            .collect();
        assert_eq!(&bytes[..3], &[0, 0, 5]);
        assert_eq!(&bytes[3..], payload);
    }

    #[test]
    fn encode_decode() {
        let mut bits = carrier_of(40);
        let msg = "Hello World";
        encode(&mut bits, msg.as_bytes()).unwrap();
        assert_eq!(decode(&bits).unwrap(), msg.as_bytes());
    }

    #[test]
    fn only_lsb_changes() {
        let original = carrier_of(30);
        let mut bits = original.clone();
        encode(&mut bits, &[0xFF; 4]).unwrap();
        for position in 0..bits.len() {
            if position % BITS != BITS - 1 {
                assert_eq!(bits.get(position), original.get(position));
            }
        }
        // carrier bits past the payload are untouched
        let end = (LENGTH_PREFIX + 4) * BITS;
        for index in end..carrier_bits(&bits) {
            assert_eq!(bits.get(carrier(index)), original.get(carrier(index)));
        }
    }

    #[test]
    fn capacity_exact() {
        // 10 pixels, 30 samples, 3 carrier bytes are the prefix
        let bits = carrier_of(10);
        assert_eq!(capacity(&bits), 0);
        let bits = carrier_of(16);
        assert_eq!(capacity(&bits), 3);

        let mut bits = carrier_of(16);
        encode(&mut bits, b"abc").unwrap();
        assert_eq!(decode(&bits).unwrap(), b"abc");
    }

    #[test]
    fn too_large() {
        let mut bits = carrier_of(16);
        let original = bits.clone();
        let err = encode(&mut bits, b"abcd").unwrap_err();
        assert!(matches!(
            err,
            Error::Capacity {
                required: 56,
                available: 48
            }
        ));
        assert_eq!(bits, original);
    }

    #[test]
    fn prefix_overflow() {
        let mut bits = carrier_of(16);
        let original = bits.clone();
        let err = encode(&mut bits, &vec![0; MAX_PAYLOAD + 1]).unwrap_err();
        assert!(matches!(
            err,
            Error::PayloadTooLarge {
                length,
                max: 0xFF_FFFF
            } if length == MAX_PAYLOAD + 1
        ));
        assert_eq!(bits, original);
    }

    #[test]
    fn truncated() {
        let mut bits = carrier_of(16);
        // claim a 0xFFFFFF byte payload
        for index in 0..LENGTH_PREFIX * BITS {
            bits.set(carrier(index), 1);
        }
        assert!(matches!(
            decode(&bits),
            Err(Error::Truncated {
                declared: 0xFF_FFFF,
                available: 3
            })
        ));
        assert!(matches!(
            decode(&carrier_of(7)),
            Err(Error::Truncated { available: 2, .. })
        ));
    }
}
