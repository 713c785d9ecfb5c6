//! # LZSS Codec
//!
//! Decoder for the level resource compression scheme.
//!
//! The stream is a sequence of tokens grouped by 8 under an id byte. Bit
//! `n` of the id byte (LSB first) selects the kind of token `n`:
//!
//! - `0`: one literal byte
//! - `1`: two bytes `a b` encoding a back reference; distance is
//!   `(a << 4 | b >> 4) + 1` and length `(b & 0xF) + 1`. A length of 1
//!   ends the stream.

use alloc::vec::Vec;

/// Stream decoding failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LzssError {
    /// Input ended before the end-of-stream token
    UnexpectedEof,
    /// A back reference points before the start of the output
    BadReference {
        /// Output position of the token
        at: usize,
        /// Distance it referenced
        distance: usize,
    },
    /// Output would exceed the caller's limit
    OutputTooLarge,
}

/// Decode `src` into `dst`, replacing its contents
///
/// `limit` bounds the decoded size so a corrupt stream cannot grow the
/// output without bound.
pub fn decode_into(src: &[u8], dst: &mut Vec<u8>, limit: usize) -> Result<(), LzssError> {
    dst.clear();

    let mut pos = 0usize;
    let mut id_byte = 0u32;
    let mut tokens_left = 0u32;

    loop {
        if tokens_left == 0 {
            id_byte = *src.get(pos).ok_or(LzssError::UnexpectedEof)? as u32;
            pos += 1;
            tokens_left = 8;
        }
        tokens_left -= 1;

        if id_byte & 1 != 0 {
            let a = *src.get(pos).ok_or(LzssError::UnexpectedEof)? as usize;
            let b = *src.get(pos + 1).ok_or(LzssError::UnexpectedEof)? as usize;
            pos += 2;

            let distance = ((a << 4) | (b >> 4)) + 1;
            let length = (b & 0xF) + 1;

            if length == 1 {
                return Ok(());
            }
            if distance > dst.len() {
                return Err(LzssError::BadReference {
                    at: dst.len(),
                    distance,
                });
            }
            if dst.len() + length > limit {
                return Err(LzssError::OutputTooLarge);
            }

            // Byte by byte: the source run may overlap what is being written
            let start = dst.len() - distance;
            for i in 0..length {
                let byte = dst[start + i];
                dst.push(byte);
            }
        } else {
            let byte = *src.get(pos).ok_or(LzssError::UnexpectedEof)?;
            pos += 1;

            if dst.len() + 1 > limit {
                return Err(LzssError::OutputTooLarge);
            }
            dst.push(byte);
        }

        id_byte >>= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    // "abcabcabcX" as: 3 literals, ref(distance 3, length 6), literal, end
    const STREAM: [u8; 10] = [
        0b0010_1000, // tokens: lit lit lit ref lit ref(end)
        b'a',
        b'b',
        b'c',
        0x00,
        0x25, // distance (0 << 4 | 2) + 1 = 3, length 5 + 1 = 6
        b'X',
        0x00,
        0x00, // length 1: end of stream
        0xFF, // trailing garbage is never read
    ];

    #[test]
    fn test_decode_overlapping_reference() {
        let mut out = Vec::new();
        decode_into(&STREAM, &mut out, 64).unwrap();
        assert_eq!(out, b"abcabcabcX".to_vec());
    }

    #[test]
    fn test_decode_truncated() {
        let mut out = Vec::new();
        assert_eq!(
            decode_into(&STREAM[..5], &mut out, 64),
            Err(LzssError::UnexpectedEof)
        );
    }

    #[test]
    fn test_decode_reference_before_start() {
        let stream = vec![0b0000_0001, 0x00, 0x13];
        let mut out = Vec::new();
        assert!(matches!(
            decode_into(&stream, &mut out, 64),
            Err(LzssError::BadReference { at: 0, distance: 2 })
        ));
    }

    #[test]
    fn test_decode_respects_limit() {
        let mut out = Vec::new();
        assert_eq!(
            decode_into(&STREAM, &mut out, 4),
            Err(LzssError::OutputTooLarge)
        );
    }
}
