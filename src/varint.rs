// Copyright (c) 2024-present, paldb contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Length-variable integer codec used for data offsets and value sizes.
//!
//! Little-endian continuation-bit scheme: each byte carries 7 payload bits,
//! the high bit signals that more bytes follow. Packers report how many
//! bytes they wrote so callers can size fixed-width slot fields; unpackers
//! stop at the terminator byte and never depend on total buffer length.

use std::io::{Read, Write};

/// Longest legal encoding of a packed u64, covering `[0, 2^63)`
pub const MAX_PACKED_U64: usize = 9;

/// Longest legal encoding of a packed u32
pub const MAX_PACKED_U32: usize = 5;

const CONTINUATION: u8 = 0x80;

/// Packs a u64 into 1-9 bytes, returning the number of bytes written.
pub fn pack_u64<W: Write>(writer: &mut W, mut value: u64) -> std::io::Result<usize> {
    let mut written = 1;

    while value >= u64::from(CONTINUATION) {
        writer.write_all(&[(value as u8) | CONTINUATION])?;
        value >>= 7;
        written += 1;
    }

    writer.write_all(&[value as u8])?;

    Ok(written)
}

/// Packs a u32 into 1-5 bytes, returning the number of bytes written.
pub fn pack_u32<W: Write>(writer: &mut W, value: u32) -> std::io::Result<usize> {
    pack_u64(writer, u64::from(value))
}

/// Unpacks a u64 from a byte stream.
pub fn unpack_u64<R: Read>(reader: &mut R) -> crate::Result<u64> {
    let mut value = 0u64;
    let mut byte = [0u8; 1];

    for idx in 0..MAX_PACKED_U64 {
        reader.read_exact(&mut byte)?;

        value |= u64::from(byte[0] & !CONTINUATION) << (idx * 7);

        if byte[0] & CONTINUATION == 0 {
            return Ok(value);
        }
    }

    Err(crate::Error::CorruptFormat("varint longer than 9 bytes"))
}

/// Unpacks a u64 from a buffer at the given position.
///
/// Returns the value and the number of bytes consumed.
pub fn unpack_u64_at(buf: &[u8], pos: usize) -> crate::Result<(u64, usize)> {
    let mut value = 0u64;

    for idx in 0..MAX_PACKED_U64 {
        let byte = *buf
            .get(pos + idx)
            .ok_or(crate::Error::CorruptFormat("truncated varint"))?;

        value |= u64::from(byte & !CONTINUATION) << (idx * 7);

        if byte & CONTINUATION == 0 {
            return Ok((value, idx + 1));
        }
    }

    Err(crate::Error::CorruptFormat("varint longer than 9 bytes"))
}

/// Unpacks a u32 from a buffer at the given position.
///
/// Returns the value and the number of bytes consumed.
pub fn unpack_u32_at(buf: &[u8], pos: usize) -> crate::Result<(u32, usize)> {
    let mut value = 0u32;

    for idx in 0..MAX_PACKED_U32 {
        let byte = *buf
            .get(pos + idx)
            .ok_or(crate::Error::CorruptFormat("truncated varint"))?;

        value |= u32::from(byte & !CONTINUATION) << (idx * 7);

        if byte & CONTINUATION == 0 {
            return Ok((value, idx + 1));
        }
    }

    Err(crate::Error::CorruptFormat("varint longer than 5 bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn roundtrip_u64(value: u64) {
        let mut buf = vec![];
        let written = pack_u64(&mut buf, value).expect("should pack");
        assert_eq!(buf.len(), written);
        assert!(written <= MAX_PACKED_U64);

        let read = unpack_u64(&mut &buf[..]).expect("should unpack");
        assert_eq!(value, read);

        let (read, consumed) = unpack_u64_at(&buf, 0).expect("should unpack");
        assert_eq!(value, read);
        assert_eq!(written, consumed);
    }

    #[test]
    fn varint_roundtrip_small() {
        for value in 0..=300 {
            roundtrip_u64(value);
        }
    }

    #[test]
    fn varint_roundtrip_boundaries() {
        for shift in 0..63 {
            roundtrip_u64(1 << shift);
            roundtrip_u64((1 << shift) - 1);
            roundtrip_u64((1 << shift) + 1);
        }
        roundtrip_u64((1 << 63) - 1);
    }

    #[test]
    fn varint_roundtrip_u32() {
        for value in [0u32, 1, 127, 128, 300, 16_383, 16_384, u32::MAX] {
            let mut buf = vec![];
            let written = pack_u32(&mut buf, value).expect("should pack");
            assert!(written <= MAX_PACKED_U32);

            let (read, consumed) = unpack_u32_at(&buf, 0).expect("should unpack");
            assert_eq!(value, read);
            assert_eq!(written, consumed);
        }
    }

    #[test]
    fn varint_encoded_length_is_minimal() {
        let mut buf = vec![];
        assert_eq!(1, pack_u64(&mut buf, 0).expect("should pack"));
        assert_eq!(1, pack_u64(&mut buf, 127).expect("should pack"));
        assert_eq!(2, pack_u64(&mut buf, 128).expect("should pack"));
        assert_eq!(2, pack_u64(&mut buf, 16_383).expect("should pack"));
        assert_eq!(3, pack_u64(&mut buf, 16_384).expect("should pack"));
        assert_eq!(9, pack_u64(&mut buf, (1 << 63) - 1).expect("should pack"));
    }

    #[test]
    fn varint_unpack_ignores_position_and_tail() {
        let mut buf = vec![0xFF, 0xFF];
        pack_u64(&mut buf, 5_000_000).expect("should pack");
        buf.extend_from_slice(&[0xAB, 0xCD]);

        let (read, _) = unpack_u64_at(&buf, 2).expect("should unpack");
        assert_eq!(5_000_000, read);
    }

    #[test]
    fn varint_rejects_overlong_encoding() {
        let buf = [CONTINUATION; 10];
        assert!(matches!(
            unpack_u64_at(&buf, 0),
            Err(crate::Error::CorruptFormat(_)),
        ));
        assert!(matches!(
            unpack_u32_at(&buf, 0),
            Err(crate::Error::CorruptFormat(_)),
        ));
        assert!(matches!(
            unpack_u64(&mut &buf[..]),
            Err(crate::Error::CorruptFormat(_)),
        ));
    }

    #[test]
    fn varint_rejects_truncated_buffer() {
        let buf = [CONTINUATION, CONTINUATION];
        assert!(matches!(
            unpack_u64_at(&buf, 0),
            Err(crate::Error::CorruptFormat(_)),
        ));
    }

    #[test]
    fn varint_zero_field_decodes_as_empty_marker() {
        // An all-zero slot offset field must decode to 0 in one byte
        let field = [0u8; 4];
        let (value, consumed) = unpack_u64_at(&field, 0).expect("should unpack");
        assert_eq!(0, value);
        assert_eq!(1, consumed);
    }
}
