// Copyright (c) 2024-present, paldb contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::io::Cursor;

/// Hash seed fixed by the on-disk format; readers must use the same seed.
pub const SEED: u32 = 42;

/// Hashes raw key bytes for slot placement.
#[expect(clippy::expect_used, reason = "reading from a slice cannot fail")]
pub fn hash32(bytes: &[u8]) -> u32 {
    murmur3::murmur3_32(&mut Cursor::new(bytes), SEED).expect("cannot fail")
}

/// Hashes raw key bytes into the two 64-bit halves used for bloom double hashing.
#[expect(clippy::expect_used, reason = "reading from a slice cannot fail")]
#[expect(clippy::cast_possible_truncation, reason = "intentional split into halves")]
pub fn hash128(bytes: &[u8]) -> (u64, u64) {
    let hash = murmur3::murmur3_x64_128(&mut Cursor::new(bytes), SEED).expect("cannot fail");

    (hash as u64, (hash >> 64) as u64)
}
