// Copyright (c) 2024-present, paldb contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

mod bit_array;

use crate::hash;
use bit_array::BitArray;

/// A bloom filter over the full key set of a store
///
/// Sized up front from the final key count, then filled during index
/// build. The filter uses double hashing derived from the two 64-bit
/// halves of a 128-bit key hash instead of `k` independent hash
/// functions; the serialized word array embeds into the store metadata,
/// so builder and reader share one membership test.
#[derive(Debug)]
pub struct BloomFilter {
    /// Raw bits
    inner: BitArray,

    /// Bit count
    m: usize,

    /// Number of hash functions
    k: usize,
}

impl BloomFilter {
    /// Constructs a bloom filter that can hold `n` items
    /// while maintaining a certain false positive rate `fpr`.
    #[must_use]
    pub fn with_fp_rate(n: u64, fpr: f64) -> Self {
        use std::f64::consts::LN_2;

        let n = n.max(1);

        // NOTE: Some sensible minimum
        let fpr = fpr.max(0.000_000_1);

        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss,
            reason = "bit counts stay far below 2^52"
        )]
        let m = (-((n as f64) * fpr.ln()) / LN_2.powi(2)).ceil() as usize;

        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss,
            reason = "bits per key is a small positive number"
        )]
        let k = (((m as f64) / (n as f64)) * LN_2).ceil() as usize;

        Self {
            inner: BitArray::with_bit_capacity(m),
            m,
            k: k.max(1),
        }
    }

    /// Reassembles a filter from its serialized parts.
    #[must_use]
    pub fn from_parts(bit_size: usize, words: Vec<u64>, hash_functions: usize) -> Self {
        Self {
            inner: BitArray::from_words(words),
            m: bit_size,
            k: hash_functions,
        }
    }

    /// Number of bits
    #[must_use]
    pub fn bit_size(&self) -> usize {
        self.m
    }

    /// Number of hash functions
    #[must_use]
    pub fn hash_functions(&self) -> usize {
        self.k
    }

    /// Backing word array for serialization
    #[must_use]
    pub fn words(&self) -> &[u64] {
        self.inner.words()
    }

    /// Adds a key to the filter.
    pub fn add(&mut self, key: &[u8]) {
        let (mut h1, h2) = hash::hash128(key);

        for _ in 0..self.k {
            #[expect(clippy::cast_possible_truncation, reason = "index is taken modulo m")]
            self.inner.enable_bit((h1 % self.m as u64) as usize);

            h1 = h1.wrapping_add(h2);
        }
    }

    /// Returns `true` if the key may be contained.
    ///
    /// Will never have a false negative.
    #[must_use]
    pub fn contains(&self, key: &[u8]) -> bool {
        let (mut h1, h2) = hash::hash128(key);

        for _ in 0..self.k {
            #[expect(clippy::cast_possible_truncation, reason = "index is taken modulo m")]
            if !self.inner.get((h1 % self.m as u64) as usize) {
                return false;
            }

            h1 = h1.wrapping_add(h2);
        }

        true
    }
}
