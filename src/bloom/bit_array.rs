// Copyright (c) 2024-present, paldb contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

const WORD_BITS: usize = 64;

/// Fixed-size bit array backed by 64-bit words
///
/// Word-backed so the bloom payload serializes as whole words
/// into the store metadata.
#[derive(Debug, Eq, PartialEq)]
pub struct BitArray(Box<[u64]>);

impl BitArray {
    #[must_use]
    pub fn with_bit_capacity(bits: usize) -> Self {
        let words = bits.div_ceil(WORD_BITS);
        let vec = vec![0; words];
        Self(vec.into_boxed_slice())
    }

    #[must_use]
    pub fn from_words(words: Vec<u64>) -> Self {
        Self(words.into_boxed_slice())
    }

    /// Backing words, in index order
    #[must_use]
    pub fn words(&self) -> &[u64] {
        &self.0
    }

    /// Sets the i-th bit
    pub fn enable_bit(&mut self, idx: usize) {
        let word_idx = idx / WORD_BITS;
        let bit_idx = idx % WORD_BITS;

        #[expect(clippy::expect_used, reason = "callers index modulo the bit count")]
        let word = self.0.get_mut(word_idx).expect("should be in bounds");
        *word |= 1 << bit_idx;
    }

    /// Gets the i-th bit
    #[must_use]
    pub fn get(&self, idx: usize) -> bool {
        let word_idx = idx / WORD_BITS;
        let bit_idx = idx % WORD_BITS;

        #[expect(clippy::expect_used, reason = "callers index modulo the bit count")]
        let word = self.0.get(word_idx).expect("should be in bounds");
        (word >> bit_idx) & 1 == 1
    }
}
