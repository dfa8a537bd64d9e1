// Copyright (c) 2024-present, paldb contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Store configuration builder
///
/// The build core consumes `load_factor`, `mmap_segment_size` and the two
/// bloom settings. The remaining options are contract-stable pass-throughs
/// for the reader and upstream typed layers; they do not change how the
/// store file is built.
#[derive(Clone, Debug)]
pub struct Config {
    /// Target fill ratio of each per-key-length hash table
    ///
    /// Must be in `(0.0, 1.0)` exclusive.
    pub load_factor: f64,

    /// Maximum size in bytes of a single memory mapping during index build
    ///
    /// Index files larger than this are covered by multiple consecutive
    /// mappings. Must be positive.
    pub mmap_segment_size: u64,

    /// Whether to build and embed a bloom filter
    pub bloom_filter_enabled: bool,

    /// Target false-positive probability of the bloom filter
    ///
    /// Must be in `(0.0, 1.0)` exclusive.
    pub bloom_error_factor: f64,

    /// Whether the reader should memory-map the data region
    ///
    /// Reader-side option, ignored by the build core.
    pub mmap_data_enabled: bool,

    /// Whether upstream layers may overwrite a key before the build
    ///
    /// Consumed by upstream API layers, not by the build core.
    pub allow_duplicates: bool,

    /// Element count of upstream write buffers
    ///
    /// Consumed by upstream API layers, not by the build core.
    pub write_buffer_elements: usize,

    /// Whether upstream layers compress values before handing them down
    ///
    /// Consumed by upstream API layers, not by the build core.
    pub compression_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            load_factor: 0.75,
            mmap_segment_size: /* 1 GiB */ 1_024 * 1_024 * 1_024,
            bloom_filter_enabled: false,
            bloom_error_factor: 0.01,
            mmap_data_enabled: false,
            allow_duplicates: false,
            write_buffer_elements: 0,
            compression_enabled: false,
        }
    }
}

impl Config {
    /// Sets the target fill ratio of each hash table.
    ///
    /// Defaults to 0.75.
    #[must_use]
    pub fn use_load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Sets the maximum size per memory mapping during index build.
    ///
    /// Defaults to 1 GiB.
    #[must_use]
    pub fn use_mmap_segment_size(mut self, bytes: u64) -> Self {
        self.mmap_segment_size = bytes;
        self
    }

    /// Enables or disables the embedded bloom filter.
    ///
    /// Defaults to disabled.
    #[must_use]
    pub fn use_bloom_filter(mut self, enabled: bool) -> Self {
        self.bloom_filter_enabled = enabled;
        self
    }

    /// Sets the target false-positive probability of the bloom filter.
    ///
    /// Defaults to 0.01.
    #[must_use]
    pub fn use_bloom_error_factor(mut self, error_factor: f64) -> Self {
        self.bloom_error_factor = error_factor;
        self
    }

    /// Sets whether the reader should memory-map the data region.
    #[must_use]
    pub fn use_mmap_data(mut self, enabled: bool) -> Self {
        self.mmap_data_enabled = enabled;
        self
    }

    /// Sets whether upstream layers may overwrite a key before the build.
    #[must_use]
    pub fn use_allow_duplicates(mut self, enabled: bool) -> Self {
        self.allow_duplicates = enabled;
        self
    }

    /// Sets the element count of upstream write buffers.
    #[must_use]
    pub fn use_write_buffer_elements(mut self, elements: usize) -> Self {
        self.write_buffer_elements = elements;
        self
    }

    /// Sets whether upstream layers compress values.
    #[must_use]
    pub fn use_compression(mut self, enabled: bool) -> Self {
        self.compression_enabled = enabled;
        self
    }

    pub(crate) fn validate(&self) -> crate::Result<()> {
        if !(self.load_factor > 0.0 && self.load_factor < 1.0) {
            return Err(crate::Error::InvalidArgument(
                "load_factor must be in (0.0, 1.0)",
            ));
        }

        if self.mmap_segment_size == 0 {
            return Err(crate::Error::InvalidArgument(
                "mmap_segment_size must be positive",
            ));
        }

        if !(self.bloom_error_factor > 0.0 && self.bloom_error_factor < 1.0) {
            return Err(crate::Error::InvalidArgument(
                "bloom_error_factor must be in (0.0, 1.0)",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn config_rejects_load_factor_bounds() {
        assert!(Config::default().use_load_factor(0.0).validate().is_err());
        assert!(Config::default().use_load_factor(1.0).validate().is_err());
        assert!(Config::default().use_load_factor(1.5).validate().is_err());
        assert!(Config::default()
            .use_load_factor(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn config_rejects_zero_segment_size() {
        assert!(Config::default()
            .use_mmap_segment_size(0)
            .validate()
            .is_err());
    }

    #[test]
    fn config_rejects_error_factor_bounds() {
        assert!(Config::default()
            .use_bloom_error_factor(0.0)
            .validate()
            .is_err());
        assert!(Config::default()
            .use_bloom_error_factor(1.0)
            .validate()
            .is_err());
    }
}
