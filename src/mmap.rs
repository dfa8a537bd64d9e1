// Copyright (c) 2024-present, paldb contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use memmap2::{MmapMut, MmapOptions};
use std::fs::File;

/// A logical writable byte array over a file, spread across
/// multiple bounded memory mappings
///
/// Index files may exceed what a single mapping should cover, so the file
/// is mapped as consecutive disjoint segments of at most `segment_size`
/// bytes each. Reads and writes that straddle a segment boundary are split
/// across consecutive segments, repeating through further segments when the
/// requested range is larger than a segment's remainder.
///
/// Mappings are dropped with the value; callers must drop (or `flush` then
/// drop) the array before reopening the file as a plain stream.
pub struct SegmentArray {
    segments: Vec<MmapMut>,
    segment_size: u64,
    len: u64,
}

impl SegmentArray {
    /// Maps `len` bytes of the file as read-write segments.
    ///
    /// The file must already have at least `len` bytes.
    pub fn map(file: &File, len: u64, segment_size: u64) -> std::io::Result<Self> {
        assert!(segment_size > 0, "segment size must be positive");

        #[expect(
            clippy::cast_possible_truncation,
            reason = "segment length is bounded by segment_size which fits usize on supported targets"
        )]
        let mut segments = Vec::with_capacity(len.div_ceil(segment_size) as usize);

        let mut offset = 0;

        while offset < len {
            let segment_len = segment_size.min(len - offset) as usize;

            // SAFETY: the mapping covers a region of a file this builder
            // exclusively owns; it is never resized while mapped
            #[expect(unsafe_code)]
            let mmap = unsafe {
                MmapOptions::new()
                    .offset(offset)
                    .len(segment_len)
                    .map_mut(file)?
            };

            segments.push(mmap);
            offset += segment_len as u64;
        }

        Ok(Self {
            segments,
            segment_size,
            len,
        })
    }

    /// Logical length in bytes
    #[must_use]
    #[expect(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Reads `buf.len()` bytes starting at `offset`, splitting across
    /// segments as needed.
    pub fn read_at(&self, offset: u64, mut buf: &mut [u8]) {
        assert!(
            offset + buf.len() as u64 <= self.len,
            "read beyond mapped length",
        );

        #[expect(clippy::cast_possible_truncation, reason = "bounded by segment_size")]
        let mut segment_idx = (offset / self.segment_size) as usize;
        #[expect(clippy::cast_possible_truncation, reason = "bounded by segment_size")]
        let mut segment_off = (offset % self.segment_size) as usize;

        while !buf.is_empty() {
            #[expect(clippy::expect_used, reason = "bounds asserted above")]
            let segment = self.segments.get(segment_idx).expect("should be in bounds");

            let chunk = buf.len().min(segment.len() - segment_off);
            buf[..chunk].copy_from_slice(&segment[segment_off..segment_off + chunk]);

            buf = &mut buf[chunk..];
            segment_idx += 1;
            segment_off = 0;
        }
    }

    /// Writes `bytes` starting at `offset`, splitting across segments
    /// as needed.
    pub fn write_at(&mut self, offset: u64, mut bytes: &[u8]) {
        assert!(
            offset + bytes.len() as u64 <= self.len,
            "write beyond mapped length",
        );

        #[expect(clippy::cast_possible_truncation, reason = "bounded by segment_size")]
        let mut segment_idx = (offset / self.segment_size) as usize;
        #[expect(clippy::cast_possible_truncation, reason = "bounded by segment_size")]
        let mut segment_off = (offset % self.segment_size) as usize;

        while !bytes.is_empty() {
            #[expect(clippy::expect_used, reason = "bounds asserted above")]
            let segment = self
                .segments
                .get_mut(segment_idx)
                .expect("should be in bounds");

            let chunk = bytes.len().min(segment.len() - segment_off);
            segment[segment_off..segment_off + chunk].copy_from_slice(&bytes[..chunk]);

            bytes = &bytes[chunk..];
            segment_idx += 1;
            segment_off = 0;
        }
    }

    /// Flushes all segments to disk.
    pub fn flush(&self) -> std::io::Result<()> {
        for segment in &self.segments {
            segment.flush()?;
        }

        Ok(())
    }
}
