// Copyright (c) 2024-present, paldb contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{bloom::BloomFilter, file::FORMAT_VERSION};
use byteorder::{BigEndian, WriteBytesExt};
use std::io::Write;

/// Directory entry describing one per-key-length region pair
///
/// Region offsets are relative to the start of the index region
/// resp. the data region, not to the file.
pub struct DirectoryEntry {
    pub key_len: u32,
    pub key_count: u64,
    pub num_slots: u64,
    pub slot_size: u32,
    pub index_offset: u64,
    pub data_offset: u64,
}

/// Serializes the metadata header.
///
/// All fixed-width fields are big-endian. The two trailing u64 fields make
/// the header self-describing: `index_region_start` equals the total header
/// length, `data_region_start` equals it plus the index region length.
pub fn encode(
    entries: &[DirectoryEntry],
    filter: Option<&BloomFilter>,
    key_count: u64,
    max_key_len: u32,
    index_region_len: u64,
    created_at_ms: u64,
) -> crate::Result<Vec<u8>> {
    let mut buf = vec![];

    let tag = FORMAT_VERSION.as_bytes();

    #[expect(clippy::cast_possible_truncation, reason = "tag is a short constant")]
    buf.write_u16::<BigEndian>(tag.len() as u16)?;
    buf.write_all(tag)?;

    buf.write_u64::<BigEndian>(created_at_ms)?;
    buf.write_u64::<BigEndian>(key_count)?;

    if let Some(filter) = filter {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "the format caps the filter at 2^32 bits"
        )]
        buf.write_u32::<BigEndian>(filter.bit_size() as u32)?;

        #[expect(
            clippy::cast_possible_truncation,
            reason = "the format caps the filter at 2^32 bits"
        )]
        buf.write_u32::<BigEndian>(filter.words().len() as u32)?;

        #[expect(clippy::cast_possible_truncation, reason = "k is a small positive number")]
        buf.write_u32::<BigEndian>(filter.hash_functions() as u32)?;

        for word in filter.words() {
            buf.write_u64::<BigEndian>(*word)?;
        }
    } else {
        buf.write_u32::<BigEndian>(0)?;
        buf.write_u32::<BigEndian>(0)?;
        buf.write_u32::<BigEndian>(0)?;
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "distinct key lengths are bounded by the max key length"
    )]
    buf.write_u32::<BigEndian>(entries.len() as u32)?;
    buf.write_u32::<BigEndian>(max_key_len)?;

    for entry in entries {
        buf.write_u32::<BigEndian>(entry.key_len)?;
        buf.write_u64::<BigEndian>(entry.key_count)?;
        buf.write_u64::<BigEndian>(entry.num_slots)?;
        buf.write_u32::<BigEndian>(entry.slot_size)?;
        buf.write_u64::<BigEndian>(entry.index_offset)?;
        buf.write_u64::<BigEndian>(entry.data_offset)?;
    }

    // The index region starts right after this header, so the absolute
    // start equals the header length including the two trailing fields
    let index_region_start = buf.len() as u64 + 16;

    buf.write_u64::<BigEndian>(index_region_start)?;
    buf.write_u64::<BigEndian>(index_region_start + index_region_len)?;

    Ok(buf)
}
