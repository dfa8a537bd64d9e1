// Copyright (c) 2024-present, paldb contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{bloom::BloomFilter, file, hash, mmap::SegmentArray, varint};
use std::{
    fs::{File, OpenOptions},
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

/// A finished per-key-length hash table, ready for merging
pub struct BuiltIndex {
    pub path: PathBuf,
    pub len: u64,
    pub collisions: u64,
}

/// Builds the open-addressing hash table for one key length.
///
/// Reads the `(key, packed offset)` records back from the index temp file
/// and places each into the first free slot along its linear probe
/// sequence. The table file is pre-sized and written through a mapped
/// segment array, so it may exceed a single mapping. The temp file is
/// deleted once the table is complete.
pub fn build(
    folder: &Path,
    key_len: usize,
    key_count: u64,
    num_slots: u64,
    max_offset_len: usize,
    segment_size: u64,
    index_stream_path: &Path,
    mut filter: Option<&mut BloomFilter>,
) -> crate::Result<BuiltIndex> {
    let slot_size = key_len + max_offset_len;
    let table_len = num_slots * slot_size as u64;

    log::trace!(
        "Building hash table for key length {key_len}: {key_count} keys over {num_slots} slots of {slot_size}B",
    );

    let path = file::index_file_path(folder, key_len);

    let table_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(&path)?;

    // Extends with zeroes, so every slot starts out empty
    table_file.set_len(table_len)?;

    let mut table = SegmentArray::map(&table_file, table_len, segment_size)?;
    debug_assert_eq!(table_len, table.len());

    let mut reader = BufReader::new(File::open(index_stream_path)?);

    let mut key = vec![0u8; key_len];
    let mut slot_buf = vec![0u8; slot_size];
    let mut record = Vec::with_capacity(slot_size);
    let mut collisions = 0u64;

    for _ in 0..key_count {
        reader.read_exact(&mut key)?;
        let offset = varint::unpack_u64(&mut reader)?;

        if let Some(filter) = filter.as_deref_mut() {
            filter.add(&key);
        }

        let key_hash = u64::from(hash::hash32(&key));

        let mut placed = false;

        for probe in 0..num_slots {
            let slot = (key_hash + probe) % num_slots;
            let pos = slot * slot_size as u64;

            table.read_at(pos, &mut slot_buf);

            // An all-zero offset field marks an empty slot; real offsets
            // are never 0 because of the reserved placeholder byte
            let (stored_offset, _) = varint::unpack_u64_at(&slot_buf, key_len)?;

            if stored_offset == 0 {
                record.clear();
                record.extend_from_slice(&key);
                varint::pack_u64(&mut record, offset)?;
                record.resize(slot_size, 0);

                table.write_at(pos, &record);

                if probe > 0 {
                    collisions += 1;
                }

                placed = true;
                break;
            }

            if slot_buf[..key_len] == key[..] {
                return Err(crate::Error::DuplicateKey(
                    key.clone().into_boxed_slice(),
                ));
            }
        }

        if !placed {
            return Err(crate::Error::CorruptFormat("hash table has no free slot"));
        }
    }

    // Release the mappings before the table file is reopened
    // as a plain stream during merge
    table.flush()?;
    drop(table);
    drop(table_file);

    std::fs::remove_file(index_stream_path)?;

    Ok(BuiltIndex {
        path,
        len: table_len,
        collisions,
    })
}
