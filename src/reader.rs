// Copyright (c) 2024-present, paldb contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{bloom::BloomFilter, file::FORMAT_VERSION, hash, varint};
use byteorder::{BigEndian, ReadBytesExt};
use memmap2::Mmap;
use std::{
    fs::File,
    io::{Cursor, Read},
    path::Path,
};

struct DirectoryEntry {
    num_slots: u64,
    slot_size: u32,
    index_offset: u64,
    data_offset: u64,
}

/// Read-only view of a finished store file
///
/// The file is memory-mapped as a whole; lookups probe the per-key-length
/// hash table for the queried key's length and return value slices borrowed
/// straight from the map.
///
/// # Example usage
///
/// ```
/// # use paldb::{Config, StoreReader, StoreWriter};
/// # fn main() -> paldb::Result<()> {
/// # let folder = tempfile::tempdir()?;
/// # let path = folder.path().join("lookup.paldb");
/// # let mut writer = StoreWriter::new(Config::default(), std::fs::File::create(&path)?)?;
/// # writer.put(b"de", b"Germany")?;
/// # writer.finish()?;
/// let reader = StoreReader::open(&path)?;
///
/// assert_eq!(Some(b"Germany" as &[u8]), reader.get(b"de")?);
/// assert_eq!(None, reader.get(b"xx")?);
/// # Ok(())
/// # }
/// ```
pub struct StoreReader {
    mmap: Mmap,

    created_at_ms: u64,
    key_count: u64,

    filter: Option<BloomFilter>,

    /// Directory entries indexed by key length
    entries: Vec<Option<DirectoryEntry>>,

    index_region_start: u64,
    data_region_start: u64,
}

impl StoreReader {
    /// Opens a store file and parses its metadata header.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedVersion` if the file leads with an unknown
    /// format-version tag, and `CorruptFormat` or `Io` if the header is
    /// malformed or unreadable.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let file = File::open(path)?;

        // SAFETY: store files are immutable once written; concurrent
        // modification is outside the format's contract
        #[expect(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };

        let mut reader = Cursor::new(&mmap[..]);

        let tag_len = reader.read_u16::<BigEndian>()?;
        let mut tag = vec![0; usize::from(tag_len)];
        reader.read_exact(&mut tag)?;

        if tag != FORMAT_VERSION.as_bytes() {
            return Err(crate::Error::UnsupportedVersion(
                String::from_utf8_lossy(&tag).into_owned(),
            ));
        }

        let created_at_ms = reader.read_u64::<BigEndian>()?;
        let key_count = reader.read_u64::<BigEndian>()?;

        let filter_bit_size = reader.read_u32::<BigEndian>()?;
        let filter_word_count = reader.read_u32::<BigEndian>()?;
        let filter_hash_functions = reader.read_u32::<BigEndian>()?;

        let filter = if filter_bit_size > 0 {
            let mut words = Vec::with_capacity(filter_word_count as usize);

            for _ in 0..filter_word_count {
                words.push(reader.read_u64::<BigEndian>()?);
            }

            Some(BloomFilter::from_parts(
                filter_bit_size as usize,
                words,
                filter_hash_functions as usize,
            ))
        } else {
            None
        };

        let directory_len = reader.read_u32::<BigEndian>()?;
        let max_key_len = reader.read_u32::<BigEndian>()?;

        let mut entries = Vec::new();
        entries.resize_with(max_key_len as usize + 1, || None);

        for _ in 0..directory_len {
            let key_len = reader.read_u32::<BigEndian>()?;
            let _key_count = reader.read_u64::<BigEndian>()?;
            let num_slots = reader.read_u64::<BigEndian>()?;
            let slot_size = reader.read_u32::<BigEndian>()?;
            let index_offset = reader.read_u64::<BigEndian>()?;
            let data_offset = reader.read_u64::<BigEndian>()?;

            let slot = entries
                .get_mut(key_len as usize)
                .ok_or(crate::Error::CorruptFormat(
                    "directory entry beyond max key length",
                ))?;

            *slot = Some(DirectoryEntry {
                num_slots,
                slot_size,
                index_offset,
                data_offset,
            });
        }

        let index_region_start = reader.read_u64::<BigEndian>()?;
        let data_region_start = reader.read_u64::<BigEndian>()?;

        if index_region_start != reader.position() {
            return Err(crate::Error::CorruptFormat(
                "index region start does not follow the header",
            ));
        }

        Ok(Self {
            mmap,
            created_at_ms,
            key_count,
            filter,
            entries,
            index_region_start,
            data_region_start,
        })
    }

    /// Looks up the value stored for `key`.
    ///
    /// The returned slice borrows from the underlying map.
    ///
    /// # Errors
    ///
    /// Returns `CorruptFormat` if a probed slot or value points outside
    /// the file.
    pub fn get(&self, key: &[u8]) -> crate::Result<Option<&[u8]>> {
        let Some(entry) = self.entries.get(key.len()).and_then(Option::as_ref) else {
            return Ok(None);
        };

        if let Some(filter) = &self.filter {
            if !filter.contains(key) {
                return Ok(None);
            }
        }

        let key_hash = u64::from(hash::hash32(key));
        let slot_size = u64::from(entry.slot_size);
        let table_start = self.index_region_start + entry.index_offset;

        for probe in 0..entry.num_slots {
            let slot = (key_hash + probe) % entry.num_slots;

            #[expect(clippy::cast_possible_truncation, reason = "file offsets fit usize on supported targets")]
            let pos = (table_start + slot * slot_size) as usize;

            let slot_bytes = self
                .mmap
                .get(pos..pos + entry.slot_size as usize)
                .ok_or(crate::Error::CorruptFormat("slot out of file bounds"))?;

            let (data_offset, _) = varint::unpack_u64_at(slot_bytes, key.len())?;

            if data_offset == 0 {
                // Probe chain ends at the first empty slot
                return Ok(None);
            }

            if &slot_bytes[..key.len()] == key {
                return self.read_value(entry, data_offset).map(Some);
            }
        }

        Ok(None)
    }

    fn read_value(&self, entry: &DirectoryEntry, data_offset: u64) -> crate::Result<&[u8]> {
        #[expect(clippy::cast_possible_truncation, reason = "file offsets fit usize on supported targets")]
        let pos = (self.data_region_start + entry.data_offset + data_offset) as usize;

        let encoded = self
            .mmap
            .get(pos..)
            .ok_or(crate::Error::CorruptFormat("value offset out of file bounds"))?;

        let (value_size, size_len) = varint::unpack_u32_at(encoded, 0)?;

        encoded
            .get(size_len..size_len + value_size as usize)
            .ok_or(crate::Error::CorruptFormat("value out of file bounds"))
    }

    /// Number of keys in the store
    #[must_use]
    pub fn len(&self) -> u64 {
        self.key_count
    }

    /// Returns `true` if the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key_count == 0
    }

    /// Build timestamp, milliseconds since the Unix epoch
    #[must_use]
    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }
}
