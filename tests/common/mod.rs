#![allow(dead_code)]

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read};

/// One per-key-length directory entry, as laid out in the metadata header
pub struct Entry {
    pub key_len: u32,
    pub key_count: u64,
    pub num_slots: u64,
    pub slot_size: u32,
    pub index_offset: u64,
    pub data_offset: u64,
}

/// The parsed metadata header of a store file
pub struct Layout {
    pub version: String,
    pub created_at_ms: u64,
    pub key_count: u64,
    pub bloom_bit_size: u32,
    pub bloom_hash_functions: u32,
    pub bloom_words: Vec<u64>,
    pub max_key_len: u32,
    pub entries: Vec<Entry>,
    pub index_region_start: u64,
    pub data_region_start: u64,
}

impl Layout {
    pub fn entry(&self, key_len: u32) -> &Entry {
        self.entries
            .iter()
            .find(|e| e.key_len == key_len)
            .expect("store should have an entry for this key length")
    }
}

/// Parses the documented store header straight off the raw bytes,
/// independently of the reader implementation.
pub fn parse_layout(bytes: &[u8]) -> Layout {
    let mut reader = Cursor::new(bytes);

    let tag_len = reader.read_u16::<BigEndian>().unwrap();
    let mut tag = vec![0; tag_len.into()];
    reader.read_exact(&mut tag).unwrap();

    let version = String::from_utf8(tag).unwrap();
    let created_at_ms = reader.read_u64::<BigEndian>().unwrap();
    let key_count = reader.read_u64::<BigEndian>().unwrap();

    let bloom_bit_size = reader.read_u32::<BigEndian>().unwrap();
    let bloom_word_count = reader.read_u32::<BigEndian>().unwrap();
    let bloom_hash_functions = reader.read_u32::<BigEndian>().unwrap();

    let mut bloom_words = Vec::with_capacity(bloom_word_count as usize);
    for _ in 0..bloom_word_count {
        bloom_words.push(reader.read_u64::<BigEndian>().unwrap());
    }

    let directory_len = reader.read_u32::<BigEndian>().unwrap();
    let max_key_len = reader.read_u32::<BigEndian>().unwrap();

    let mut entries = Vec::with_capacity(directory_len as usize);
    for _ in 0..directory_len {
        entries.push(Entry {
            key_len: reader.read_u32::<BigEndian>().unwrap(),
            key_count: reader.read_u64::<BigEndian>().unwrap(),
            num_slots: reader.read_u64::<BigEndian>().unwrap(),
            slot_size: reader.read_u32::<BigEndian>().unwrap(),
            index_offset: reader.read_u64::<BigEndian>().unwrap(),
            data_offset: reader.read_u64::<BigEndian>().unwrap(),
        });
    }

    let index_region_start = reader.read_u64::<BigEndian>().unwrap();
    let data_region_start = reader.read_u64::<BigEndian>().unwrap();

    assert_eq!(
        reader.position(),
        index_region_start,
        "index region should start right after the header",
    );

    Layout {
        version,
        created_at_ms,
        key_count,
        bloom_bit_size,
        bloom_hash_functions,
        bloom_words,
        max_key_len,
        entries,
        index_region_start,
        data_region_start,
    }
}

/// Decodes a varint (7 payload bits per byte, high bit = continuation)
/// at `pos`, returning the value and the bytes consumed.
pub fn decode_varint(buf: &[u8], pos: usize) -> (u64, usize) {
    let mut value = 0u64;

    for idx in 0..10 {
        let byte = buf[pos + idx];
        value |= u64::from(byte & 0x7F) << (idx * 7);

        if byte & 0x80 == 0 {
            return (value, idx + 1);
        }
    }

    panic!("unterminated varint");
}

/// Collects all encoded values of one key length's data region,
/// in write order.
pub fn data_region_values(bytes: &[u8], layout: &Layout, key_len: u32) -> Vec<Vec<u8>> {
    let entry = layout.entry(key_len);

    let start = (layout.data_region_start + entry.data_offset) as usize;

    let end = layout
        .entries
        .iter()
        .filter(|e| e.data_offset > entry.data_offset)
        .map(|e| (layout.data_region_start + e.data_offset) as usize)
        .min()
        .unwrap_or(bytes.len());

    let region = &bytes[start..end];
    assert_eq!(
        0, region[0],
        "data region must lead with the placeholder byte",
    );

    let mut values = vec![];
    let mut pos = 1;

    while pos < region.len() {
        let (size, consumed) = decode_varint(region, pos);
        pos += consumed;
        values.push(region[pos..pos + size as usize].to_vec());
        pos += size as usize;
    }

    values
}

/// Returns the packed data offset stored in the slot holding `key`,
/// or panics if the key is not in its table.
pub fn slot_offset_of(bytes: &[u8], layout: &Layout, key: &[u8]) -> u64 {
    let entry = layout.entry(key.len() as u32);
    let table_start = (layout.index_region_start + entry.index_offset) as usize;
    let slot_size = entry.slot_size as usize;

    for slot in 0..entry.num_slots {
        let pos = table_start + slot as usize * slot_size;
        let slot_bytes = &bytes[pos..pos + slot_size];

        if &slot_bytes[..key.len()] == key {
            let (offset, _) = decode_varint(slot_bytes, key.len());
            assert_ne!(0, offset, "stored offsets are never zero");
            return offset;
        }
    }

    panic!("key not found in its hash table");
}
