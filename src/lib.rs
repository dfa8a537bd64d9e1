// Copyright (c) 2024-present, paldb contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! An embedded write-once/read-many key-value store for small-to-medium
//! immutable datasets (reference data, lookup tables, side inputs for
//! batch jobs).
//!
//! A store is built in a single pass from an unordered stream of
//! `(key, value)` byte pairs and ends up as one self-contained file that
//! supports O(1) point lookups through memory-mapped access.
//!
//! The build streams through disk: keys and values are bucketed by key
//! length into temp files, so the key set is never held in memory. On
//! finish, one open-addressing hash table per key length is written
//! directly into memory-mapped segment files, and everything is merged
//! behind a metadata header that locates each per-key-length region.
//! Consecutive puts of the same value share one encoded copy, and an
//! optional bloom filter (sized from the final key count) embeds into the
//! metadata.
//!
//! There is no update, no deletion and no range scan; rebuilding the file
//! is the only way to change it.
//!
//! # Example usage
//!
//! ```
//! use paldb::{Config, StoreReader, StoreWriter};
//! #
//! # let folder = tempfile::tempdir()?;
//! let path = folder.path().join("countries.paldb");
//!
//! let mut writer = StoreWriter::new(Config::default(), std::fs::File::create(&path)?)?;
//!
//! writer.put(b"de", b"Germany")?;
//! writer.put(b"fr", b"France")?;
//! writer.put(b"is", b"Iceland")?;
//!
//! // Builds the hash tables and assembles the final file
//! writer.finish()?;
//!
//! let reader = StoreReader::open(&path)?;
//!
//! assert_eq!(Some(b"France" as &[u8]), reader.get(b"fr")?);
//! assert_eq!(None, reader.get(b"uk")?);
//! #
//! # Ok::<(), paldb::Error>(())
//! ```

#![deny(unsafe_code)]
#![deny(clippy::all, missing_docs)]
#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![warn(clippy::multiple_crate_versions)]
#![allow(clippy::option_if_let_else)]

mod bloom;
mod config;
mod error;
mod file;
mod hash;
mod mmap;
mod reader;
mod time;
mod varint;
mod writer;

pub use {
    bloom::BloomFilter,
    config::Config,
    error::{Error, Result},
    file::FORMAT_VERSION,
    reader::StoreReader,
    writer::StoreWriter,
};
