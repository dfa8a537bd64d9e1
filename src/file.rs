// Copyright (c) 2024-present, paldb contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::path::{Path, PathBuf};

/// Format-version tag leading every store file; readers reject
/// anything else
pub const FORMAT_VERSION: &str = "PALDB_V1";

/// Name of the metadata temp file, merged first
pub const METADATA_FILE: &str = "metadata.dat";

/// Temp file collecting `(key, packed offset)` records for one key length
pub fn index_stream_path(folder: &Path, key_len: usize) -> PathBuf {
    folder.join(format!("temp_index{key_len}.dat"))
}

/// Temp file collecting encoded values for one key length
pub fn data_file_path(folder: &Path, key_len: usize) -> PathBuf {
    folder.join(format!("data{key_len}.dat"))
}

/// Built hash-table file for one key length
pub fn index_file_path(folder: &Path, key_len: usize) -> PathBuf {
    folder.join(format!("index{key_len}.dat"))
}
