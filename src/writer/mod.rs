// Copyright (c) 2024-present, paldb contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

mod index;
mod meta;

use crate::{bloom::BloomFilter, file, time::unix_timestamp, varint, Config};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
    time::Instant,
};
use tempfile::TempDir;

/// Temp streams and running statistics for one key length
///
/// Created lazily on the first `put` of a key with this length. Keys and
/// packed data offsets stream into the index temp file, encoded values into
/// the data temp file; nothing is kept in memory beyond the last value.
struct LengthBucket {
    key_len: usize,

    index_path: PathBuf,
    index_stream: BufWriter<File>,

    data_path: PathBuf,
    data_stream: BufWriter<File>,

    key_count: u64,

    /// Logical length of the data temp file, including the placeholder byte
    data_len: u64,

    /// Longest varint encoding among all offsets written for this length
    max_offset_len: usize,

    last_value: Option<Vec<u8>>,
    last_value_encoded_len: u64,
}

impl LengthBucket {
    fn create(folder: &std::path::Path, key_len: usize) -> crate::Result<Self> {
        log::trace!("Creating temp streams for key length {key_len}");

        let index_path = file::index_stream_path(folder, key_len);
        let data_path = file::data_file_path(folder, key_len);

        let index_stream = BufWriter::new(File::create_new(&index_path)?);
        let mut data_stream = BufWriter::new(File::create_new(&data_path)?);

        // Reserved zero offset: a placeholder byte keeps any real value
        // from starting at offset 0, so an all-zero slot field can mean
        // "empty"
        data_stream.write_all(&[0])?;

        Ok(Self {
            key_len,
            index_path,
            index_stream,
            data_path,
            data_stream,
            key_count: 0,
            data_len: 1,
            max_offset_len: 0,
            last_value: None,
            last_value_encoded_len: 0,
        })
    }

    fn close(self) -> crate::Result<ClosedBucket> {
        let mut index_stream = self.index_stream;
        let mut data_stream = self.data_stream;
        index_stream.flush()?;
        data_stream.flush()?;

        Ok(ClosedBucket {
            key_len: self.key_len,
            index_path: self.index_path,
            data_path: self.data_path,
            key_count: self.key_count,
            data_len: self.data_len,
            max_offset_len: self.max_offset_len,
        })
    }
}

/// A closed bucket whose temp files are ready for the index build
struct ClosedBucket {
    key_len: usize,
    index_path: PathBuf,
    data_path: PathBuf,
    key_count: u64,
    data_len: u64,
    max_offset_len: usize,
}

/// Streams `(key, value)` pairs into temp files and assembles them
/// into a single immutable store file
///
/// The build is two-phase: `put` appends to per-key-length temp streams
/// without ever holding the key set in memory; [`StoreWriter::finish`]
/// builds one open-addressing hash table per key length, writes the
/// metadata header, and concatenates everything into the output sink.
///
/// Keys must be non-empty and, per key length, unique. Values may be empty
/// and are limited to 2^32 - 1 bytes. Consecutive `put`s carrying the same
/// value for the same key length share one encoded copy of it.
///
/// # Example usage
///
/// ```
/// # use paldb::{Config, StoreWriter};
/// # fn main() -> paldb::Result<()> {
/// # let folder = tempfile::tempdir()?;
/// # let path = folder.path().join("lookup.paldb");
/// let sink = std::fs::File::create(&path)?;
///
/// let mut writer = StoreWriter::new(Config::default(), sink)?;
/// writer.put(b"de", b"Germany")?;
/// writer.put(b"fr", b"France")?;
/// writer.finish()?;
/// # Ok(())
/// # }
/// ```
pub struct StoreWriter<W: Write> {
    config: Config,

    sink: BufWriter<W>,

    /// Exclusively owned by this writer, removed when the build
    /// ends either way
    temp_dir: TempDir,

    /// Buckets indexed by key length; grown on demand
    buckets: Vec<Option<LengthBucket>>,

    key_count: u64,
    value_count: u64,
}

impl<W: Write> StoreWriter<W> {
    /// Creates a new writer that will assemble the store into `sink`.
    ///
    /// The sink is buffered internally, so passing a raw `File` is fine.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the configuration is out of range.
    pub fn new(config: Config, sink: W) -> crate::Result<Self> {
        config.validate()?;

        let temp_dir = tempfile::Builder::new().prefix("paldb-").tempdir()?;

        log::trace!("Store build temp directory: {:?}", temp_dir.path());

        Ok(Self {
            config,
            sink: BufWriter::new(sink),
            temp_dir,
            buckets: Vec::new(),
            key_count: 0,
            value_count: 0,
        })
    }

    /// Adds one `(key, value)` pair to the store.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty key or a value of 2^32 bytes
    /// or more. Duplicate keys are only detected when the index is built,
    /// so they surface as `DuplicateKey` from [`StoreWriter::finish`].
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> crate::Result<()> {
        if key.is_empty() {
            return Err(crate::Error::InvalidArgument("key must not be empty"));
        }

        let value_size = u32::try_from(value.len())
            .map_err(|_| crate::Error::InvalidArgument("value is limited to 2^32 - 1 bytes"))?;

        let key_len = key.len();

        if self.buckets.len() <= key_len {
            self.buckets.resize_with(key_len + 1, || None);
        }

        #[expect(clippy::expect_used, reason = "resized above")]
        let slot = self.buckets.get_mut(key_len).expect("was grown above");

        if slot.is_none() {
            *slot = Some(LengthBucket::create(self.temp_dir.path(), key_len)?);
        }

        #[expect(clippy::expect_used, reason = "inserted above")]
        let bucket = slot.as_mut().expect("was inserted above");

        bucket.index_stream.write_all(key)?;

        let same_as_last = bucket.last_value.as_deref() == Some(value);

        // A repeated value makes the index entry point back at the
        // previous value's encoding instead of storing it again
        let offset = bucket.data_len
            - if same_as_last {
                bucket.last_value_encoded_len
            } else {
                0
            };

        let offset_len = varint::pack_u64(&mut bucket.index_stream, offset)?;
        bucket.max_offset_len = bucket.max_offset_len.max(offset_len);

        if !same_as_last {
            let size_len = varint::pack_u32(&mut bucket.data_stream, value_size)?;
            bucket.data_stream.write_all(value)?;

            let encoded_len = size_len as u64 + value.len() as u64;
            bucket.data_len += encoded_len;
            bucket.last_value = Some(value.to_vec());
            bucket.last_value_encoded_len = encoded_len;

            self.value_count += 1;
        }

        bucket.key_count += 1;
        self.key_count += 1;

        Ok(())
    }

    /// Finishes the store, building all indices and writing the final file
    /// into the sink.
    ///
    /// Temp files are deleted as they are merged; the temp directory is
    /// removed on success and best-effort when the writer is abandoned.
    /// Returns the inner sink, flushed.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if two puts provided the same key,
    /// `OutOfDiskSpace` if the merged file would not safely fit the temp
    /// filesystem, and `Io` for any underlying failure.
    pub fn finish(mut self) -> crate::Result<W> {
        let start = Instant::now();

        let mut closed = Vec::new();

        for bucket in self.buckets.drain(..).flatten() {
            let bucket = bucket.close()?;

            debug_assert_eq!(
                bucket.data_len,
                std::fs::metadata(&bucket.data_path)?.len(),
                "tracked data length diverged from the temp file",
            );

            closed.push(bucket);
        }

        let mut filter = self
            .config
            .bloom_filter_enabled
            .then(|| BloomFilter::with_fp_rate(self.key_count, self.config.bloom_error_factor));

        let max_key_len = closed.last().map_or(0, |bucket| bucket.key_len);

        let mut entries = Vec::with_capacity(closed.len());
        let mut index_paths = Vec::with_capacity(closed.len());
        let mut data_paths = Vec::with_capacity(closed.len());

        let mut indexes_total_len = 0u64;
        let mut datas_total_len = 0u64;
        let mut collisions = 0u64;

        // Buckets are stored by key length, so this runs in ascending
        // key-length order, which fixes the region order in the file
        for bucket in &closed {
            #[expect(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                clippy::cast_precision_loss,
                reason = "key counts stay far below 2^52"
            )]
            let num_slots = (bucket.key_count as f64 / self.config.load_factor).round() as u64;

            let built = index::build(
                self.temp_dir.path(),
                bucket.key_len,
                bucket.key_count,
                num_slots,
                bucket.max_offset_len,
                self.config.mmap_segment_size,
                &bucket.index_path,
                filter.as_mut(),
            )?;

            collisions += built.collisions;

            #[expect(clippy::cast_possible_truncation, reason = "key length fits the directory field")]
            entries.push(meta::DirectoryEntry {
                key_len: bucket.key_len as u32,
                key_count: bucket.key_count,
                num_slots,
                slot_size: (bucket.key_len + bucket.max_offset_len) as u32,
                index_offset: indexes_total_len,
                data_offset: datas_total_len,
            });

            indexes_total_len += built.len;
            datas_total_len += bucket.data_len;

            index_paths.push(built.path);
            data_paths.push(bucket.data_path.clone());
        }

        #[expect(clippy::cast_possible_truncation, reason = "millis since epoch fit u64")]
        let metadata = meta::encode(
            &entries,
            filter.as_ref(),
            self.key_count,
            max_key_len as u32,
            indexes_total_len,
            unix_timestamp().as_millis() as u64,
        )?;

        let metadata_path = self.temp_dir.path().join(file::METADATA_FILE);
        std::fs::write(&metadata_path, &metadata)?;

        self.check_free_space(metadata.len() as u64 + indexes_total_len + datas_total_len)?;

        // metadata, then index regions, then data regions,
        // both in ascending key-length order
        let mut bytes_written = 0u64;

        for path in std::iter::once(metadata_path)
            .chain(index_paths)
            .chain(data_paths)
        {
            let mut file = File::open(&path)?;
            bytes_written += std::io::copy(&mut file, &mut self.sink)?;
            drop(file);

            std::fs::remove_file(&path)?;
        }

        self.sink.flush()?;
        let sink = self
            .sink
            .into_inner()
            .map_err(std::io::IntoInnerError::into_error)?;

        self.temp_dir.close()?;

        log::debug!(
            "Wrote store with {} keys ({} values, {collisions} hash collisions), {bytes_written}B in {}ms",
            self.key_count,
            self.value_count,
            start.elapsed().as_millis(),
        );

        Ok(sink)
    }

    fn check_free_space(&self, needed: u64) -> crate::Result<()> {
        let available = fs2::available_space(self.temp_dir.path())?;

        // Merging reads and writes on the same filesystem, so leave
        // a wide margin
        #[expect(clippy::cast_precision_loss, reason = "coarse ratio check")]
        if needed as f64 / available as f64 >= 0.66 {
            return Err(crate::Error::OutOfDiskSpace { needed, available });
        }

        Ok(())
    }
}
