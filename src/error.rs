// Copyright (c) 2024-present, paldb contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Represents errors that can occur while building or reading a store
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(std::io::Error),

    /// A configuration value or an argument is out of its legal range
    InvalidArgument(&'static str),

    /// Two `put` calls provided bytewise-equal keys of the same length
    DuplicateKey(Box<[u8]>),

    /// The merged store file would not safely fit the target filesystem
    OutOfDiskSpace {
        /// Bytes the merged store file needs
        needed: u64,

        /// Usable bytes left on the filesystem
        available: u64,
    },

    /// Invalid or unparsable data encountered
    CorruptFormat(&'static str),

    /// The store file carries an unknown format-version tag
    UnsupportedVersion(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StoreError: {self:?}")
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Store result
pub type Result<T> = std::result::Result<T, Error>;
