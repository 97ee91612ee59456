// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::coding::{DecodeError, EncodeError};

/// Operation that is not available for a store
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Unsupported {
    /// The identifier index was requested on a file that uses the
    /// foreign identifier scheme
    IdIndex,

    /// Insertion was requested on a file that uses the
    /// foreign identifier scheme
    Insert,
}

/// Represents errors that can occur in the record store
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(std::io::Error),

    /// Serialization failed
    Encode(EncodeError),

    /// Deserialization failed (malformed input)
    Decode(DecodeError),

    /// Operation is not supported for this file
    Unsupported(Unsupported),

    /// No unused identifier remains in the identifier space
    IdSpaceExhausted,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LocaleStoreError: {self:?}")
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Encode(e) => Some(e),
            Self::Decode(e) => Some(e),
            Self::Unsupported(_) | Self::IdSpaceExhausted => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<EncodeError> for Error {
    fn from(value: EncodeError) -> Self {
        Self::Encode(value)
    }
}

impl From<DecodeError> for Error {
    fn from(value: DecodeError) -> Self {
        Self::Decode(value)
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(value: tempfile::PersistError) -> Self {
        Self::Io(value.error)
    }
}

/// Store result
pub type Result<T> = std::result::Result<T, Error>;
