// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::io::Write;

/// Error during serialization
#[derive(Debug)]
pub enum EncodeError {
    /// I/O error
    Io(std::io::Error),

    /// A bucket record line is too short to hold its identifier/key suffix
    SuffixTooShort {
        /// Record hash
        hash: u32,

        /// Serialized line
        line: String,
    },
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "EncodeError(Io: {e})"),
            Self::SuffixTooShort { hash, line } => {
                write!(f, "EncodeError(SuffixTooShort: hash {hash} line {line:?})")
            }
        }
    }
}

impl From<std::io::Error> for EncodeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::SuffixTooShort { .. } => None,
        }
    }
}

/// Error during deserialization
///
/// Every variant is a format error and carries enough of the offending
/// input to locate it.
#[derive(Debug)]
pub enum DecodeError {
    /// I/O error
    Io(std::io::Error),

    /// The data file does not start with a known preamble
    InvalidPreamble(Vec<u8>),

    /// Malformed `hash<TAB>tag<TAB>text` line
    InvalidRecordLine(String),

    /// Tag literal not in the known set
    InvalidTag(String),

    /// Malformed `hash<TAB>offset<TAB>size<TAB>d` line
    InvalidLocationLine {
        /// 1-based line number inside the directory file
        line_no: usize,

        /// Raw line
        line: String,
    },

    /// Malformed `## <name>:<TAB><value>` line
    InvalidMetadataLine(String),

    /// Metadata field name not in the known set
    UnknownMetadataField(String),

    /// Metadata value rejected by its field validator
    InvalidMetadataValue {
        /// Field name
        field: &'static str,

        /// Raw value
        value: String,
    },

    /// The record found at a location does not carry the location's hash
    LocationMismatch {
        /// Hash stored in the directory
        hash: u32,

        /// Byte offset into the data file
        offset: i64,

        /// Declared size
        size: i32,

        /// Hash found in the data file
        found: u32,
    },

    /// A location points outside of the data file
    Truncated {
        /// Hash stored in the directory
        hash: u32,

        /// Byte offset into the data file
        offset: i64,

        /// Declared size
        size: i32,
    },

    /// A single-valued hash occurs more than once
    DuplicateHash(u32),

    /// Bytes could not be decoded under the file's text encoding
    Utf8 {
        /// Absolute byte offset of the line that failed to decode
        offset: u64,

        /// Underlying error
        error: std::str::Utf8Error,
    },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DecodeError({})",
            match self {
                Self::Io(e) => e.to_string(),
                e => format!("{e:?}"),
            }
        )
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Utf8 { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Trait to serialize stuff into its text line form
pub trait Encode {
    /// Serializes into writer, without any line terminator.
    fn encode_into<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError>;

    /// Serializes into a string.
    fn encode_into_string(&self) -> Result<String, EncodeError> {
        let mut v = vec![];
        self.encode_into(&mut v)?;

        String::from_utf8(v).map_err(|e| {
            EncodeError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }
}

/// Trait to deserialize stuff from a single text line
pub trait Decode {
    /// Deserializes from a line, without its terminator.
    fn decode_from(line: &str) -> Result<Self, DecodeError>
    where
        Self: Sized;
}
