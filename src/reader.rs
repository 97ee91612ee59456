// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    coding::{Decode, DecodeError},
    line_codec::{LineCodec, TextEncoding},
    LineEnding, Preamble, Record, RecordLocation, Tag,
};
use std::{fs::File, io::Read, path::Path};

/// Records of a data file, together with what is needed to write it back
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DataFile {
    /// Observed preamble
    pub preamble: Preamble,

    /// Terminator of the first record line, if any
    pub line_ending: Option<LineEnding>,

    /// Records in file order
    pub records: Vec<Record>,
}

/// Reads the terminator at the cursor, if there is one.
pub(crate) fn read_line_ending<R: Read>(
    codec: &mut LineCodec<R>,
) -> Result<Option<LineEnding>, DecodeError> {
    match codec.peek_byte()? {
        Some(b'\n') => {
            codec.next_byte()?;
            Ok(Some(LineEnding::Lf))
        }
        Some(b'\r') => {
            codec.next_byte()?;
            if codec.peek_byte()? == Some(b'\n') {
                codec.next_byte()?;
                Ok(Some(LineEnding::CrLf))
            } else {
                Ok(Some(LineEnding::Cr))
            }
        }
        _ => Ok(None),
    }
}

/// Extracts the tag from the raw start of a record line.
fn peek_tag(bytes: &[u8]) -> Option<Tag> {
    let tab = memchr::memchr(b'\t', bytes)?;
    let tag = bytes.get(tab + 1..tab + 1 + Tag::LEN)?;
    std::str::from_utf8(tag).ok()?.parse().ok()
}

/// Random-access reader over a data file, driven by a location table
pub struct LocatedReader {
    codec: LineCodec<File>,
    preamble: Preamble,
}

impl LocatedReader {
    /// Opens a data file and consumes its preamble.
    pub fn open(path: &Path, chunk_size: usize) -> crate::Result<Self> {
        let file = File::open(path)?;
        let mut codec = LineCodec::with_chunk_size(file, TextEncoding::Utf8, chunk_size);
        let preamble = Preamble::read_from(&mut codec)?;
        codec.set_encoding(preamble.encoding());

        Ok(Self { codec, preamble })
    }

    /// Returns the observed preamble.
    #[must_use]
    pub fn preamble(&self) -> Preamble {
        self.preamble
    }

    /// Reads the record at a location.
    ///
    /// Exactly `size` bytes make up single-valued records. Bucket records
    /// continue past `size` up to the line terminator, because the declared
    /// size leaves out their suffix.
    pub fn read_at(&mut self, location: &RecordLocation) -> crate::Result<Record> {
        let truncated = || DecodeError::Truncated {
            hash: location.hash,
            offset: location.offset,
            size: location.size,
        };

        let offset = u64::try_from(location.offset).map_err(|_| truncated())?;
        let size = usize::try_from(location.size).map_err(|_| truncated())?;

        self.codec.seek_to(offset)?;

        let mut bytes = match self.codec.read_bytes(size) {
            Ok(bytes) => bytes,
            Err(DecodeError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(truncated().into());
            }
            Err(e) => return Err(e.into()),
        };

        let tag = peek_tag(&bytes).ok_or_else(|| {
            DecodeError::InvalidRecordLine(String::from_utf8_lossy(&bytes).into_owned())
        })?;

        if tag.is_bucket() {
            let suffix = self.codec.read_until_line_end()?;
            bytes.extend_from_slice(&suffix);
        }

        let line = self.codec.decode(bytes, offset)?;
        let record = Record::decode_from(&line)?;

        if record.hash != location.hash {
            return Err(DecodeError::LocationMismatch {
                hash: location.hash,
                offset: location.offset,
                size: location.size,
                found: record.hash,
            }
            .into());
        }

        Ok(record)
    }

    /// Reads every located record.
    pub fn read_all(mut self, locations: &[RecordLocation]) -> crate::Result<DataFile> {
        let mut records = Vec::with_capacity(locations.len());
        let mut line_ending = None;

        for location in locations {
            let record = self.read_at(location)?;

            if line_ending.is_none() {
                line_ending = read_line_ending(&mut self.codec)?;
            }

            log::trace!("Read record {} ({}) at {}", record.hash, record.tag, location.offset);
            records.push(record);
        }

        Ok(DataFile {
            preamble: self.preamble,
            line_ending,
            records,
        })
    }
}
