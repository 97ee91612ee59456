// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    coding::{Encode, EncodeError},
    file::write_atomic,
    line_codec::{LineCodec, TextEncoding},
    LineEnding, Metadata, RecordLocation,
};
use std::{fs::File, io::Write, path::Path};

/// Parsed directory file: header and location table
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Directory {
    /// Header
    pub metadata: Metadata,

    /// One location per record, in file order
    pub locations: Vec<RecordLocation>,
}

impl Directory {
    fn open(path: &Path, chunk_size: usize) -> crate::Result<LineCodec<File>> {
        let file = File::open(path)?;
        Ok(LineCodec::with_chunk_size(file, TextEncoding::Utf8, chunk_size))
    }

    /// Reads header and location table.
    pub fn read(path: &Path, chunk_size: usize) -> crate::Result<Self> {
        log::debug!("Reading directory file {}", path.display());

        let mut codec = Self::open(path, chunk_size)?;
        let mut directory = Self::default();

        let mut line_no = 0;
        let mut in_header = true;

        while let Some(line) = codec.next_line()? {
            line_no += 1;

            if line.is_empty() {
                continue;
            }

            if in_header && Metadata::is_header_line(&line) {
                directory.metadata.apply_line(&line)?;
                continue;
            }
            in_header = false;

            directory
                .locations
                .push(RecordLocation::decode_from_line(&line, line_no)?);
        }

        log::trace!(
            "Directory {} lists {} locations",
            path.display(),
            directory.locations.len(),
        );

        Ok(directory)
    }

    /// Reads only the header.
    pub fn read_metadata(path: &Path, chunk_size: usize) -> crate::Result<Metadata> {
        let mut codec = Self::open(path, chunk_size)?;
        let mut metadata = Metadata::default();

        while let Some(line) = codec.next_line()? {
            if line.is_empty() {
                continue;
            }
            if !Metadata::is_header_line(&line) {
                break;
            }
            metadata.apply_line(&line)?;
        }

        Ok(metadata)
    }

    /// Serializes header and location table.
    pub fn encode_into<W: Write>(
        &self,
        writer: &mut W,
        ending: LineEnding,
    ) -> Result<(), EncodeError> {
        self.metadata.encode_into(writer, ending)?;

        for location in &self.locations {
            location.encode_into(writer)?;
            writer.write_all(ending.as_bytes())?;
        }

        Ok(())
    }

    /// Writes header and location table, replacing the file atomically.
    pub fn write(&self, path: &Path, ending: LineEnding) -> crate::Result<()> {
        log::debug!(
            "Writing directory file {} with {} locations",
            path.display(),
            self.locations.len(),
        );

        write_atomic(path, |writer| Ok(self.encode_into(writer, ending)?))
    }
}
