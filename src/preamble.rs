// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    coding::DecodeError,
    line_codec::{LineCodec, TextEncoding},
};
use std::io::Read;

/// UTF-8 byte order mark
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// UTF-8 byte order mark, read as Windows-1252 (`ï»¿`) and encoded as
/// UTF-8 again
pub const DOUBLE_ENCODED_BOM: [u8; 6] = [0xC3, 0xAF, 0xC2, 0xBB, 0xC2, 0xBF];

/// Leading bytes of a data file
///
/// Both variants exist in shipped files, so the observed one is kept and
/// written back unchanged.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Preamble {
    /// Plain UTF-8 byte order mark
    #[default]
    Utf8Bom,

    /// Double-encoded UTF-8 byte order mark
    DoubleEncodedBom,
}

impl Preamble {
    /// Returns the preamble's bytes.
    #[must_use]
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Utf8Bom => &UTF8_BOM,
            Self::DoubleEncodedBom => &DOUBLE_ENCODED_BOM,
        }
    }

    /// Returns the preamble's length in bytes.
    #[must_use]
    pub fn len(self) -> usize {
        self.as_bytes().len()
    }

    /// Encoding of the text following the preamble.
    #[must_use]
    pub fn encoding(self) -> TextEncoding {
        match self {
            Self::Utf8Bom | Self::DoubleEncodedBom => TextEncoding::Utf8,
        }
    }

    /// Recognizes a preamble from the first (up to) 6 bytes of a file.
    pub fn detect(head: &[u8]) -> Result<Self, DecodeError> {
        if head.starts_with(&UTF8_BOM) {
            Ok(Self::Utf8Bom)
        } else if head.starts_with(&DOUBLE_ENCODED_BOM) {
            Ok(Self::DoubleEncodedBom)
        } else {
            Err(DecodeError::InvalidPreamble(
                head.iter().take(DOUBLE_ENCODED_BOM.len()).copied().collect(),
            ))
        }
    }

    /// Consumes the preamble from the start of a stream, leaving the cursor
    /// right behind it.
    pub fn read_from<R: Read>(codec: &mut LineCodec<R>) -> Result<Self, DecodeError> {
        let mut head = Vec::with_capacity(DOUBLE_ENCODED_BOM.len());

        while head.len() < UTF8_BOM.len() {
            match codec.next_byte()? {
                Some(byte) => head.push(byte),
                None => return Err(DecodeError::InvalidPreamble(head)),
            }
        }

        if head == UTF8_BOM {
            return Ok(Self::Utf8Bom);
        }

        while head.len() < DOUBLE_ENCODED_BOM.len() {
            match codec.next_byte()? {
                Some(byte) => head.push(byte),
                None => return Err(DecodeError::InvalidPreamble(head)),
            }
        }

        let preamble = Self::detect(&head)?;
        codec.set_encoding(preamble.encoding());

        Ok(preamble)
    }
}
