// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    coding::{DecodeError, Encode, EncodeError},
    record::parse_decimal,
};
use std::io::Write;

/// Trailing field of every location line
const LOCATION_MARKER: &str = "d";

/// Position of a record inside the data file
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RecordLocation {
    /// Record hash
    pub hash: u32,

    /// Absolute byte offset of the record line
    pub offset: i64,

    /// Declared byte length of the record line
    ///
    /// For bucket kinds this excludes the suffix.
    pub size: i32,
}

impl RecordLocation {
    /// Parses a `hash<TAB>offset<TAB>size<TAB>d` line.
    ///
    /// `line_no` is only used for error reporting.
    pub fn decode_from_line(line: &str, line_no: usize) -> Result<Self, DecodeError> {
        let invalid = || DecodeError::InvalidLocationLine {
            line_no,
            line: line.to_owned(),
        };

        let mut fields = line.split('\t');
        let mut next = || fields.next().ok_or_else(invalid);

        let hash = parse_decimal(next()?).ok_or_else(invalid)?;
        let offset = parse_decimal::<i64>(next()?).ok_or_else(invalid)?;
        let size = parse_decimal::<i32>(next()?).ok_or_else(invalid)?;
        let marker = next()?;

        if marker != LOCATION_MARKER || fields.next().is_some() {
            return Err(invalid());
        }

        Ok(Self { hash, offset, size })
    }
}

impl Encode for RecordLocation {
    fn encode_into<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
        write!(
            writer,
            "{}\t{}\t{}\t{LOCATION_MARKER}",
            self.hash, self.offset, self.size,
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn location_parse() {
        let loc = RecordLocation::decode_from_line("905058873\t3\t26\td", 1).unwrap();

        assert_eq!(
            RecordLocation {
                hash: 905_058_873,
                offset: 3,
                size: 26,
            },
            loc,
        );
        assert_eq!("905058873\t3\t26\td", loc.encode_into_string().unwrap());
    }

    #[test]
    fn location_parse_errors() {
        for line in [
            "",
            "1\t2\t3",
            "1\t2\t3\tx",
            "1\t2\t3\td\textra",
            "a\t2\t3\td",
            "1\t-2\t3\td",
            "1\t2\t99999999999\td",
        ] {
            assert!(
                matches!(
                    RecordLocation::decode_from_line(line, 7),
                    Err(DecodeError::InvalidLocationLine { line_no: 7, .. }),
                ),
                "{line:?}",
            );
        }
    }
}
