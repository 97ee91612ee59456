// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    coding::{Decode, DecodeError},
    line_codec::{LineCodec, TextEncoding, DEFAULT_CHUNK_SIZE},
    reader::DataFile,
    record::is_record_start,
    LineEnding, Preamble, Record,
};
use std::{fs::File, io::Read, path::Path};

/// Forward-only record reader over a data file, without a directory
///
/// A record is only known to be complete once the following line has been
/// read: that line either starts a new record or continues the text of the
/// pending one. The stream therefore holds one pending record and reads one
/// line ahead.
pub struct RecordStream<R: Read> {
    codec: LineCodec<R>,
    preamble: Preamble,

    /// Record whose text may still continue on the next line
    pending: Option<Record>,

    /// Terminator of the first record
    line_ending: Option<LineEnding>,

    is_done: bool,
}

impl RecordStream<File> {
    /// Opens a data file.
    pub fn open(path: &Path) -> crate::Result<Self> {
        Self::open_with_chunk_size(path, DEFAULT_CHUNK_SIZE)
    }

    /// Opens a data file, reading `chunk_size` bytes at a time.
    pub fn open_with_chunk_size(path: &Path, chunk_size: usize) -> crate::Result<Self> {
        log::debug!("Streaming data file {}", path.display());
        Self::from_reader(File::open(path)?, chunk_size)
    }
}

impl<R: Read> RecordStream<R> {
    /// Wraps a reader positioned at the start of a data file.
    pub fn from_reader(reader: R, chunk_size: usize) -> crate::Result<Self> {
        let mut codec = LineCodec::with_chunk_size(reader, TextEncoding::Utf8, chunk_size);
        let preamble = Preamble::read_from(&mut codec)?;
        codec.set_encoding(preamble.encoding());

        Ok(Self {
            codec,
            preamble,
            pending: None,
            line_ending: None,
            is_done: false,
        })
    }

    /// Returns the observed preamble.
    #[must_use]
    pub fn preamble(&self) -> Preamble {
        self.preamble
    }

    /// Terminator of the first record, once the record is complete.
    ///
    /// Line breaks inside the text of a multi-line record do not count.
    #[must_use]
    pub fn line_ending(&self) -> Option<LineEnding> {
        self.line_ending
    }

    fn next_record(&mut self) -> crate::Result<Option<Record>> {
        loop {
            let Some(line) = self.codec.next_line()? else {
                if self.pending.is_some() && self.line_ending.is_none() {
                    self.line_ending = self.codec.line_ending();
                }
                return Ok(self.pending.take());
            };

            if is_record_start(&line) {
                let record = Record::decode_from(&line)?;

                if let Some(complete) = self.pending.replace(record) {
                    if self.line_ending.is_none() {
                        // The break before this line ended the first record
                        self.line_ending = self.codec.previous_line_ending();
                    }
                    return Ok(Some(complete));
                }
                continue;
            }

            let Some(pending) = self.pending.as_mut() else {
                return Err(DecodeError::InvalidRecordLine(line).into());
            };

            // The line break between the two lines belongs to the text
            let separator = self
                .codec
                .previous_line_ending()
                .map(LineEnding::as_str)
                .unwrap_or_default();

            pending.text.push_str(separator);
            pending.text.push_str(&line);
        }
    }

    /// Drains the stream.
    pub fn read_all(mut self) -> crate::Result<DataFile> {
        let mut records = vec![];

        while let Some(record) = self.next_record()? {
            records.push(record);
        }

        Ok(DataFile {
            preamble: self.preamble,
            line_ending: self.line_ending,
            records,
        })
    }
}

impl<R: Read> Iterator for RecordStream<R> {
    type Item = crate::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_done {
            return None;
        }

        let record = self.next_record();

        if !matches!(record, Ok(Some(_))) {
            self.is_done = true;
        }

        record.transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Tag;
    use test_log::test;

    fn stream(content: &[u8], chunk_size: usize) -> RecordStream<std::io::Cursor<Vec<u8>>> {
        let mut bytes = crate::preamble::UTF8_BOM.to_vec();
        bytes.extend_from_slice(content);
        RecordStream::from_reader(std::io::Cursor::new(bytes), chunk_size).unwrap()
    }

    #[test]
    fn stream_simple() {
        let records = stream(b"905058873\tucdt\tCoin Flow Saw\n1\tucdn\t\n", 64)
            .collect::<crate::Result<Vec<_>>>()
            .unwrap();

        assert_eq!(
            vec![
                Record::new(905_058_873, Tag::Ucdt, "Coin Flow Saw"),
                Record::new(1, Tag::Ucdn, ""),
            ],
            records,
        );
    }

    #[test]
    fn stream_last_record_without_terminator() {
        let records = stream(b"1\tucdt\ta\n2\tucdt\tb", 64)
            .collect::<crate::Result<Vec<_>>>()
            .unwrap();

        assert_eq!(2, records.len());
        assert_eq!("b", records[1].text);
    }

    #[test]
    fn stream_multi_line_keeps_inner_line_breaks() {
        for chunk_size in [1, 2, 3, 5, 64] {
            let data = stream(
                b"1\tucdt\tfirst\r\nsecond\nthird\r\n2\tucdt\tnext\r\n",
                chunk_size,
            )
            .read_all()
            .unwrap();

            assert_eq!(Some(LineEnding::CrLf), data.line_ending);
            assert_eq!(
                vec![
                    Record::new(1, Tag::Ucdt, "first\r\nsecond\nthird"),
                    Record::new(2, Tag::Ucdt, "next"),
                ],
                data.records,
                "chunk size {chunk_size}",
            );
        }
    }

    #[test]
    fn stream_line_ending_of_multi_line_first_record() {
        for chunk_size in [1, 2, 64] {
            let data = stream(b"1\tucdt\ta\nb\r\n2\tucdt\tc\r\n", chunk_size)
                .read_all()
                .unwrap();

            assert_eq!(Some(LineEnding::CrLf), data.line_ending, "chunk size {chunk_size}");
            assert_eq!("a\nb", data.records[0].text);
        }

        let data = stream(b"1\tucdt\ta\rb\n", 64).read_all().unwrap();
        assert_eq!(Some(LineEnding::Lf), data.line_ending);
        assert_eq!(vec![Record::new(1, Tag::Ucdt, "a\rb")], data.records);

        let data = stream(b"1\tucdt\ta\nb", 64).read_all().unwrap();
        assert_eq!(None, data.line_ending);
    }

    #[test]
    fn stream_trailing_empty_line_belongs_to_text() {
        let records = stream(b"1\tucdt\tends with newline\n\n", 64)
            .collect::<crate::Result<Vec<_>>>()
            .unwrap();

        assert_eq!(vec![Record::new(1, Tag::Ucdt, "ends with newline\n")], records);
    }

    #[test]
    fn stream_empty() {
        assert_eq!(0, stream(b"", 64).count());
    }

    #[test]
    fn stream_continuation_without_record() {
        let mut stream = stream(b"not a record\n1\tucdt\tx\n", 64);

        assert!(matches!(
            stream.next(),
            Some(Err(crate::Error::Decode(DecodeError::InvalidRecordLine(_)))),
        ));
        assert!(stream.next().is_none());
    }

    #[test]
    fn stream_unknown_tag() {
        let result = stream(b"1\tucdt\ta\n2\tzzzz\tb\n", 64).collect::<crate::Result<Vec<_>>>();

        assert!(matches!(
            result,
            Err(crate::Error::Decode(DecodeError::InvalidTag(tag))) if tag == "zzzz",
        ));
    }

    #[test]
    fn stream_continuation_with_tabs() {
        let records = stream(b"1\tucdt\ta\nb\tc\n", 64)
            .collect::<crate::Result<Vec<_>>>()
            .unwrap();

        assert_eq!(vec![Record::new(1, Tag::Ucdt, "a\nb\tc")], records);
    }
}
