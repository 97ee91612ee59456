// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    checksum::ChecksummedWriter,
    coding::{Encode, EncodeError},
    directory::Directory,
    file::AtomicFile,
    LineEnding, Metadata, Preamble, Record, RecordLocation,
};
use std::{
    io::Write,
    path::{Path, PathBuf},
    time::Instant,
};

/// Serializes records into a data file and its directory file
///
/// Both files are staged next to their destinations and only moved into
/// place once both were written completely.
pub struct Writer {
    data_path: PathBuf,
    directory_path: PathBuf,

    preamble: Preamble,
    line_ending: LineEnding,
    metadata: Metadata,
}

impl Writer {
    /// Creates a writer for a file pair.
    #[must_use]
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(data_path: P, directory_path: Q) -> Self {
        Self {
            data_path: data_path.as_ref().to_path_buf(),
            directory_path: directory_path.as_ref().to_path_buf(),
            preamble: Preamble::default(),
            line_ending: LineEnding::native(),
            metadata: Metadata::default(),
        }
    }

    /// Sets the preamble written in front of the data file.
    #[must_use]
    pub fn use_preamble(mut self, preamble: Preamble) -> Self {
        self.preamble = preamble;
        self
    }

    /// Sets the line terminator of both files.
    #[must_use]
    pub fn use_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Sets the header, derived fields are recomputed on write.
    #[must_use]
    pub fn use_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Writes the records in the given order and returns the directory
    /// that was written.
    pub fn write<'a, I>(self, records: I) -> crate::Result<Directory>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let start = Instant::now();
        let ending = self.line_ending;

        log::debug!(
            "Writing data file {} ({ending})",
            self.data_path.display(),
        );

        // Sizes are validated up front so a malformed bucket record fails
        // the write before anything is staged
        let records = records
            .into_iter()
            .map(|record| Ok((record, record.declared_size()?)))
            .collect::<Result<Vec<_>, EncodeError>>()?;

        let mut data_file = AtomicFile::create(&self.data_path)?;
        let mut directory_file = AtomicFile::create(&self.directory_path)?;

        let (locations, checksum, text_length) = data_file.write_with(|writer| {
            let mut writer = ChecksummedWriter::new(writer);
            writer.write_all(self.preamble.as_bytes())?;

            let mut locations = Vec::with_capacity(records.len());
            let mut text_length = 0;

            for (record, size) in &records {
                let offset = i64::try_from(writer.written()).map_err(|_| {
                    std::io::Error::new(std::io::ErrorKind::InvalidData, "data file too large")
                })?;

                record.encode_into(&mut writer)?;
                writer.write_all(ending.as_bytes())?;

                locations.push(RecordLocation {
                    hash: record.hash,
                    offset,
                    size: *size,
                });

                text_length = text_length.max(record.text.len() as u64);
            }

            Ok((locations, writer.checksum(), text_length))
        })?;

        let mut metadata = self.metadata;
        metadata.refresh(
            locations.len() as u64,
            &checksum,
            text_length,
            &self.data_path,
        );

        let directory = Directory {
            metadata,
            locations,
        };

        directory_file.write_with(|writer| Ok(directory.encode_into(writer, ending)?))?;

        data_file.commit()?;
        directory_file.commit()?;

        log::debug!(
            "Wrote {} records to {} in {:?}",
            directory.locations.len(),
            self.data_path.display(),
            start.elapsed(),
        );

        Ok(directory)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{checksum::Checksum, reader::LocatedReader, Tag};
    use test_log::test;

    #[test]
    fn writer_simple_line() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let data_path = dir.path().join("en_us_data.dat");
        let dir_path = dir.path().join("en_us_data.dir");

        let records = [Record::new(905_058_873, Tag::Ucdt, "Coin Flow Saw")];

        let directory = Writer::new(&data_path, &dir_path)
            .use_line_ending(LineEnding::Lf)
            .write(&records)?;

        let bytes = std::fs::read(&data_path)?;
        assert_eq!(b"\xEF\xBB\xBF905058873\tucdt\tCoin Flow Saw\n".to_vec(), bytes);

        assert_eq!(
            vec![RecordLocation {
                hash: 905_058_873,
                offset: 3,
                size: 26,
            }],
            directory.locations,
        );

        let metadata = &directory.metadata;
        assert_eq!(Some(1), metadata.count());
        assert_eq!(Some(13), metadata.text_length());
        assert_eq!(Some("en_us"), metadata.locale());
        assert_eq!(
            Some(Checksum::of(&bytes).to_string().as_str()),
            metadata.checksum(),
        );

        assert_eq!(directory, Directory::read(&dir_path, 64)?);

        Ok(())
    }

    #[test]
    fn writer_offsets_follow_terminator_length() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let data_path = dir.path().join("x.dat");
        let dir_path = dir.path().join("x.dir");

        let records = [
            Record::new(1, Tag::Ucdt, "a"),
            Record::new(2, Tag::Mcdt, "b\t0017\tGlobal.Text.7"),
            Record::new(3, Tag::Ucdt, "c\r\nd"),
            Record::new(4, Tag::Ucdt, "e"),
        ];

        let directory = Writer::new(&data_path, &dir_path)
            .use_preamble(Preamble::DoubleEncodedBom)
            .use_line_ending(LineEnding::CrLf)
            .write(&records)?;

        let offsets = directory
            .locations
            .iter()
            .map(|l| (l.offset, l.size))
            .collect::<Vec<_>>();

        // "1\tucdt\ta\r\n" = 10, "2\tmcdt\tb\t0017\tGlobal.Text.7\r\n" = 29,
        // "3\tucdt\tc\r\nd\r\n" = 13
        assert_eq!(vec![(6, 8), (16, 8), (45, 11), (58, 8)], offsets);
        assert_eq!(None, directory.metadata.locale());

        let data = LocatedReader::open(&data_path, 8)?.read_all(&directory.locations)?;
        assert_eq!(Preamble::DoubleEncodedBom, data.preamble);
        assert_eq!(Some(LineEnding::CrLf), data.line_ending);
        assert_eq!(records.to_vec(), data.records);

        Ok(())
    }

    #[test]
    fn writer_rejects_short_bucket_before_staging() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let data_path = dir.path().join("x.dat");
        let dir_path = dir.path().join("x.dir");

        std::fs::write(&data_path, "old data")?;

        let records = [
            Record::new(1, Tag::Ucdt, "fine"),
            Record::new(2, Tag::Mgdt, "no suffix"),
        ];

        let result = Writer::new(&data_path, &dir_path).write(&records);

        assert!(matches!(
            result,
            Err(crate::Error::Encode(EncodeError::SuffixTooShort { hash: 2, .. })),
        ));
        assert_eq!("old data", std::fs::read_to_string(&data_path)?);
        assert!(!dir_path.try_exists()?);
        assert_eq!(1, std::fs::read_dir(dir.path())?.count());

        Ok(())
    }

    #[test]
    fn writer_keeps_extracted_shape() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let data_path = dir.path().join("en_us_data.dat");
        let dir_path = dir.path().join("en_us_data.dir");

        let mut metadata = Metadata::default();
        metadata.set(crate::metadata::Field::ExtractionVersion, "0.4")?;

        let records = [Record::new(1, Tag::Ucdt, "a"), Record::new(2, Tag::Ucdt, "b")];

        Writer::new(&data_path, &dir_path)
            .use_line_ending(LineEnding::Lf)
            .use_metadata(metadata)
            .write(&records)?;

        let content = std::fs::read_to_string(&dir_path)?;
        assert!(content.starts_with(
            "##\n## ExtractionDate:\tUnknown\n## Count:\t2\n## ExtractionVersion:\t0.4\n",
        ));

        Ok(())
    }
}
