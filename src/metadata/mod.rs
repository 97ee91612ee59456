// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

mod field;

pub use field::{Field, MetaDate};

use crate::{
    coding::{DecodeError, EncodeError},
    LineEnding,
};
use field::{parse_unsigned, validate_checksum};
use std::{io::Write, path::Path};

/// Prefix of every header line
pub const LINE_PREFIX: &str = "##";

/// Value that stands for an unset field
pub const UNKNOWN: &str = "Unknown";

/// Header of a directory file
///
/// There are two mutually exclusive shapes: the *standard* one, and the
/// *extracted* one written by extraction tools (marker line,
/// `ExtractionDate`, `Count`, `ExtractionVersion`). Any extraction field, or
/// a bare marker line, switches the header to the extracted shape.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Metadata {
    cid_length: Option<u64>,
    count: Option<u64>,
    database: Option<String>,
    date: Option<MetaDate>,
    game: Option<String>,
    locale: Option<String>,
    checksum: Option<String>,
    format_version: Option<u64>,
    text_length: Option<u64>,
    version: Option<String>,

    extraction_date: Option<MetaDate>,
    extraction_version: Option<String>,
    extraction_marker: bool,
}

impl Metadata {
    /// Returns `true` if a header line (as opposed to a location line).
    #[must_use]
    pub fn is_header_line(line: &str) -> bool {
        line.starts_with(LINE_PREFIX)
    }

    /// Feeds one header line.
    ///
    /// `## <name>:<TAB><value>` assigns a field, a bare `##` marks the
    /// extracted shape. A value of `Unknown` unsets the field.
    pub fn apply_line(&mut self, line: &str) -> Result<(), DecodeError> {
        if line.trim_end() == LINE_PREFIX {
            self.extraction_marker = true;
            return Ok(());
        }

        let invalid = || DecodeError::InvalidMetadataLine(line.to_owned());

        let rest = line
            .strip_prefix(LINE_PREFIX)
            .and_then(|rest| rest.strip_prefix(' '))
            .ok_or_else(invalid)?;

        let (name, value) = rest.split_once(":\t").ok_or_else(invalid)?;
        let field = name.parse::<Field>()?;

        if value == UNKNOWN {
            self.unset(field);
            Ok(())
        } else {
            self.set(field, value)
        }
    }

    /// Validates and assigns a field from its textual value.
    pub fn set(&mut self, field: Field, value: &str) -> Result<(), DecodeError> {
        match field {
            Field::CidLength => self.cid_length = Some(parse_unsigned(field, value)?),
            Field::Count => self.count = Some(parse_unsigned(field, value)?),
            Field::Database => self.database = Some(value.to_owned()),
            Field::Date => self.date = Some(MetaDate::parse(value)?),
            Field::Game => self.game = Some(value.to_owned()),
            Field::Locale => self.locale = Some(value.to_owned()),
            Field::Checksum => {
                validate_checksum(value)?;
                self.checksum = Some(value.to_owned());
            }
            Field::FormatVersion => self.format_version = Some(parse_unsigned(field, value)?),
            Field::TextLength => self.text_length = Some(parse_unsigned(field, value)?),
            Field::Version => self.version = Some(value.to_owned()),
            Field::ExtractionDate => {
                let date = MetaDate::parse(value).map_err(|_| DecodeError::InvalidMetadataValue {
                    field: field.name(),
                    value: value.to_owned(),
                })?;
                self.extraction_date = Some(date);
            }
            Field::ExtractionVersion => self.extraction_version = Some(value.to_owned()),
        }

        Ok(())
    }

    /// Unsets a field.
    pub fn unset(&mut self, field: Field) {
        match field {
            Field::CidLength => self.cid_length = None,
            Field::Count => self.count = None,
            Field::Database => self.database = None,
            Field::Date => self.date = None,
            Field::Game => self.game = None,
            Field::Locale => self.locale = None,
            Field::Checksum => self.checksum = None,
            Field::FormatVersion => self.format_version = None,
            Field::TextLength => self.text_length = None,
            Field::Version => self.version = None,
            Field::ExtractionDate => self.extraction_date = None,
            Field::ExtractionVersion => self.extraction_version = None,
        }
    }

    /// Returns the textual value of a field, `None` if unset.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<String> {
        match field {
            Field::CidLength => self.cid_length.map(|v| v.to_string()),
            Field::Count => self.count.map(|v| v.to_string()),
            Field::Database => self.database.clone(),
            Field::Date => self.date.as_ref().map(ToString::to_string),
            Field::Game => self.game.clone(),
            Field::Locale => self.locale.clone(),
            Field::Checksum => self.checksum.clone(),
            Field::FormatVersion => self.format_version.map(|v| v.to_string()),
            Field::TextLength => self.text_length.map(|v| v.to_string()),
            Field::Version => self.version.clone(),
            Field::ExtractionDate => self.extraction_date.as_ref().map(ToString::to_string),
            Field::ExtractionVersion => self.extraction_version.clone(),
        }
    }

    /// Returns `true` if the header is in the extracted shape.
    #[must_use]
    pub fn is_extracted(&self) -> bool {
        self.extraction_marker || self.extraction_date.is_some() || self.extraction_version.is_some()
    }

    /// Number of records.
    #[must_use]
    pub fn count(&self) -> Option<u64> {
        self.count
    }

    /// Generation timestamp.
    #[must_use]
    pub fn date(&self) -> Option<&MetaDate> {
        self.date.as_ref()
    }

    /// Extraction timestamp.
    #[must_use]
    pub fn extraction_date(&self) -> Option<&MetaDate> {
        self.extraction_date.as_ref()
    }

    /// Game the file was generated for.
    #[must_use]
    pub fn game(&self) -> Option<&str> {
        self.game.as_deref()
    }

    /// Locale of the file, e.g. `en_us`.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Hex checksum of the data file.
    #[must_use]
    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    /// Maximum text length in bytes.
    #[must_use]
    pub fn text_length(&self) -> Option<u64> {
        self.text_length
    }

    /// Recomputes the derived fields after the data file was written.
    ///
    /// The locale is only guessed from the data file name if unset.
    pub(crate) fn refresh(
        &mut self,
        count: u64,
        checksum: &crate::Checksum,
        text_length: u64,
        data_path: &Path,
    ) {
        self.count = Some(count);

        if self.is_extracted() {
            return;
        }

        self.checksum = Some(checksum.to_string());
        self.text_length = Some(text_length);

        if self.locale.is_none() {
            self.locale = guess_locale(data_path);
        }
    }

    /// Writes the header lines.
    pub fn encode_into<W: Write>(
        &self,
        writer: &mut W,
        ending: LineEnding,
    ) -> Result<(), EncodeError> {
        let ending = ending.as_str();

        let fields: &[Field] = if self.is_extracted() {
            write!(writer, "{LINE_PREFIX}{ending}")?;
            &Field::EXTRACTED
        } else {
            &Field::STANDARD
        };

        for field in fields {
            let value = self.get(*field);
            let value = value.as_deref().unwrap_or(UNKNOWN);
            write!(writer, "{LINE_PREFIX} {}:\t{value}{ending}", field.name())?;
        }

        Ok(())
    }
}

/// Guesses the locale from a data file name, e.g. `en_us_data.dat` → `en_us`.
#[must_use]
pub fn guess_locale(data_path: &Path) -> Option<String> {
    let stem = data_path.file_stem()?.to_str()?;
    let stem = stem.strip_suffix("_data").unwrap_or(stem);

    let (language, region) = stem.split_once('_')?;

    let is_alpha = |s: &str, min: usize, max: usize| {
        (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_alphabetic())
    };

    (is_alpha(language, 2, 3) && is_alpha(region, 2, 4)).then(|| stem.to_owned())
}
