// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{coding::DecodeError, record::parse_decimal};

/// Header field of the directory file
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Field {
    /// `CidLength`
    CidLength,

    /// `Count`, shared by both shapes
    Count,

    /// `Database`
    Database,

    /// `Date`
    Date,

    /// `Game`
    Game,

    /// `Locale`
    Locale,

    /// `Checksum`
    Checksum,

    /// `FormatVersion`
    FormatVersion,

    /// `TextLength`
    TextLength,

    /// `Version`
    Version,

    /// `ExtractionDate`, extracted shape only
    ExtractionDate,

    /// `ExtractionVersion`, extracted shape only
    ExtractionVersion,
}

impl Field {
    /// Fields of the standard shape, in write order.
    pub const STANDARD: [Self; 10] = [
        Self::CidLength,
        Self::Count,
        Self::Database,
        Self::Date,
        Self::Game,
        Self::Locale,
        Self::Checksum,
        Self::FormatVersion,
        Self::TextLength,
        Self::Version,
    ];

    /// Fields of the extracted shape, in write order.
    pub const EXTRACTED: [Self; 3] = [Self::ExtractionDate, Self::Count, Self::ExtractionVersion];

    /// Returns the field's name as written in the file.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::CidLength => "CidLength",
            Self::Count => "Count",
            Self::Database => "Database",
            Self::Date => "Date",
            Self::Game => "Game",
            Self::Locale => "Locale",
            Self::Checksum => "Checksum",
            Self::FormatVersion => "FormatVersion",
            Self::TextLength => "TextLength",
            Self::Version => "Version",
            Self::ExtractionDate => "ExtractionDate",
            Self::ExtractionVersion => "ExtractionVersion",
        }
    }
}

impl std::str::FromStr for Field {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::STANDARD
            .into_iter()
            .chain(Self::EXTRACTED)
            .find(|field| field.name() == s)
            .ok_or_else(|| DecodeError::UnknownMetadataField(s.to_owned()))
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Timestamp in the `ddd MMM dd HH:mm:ss <zone> yyyy` shape,
/// e.g. `Thu Mar 13 10:10:13 PDT 2014`
///
/// The original spelling is kept so it is written back unchanged.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MetaDate {
    raw: String,

    /// 1-based month
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    zone: String,
    year: u16,
}

fn two_digits(s: &str, max: u8) -> Option<u8> {
    if s.len() != 2 {
        return None;
    }
    parse_decimal::<u8>(s).filter(|v| *v <= max)
}

impl MetaDate {
    /// Parses and validates a timestamp.
    pub fn parse(value: &str) -> Result<Self, DecodeError> {
        let invalid = || DecodeError::InvalidMetadataValue {
            field: "Date",
            value: value.to_owned(),
        };

        let mut parts = value.split(' ');
        let mut next = || parts.next().ok_or_else(invalid);

        let weekday = next()?;
        let month = next()?;
        let day = next()?;
        let time = next()?;
        let zone = next()?;
        let year = next()?;

        if parts.next().is_some() {
            return Err(invalid());
        }

        if !WEEKDAYS.contains(&weekday) {
            return Err(invalid());
        }

        let month = MONTHS
            .iter()
            .position(|m| *m == month)
            .ok_or_else(invalid)?;

        let day = two_digits(day, 31).filter(|d| *d >= 1).ok_or_else(invalid)?;

        let mut clock = time.split(':');
        let mut clock_part = |max| {
            clock
                .next()
                .and_then(|s| two_digits(s, max))
                .ok_or_else(invalid)
        };
        let hour = clock_part(23)?;
        let minute = clock_part(59)?;
        let second = clock_part(60)?;

        if clock.next().is_some() {
            return Err(invalid());
        }

        if zone.is_empty() || !zone.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(invalid());
        }

        if year.len() != 4 {
            return Err(invalid());
        }
        let year = parse_decimal::<u16>(year).ok_or_else(invalid)?;

        // NOTE: position in a 12 element array
        #[allow(clippy::cast_possible_truncation)]
        let month = month as u8 + 1;

        Ok(Self {
            raw: value.to_owned(),
            month,
            day,
            hour,
            minute,
            second,
            zone: zone.to_owned(),
            year,
        })
    }

    /// Returns the timestamp as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the time zone designator, e.g. `PDT`.
    #[must_use]
    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// Returns `(year, month, day)`, month is 1-based.
    #[must_use]
    pub fn date(&self) -> (u16, u8, u8) {
        (self.year, self.month, self.day)
    }

    /// Returns `(hour, minute, second)`.
    #[must_use]
    pub fn time(&self) -> (u8, u8, u8) {
        (self.hour, self.minute, self.second)
    }
}

impl std::fmt::Display for MetaDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Validates a hex checksum.
pub fn validate_checksum(value: &str) -> Result<(), DecodeError> {
    if !value.is_empty() && value.len() % 2 == 0 && value.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(DecodeError::InvalidMetadataValue {
            field: "Checksum",
            value: value.to_owned(),
        })
    }
}

/// Parses an unsigned integer field.
pub fn parse_unsigned(field: Field, value: &str) -> Result<u64, DecodeError> {
    parse_decimal(value).ok_or_else(|| DecodeError::InvalidMetadataValue {
        field: field.name(),
        value: value.to_owned(),
    })
}
