// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    coding::{Decode, DecodeError, Encode, EncodeError},
    hash::hash_str,
    resolver::ID_PREFIX,
    Tag,
};
use std::io::Write;

/// Marker field in front of a `Global.Text.<id>` suffix
const TEXT_ID_MARKER: &str = "0017";

/// Marker field in front of a key suffix
const KEY_MARKER: &str = "0006";

/// Bytes between the start of a bucket suffix and its last tab
/// (`\t` + 4-digit marker)
const SUFFIX_HEAD_LEN: usize = 5;

/// Bytes from the first tab of a line to the start of its text
/// (`\t` + tag + `\t`)
const TEXT_START_LEN: usize = Tag::LEN + 2;

/// Disambiguating suffix of a bucket record's text
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Suffix<'a> {
    /// `\t0017\tGlobal.Text.<id>`
    TextId(u32),

    /// `\t0006\t<key>`, `hash(key)` reproduces the record hash
    Key(&'a str),
}

/// A single localized text record
///
/// Identifiers are deliberately not part of a record: a record is equal to
/// another one if hash, tag and text are equal.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Record {
    /// Primary key
    pub hash: u32,

    /// Record kind
    pub tag: Tag,

    /// Text, including the suffix for bucket kinds
    pub text: String,
}

impl Record {
    /// Creates a record.
    pub fn new<S: Into<String>>(hash: u32, tag: Tag, text: S) -> Self {
        Self {
            hash,
            tag,
            text: text.into(),
        }
    }

    /// Splits the text into display part and suffix fields,
    /// i.e. `(display, marker, last)`.
    fn split_suffix(&self) -> Option<(&str, &str, &str)> {
        let (head, last) = self.text.rsplit_once('\t')?;
        let (display, marker) = head.rsplit_once('\t')?;
        Some((display, marker, last))
    }

    /// Parses the bucket suffix, if the record is a bucket kind and
    /// carries a well-formed one.
    #[must_use]
    pub fn suffix(&self) -> Option<Suffix<'_>> {
        let (_, marker, last) = self.split_suffix()?;

        match self.tag {
            Tag::Mcdt | Tag::Mcdn => {
                if marker != TEXT_ID_MARKER {
                    return None;
                }
                let id = last.strip_prefix(ID_PREFIX)?;
                parse_decimal(id).map(Suffix::TextId)
            }
            Tag::Mgdt => (marker == KEY_MARKER).then_some(Suffix::Key(last)),
            Tag::Ucdt
            | Tag::Ucdn
            | Tag::Ugdt
            | Tag::Ugdn
            | Tag::Utdt
            | Tag::Umdt
            | Tag::Uidt => None,
        }
    }

    /// Returns the text without any bucket suffix.
    #[must_use]
    pub fn display_text(&self) -> &str {
        if self.suffix().is_some() {
            if let Some((display, _, _)) = self.split_suffix() {
                return display;
            }
        }
        &self.text
    }

    /// Suffix as written in the text, empty if the record has none.
    fn raw_suffix(&self) -> &str {
        self.text
            .strip_prefix(self.display_text())
            .unwrap_or_default()
    }

    /// Replaces the text while keeping the bucket suffix.
    ///
    /// A new text ending in the record's current suffix is taken as is, any
    /// other text only replaces the display part.
    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        let mut text = text.into();
        let suffix = self.raw_suffix();

        if !text.ends_with(suffix) {
            text.push_str(suffix);
        }

        self.text = text;
    }

    /// Identifier spelled out in the text suffix, if any.
    #[must_use]
    pub fn text_id(&self) -> Option<u32> {
        match self.suffix()? {
            Suffix::TextId(id) => Some(id),
            Suffix::Key(_) => None,
        }
    }

    /// For records with a key suffix, checks that the key hashes to the
    /// record hash.
    #[must_use]
    pub fn suffix_hash_matches(&self) -> Option<bool> {
        match self.suffix()? {
            Suffix::Key(key) => Some(hash_str(key) == self.hash),
            Suffix::TextId(_) => None,
        }
    }

    /// Byte length that the directory declares for this record's line.
    ///
    /// For bucket kinds the declared size ends 5 bytes before the line's
    /// last tab, so the suffix is left out.
    pub fn declared_size(&self) -> Result<i32, EncodeError> {
        let line = self.encode_into_string()?;

        let size = if self.tag.is_bucket() {
            let too_short = || EncodeError::SuffixTooShort {
                hash: self.hash,
                line: line.clone(),
            };

            let first_tab = line.find('\t').ok_or_else(too_short)?;
            let last_tab = line.rfind('\t').ok_or_else(too_short)?;

            // NOTE: Fixed-width assumption about the suffix, see DESIGN.md
            let end = last_tab
                .checked_sub(SUFFIX_HEAD_LEN)
                .ok_or_else(too_short)?;

            if end < first_tab + TEXT_START_LEN {
                return Err(too_short());
            }

            end
        } else {
            line.len()
        };

        i32::try_from(size).map_err(|_| {
            EncodeError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("record {} too large", self.hash),
            ))
        })
    }
}

/// Parses a non-empty run of ASCII digits.
pub(crate) fn parse_decimal<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Returns `true` if the line is shaped like a record line
/// (`<u32><TAB><4 letters><TAB>`).
///
/// The tag literal is not checked, so a record line with an unknown tag is
/// reported as such instead of being taken for continued text.
#[must_use]
pub fn is_record_start(line: &str) -> bool {
    let Some((hash, rest)) = line.split_once('\t') else {
        return false;
    };
    let Some((tag, _)) = rest.split_once('\t') else {
        return false;
    };

    parse_decimal::<u32>(hash).is_some()
        && tag.len() == Tag::LEN
        && tag.bytes().all(|b| b.is_ascii_alphabetic())
}

impl Encode for Record {
    fn encode_into<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
        write!(writer, "{}\t{}\t{}", self.hash, self.tag, self.text)?;
        Ok(())
    }
}

impl Decode for Record {
    fn decode_from(line: &str) -> Result<Self, DecodeError> {
        let invalid = || DecodeError::InvalidRecordLine(line.to_owned());

        let (hash, rest) = line.split_once('\t').ok_or_else(invalid)?;
        let (tag, text) = rest.split_once('\t').ok_or_else(invalid)?;

        let hash = parse_decimal(hash).ok_or_else(invalid)?;
        let tag = tag.parse()?;

        Ok(Self::new(hash, tag, text))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn record_parse_simple() {
        let record = Record::decode_from("905058873\tucdt\tCoin Flow Saw").unwrap();

        assert_eq!(905_058_873, record.hash);
        assert_eq!(Tag::Ucdt, record.tag);
        assert_eq!("Coin Flow Saw", record.text);
    }

    #[test]
    fn record_serialize_simple() {
        let record = Record::new(905_058_873, Tag::Ucdt, "Coin Flow Saw");

        let mut line = record.encode_into_string().unwrap();
        line.push_str(crate::LineEnding::Lf.as_str());

        assert_eq!("905058873\tucdt\tCoin Flow Saw\n", line);
        assert_eq!(27, line.len());
        assert_eq!(26, record.declared_size().unwrap());
    }

    #[test]
    fn record_text_keeps_tabs() {
        let record = Record::decode_from("1\tmcdt\ta\tb\t0017\tGlobal.Text.5").unwrap();
        assert_eq!("a\tb\t0017\tGlobal.Text.5", record.text);
        assert_eq!("a\tb", record.display_text());
        assert_eq!(Some(5), record.text_id());
    }

    #[test]
    fn record_empty_text() {
        let record = Record::decode_from("7\tucdn\t").unwrap();
        assert_eq!("", record.text);
    }

    #[test]
    fn record_parse_errors() {
        assert!(matches!(
            Record::decode_from("no tabs here"),
            Err(DecodeError::InvalidRecordLine(_)),
        ));
        assert!(matches!(
            Record::decode_from("12\tucdt"),
            Err(DecodeError::InvalidRecordLine(_)),
        ));
        assert!(matches!(
            Record::decode_from("-12\tucdt\tx"),
            Err(DecodeError::InvalidRecordLine(_)),
        ));
        assert!(matches!(
            Record::decode_from("4294967296\tucdt\tx"),
            Err(DecodeError::InvalidRecordLine(_)),
        ));
        assert!(matches!(
            Record::decode_from("12\tabcd\tx"),
            Err(DecodeError::InvalidTag(_)),
        ));
    }

    #[test]
    fn record_is_record_start() {
        assert!(is_record_start("12\tucdt\tx"));
        assert!(is_record_start("12\tmgdt\t"));
        assert!(is_record_start("12\tnope\tx"));
        assert!(!is_record_start("second line of text"));
        assert!(!is_record_start("12\tno\tx"));
        assert!(!is_record_start("12\tucdt"));
        assert!(!is_record_start("x12\tucdt\tx"));
    }

    #[test]
    fn record_key_suffix() {
        let key = "Item.Name.Sword";
        let hash = hash_str(key);
        let record = Record::new(hash, Tag::Mgdt, format!("Sword\t0006\t{key}"));

        assert_eq!(Some(Suffix::Key(key)), record.suffix());
        assert_eq!(Some(true), record.suffix_hash_matches());
        assert_eq!("Sword", record.display_text());
    }

    #[test]
    fn record_without_suffix() {
        let record = Record::new(1, Tag::Mcdt, "plain");
        assert_eq!(None, record.suffix());
        assert_eq!("plain", record.display_text());

        let record = Record::new(1, Tag::Ucdt, "a\t0017\tGlobal.Text.5");
        assert_eq!(None, record.suffix());
    }

    #[test]
    fn record_set_text_keeps_suffix() {
        let mut record = Record::new(6, Tag::Mcdt, "b\t0017\tGlobal.Text.8");

        record.set_text("B");
        assert_eq!("B\t0017\tGlobal.Text.8", record.text);
        assert_eq!(Some(8), record.text_id());

        record.set_text("C\t0017\tGlobal.Text.8");
        assert_eq!("C\t0017\tGlobal.Text.8", record.text);

        record.set_text("");
        assert_eq!("\t0017\tGlobal.Text.8", record.text);
        assert!(record.declared_size().is_ok());

        let mut record = Record::new(hash_str("k"), Tag::Mgdt, "x\t0006\tk");
        record.set_text("y\twith tab");
        assert_eq!("y\twith tab\t0006\tk", record.text);
        assert_eq!(Some(Suffix::Key("k")), record.suffix());

        let mut record = Record::new(1, Tag::Ucdt, "old");
        record.set_text("new\t0017\tGlobal.Text.8");
        assert_eq!("new\t0017\tGlobal.Text.8", record.text);
    }

    #[test]
    fn record_bucket_declared_size() {
        let record = Record::new(123, Tag::Mcdt, "Text\t0017\tGlobal.Text.5");

        // "123\tmcdt\tText"
        assert_eq!(13, record.declared_size().unwrap());
    }

    #[test]
    fn record_bucket_declared_size_empty_display() {
        let record = Record::new(123, Tag::Mcdt, "\t0017\tGlobal.Text.5");
        assert_eq!(9, record.declared_size().unwrap());
    }

    #[test]
    fn record_bucket_too_short() {
        let record = Record::new(123, Tag::Mcdt, "no suffix");
        assert!(matches!(
            record.declared_size(),
            Err(EncodeError::SuffixTooShort { hash: 123, .. }),
        ));

        let record = Record::new(123, Tag::Mgdt, "\t06\tk");
        assert!(record.declared_size().is_err());
    }
}
