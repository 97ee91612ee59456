// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::coding::DecodeError;

/// Record kind, stored as a 4-letter literal
///
/// `u…` tags are single-valued: a hash maps to at most one record.
/// `m…` tags are buckets: many records may share one hash and are told apart
/// by a suffix embedded in their text.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[allow(clippy::module_name_repetitions)]
pub enum Tag {
    /// Text generated from `Global.Text.<id>`
    Ucdt,

    /// Empty text generated from `Global.Text.<id>`
    Ucdn,

    /// Single-valued, outside the identifier scheme
    Ugdt,

    /// Single-valued, outside the identifier scheme
    Ugdn,

    /// Single-valued, outside the identifier scheme
    Utdt,

    /// Per-locale macro
    Umdt,

    /// Display name
    Uidt,

    /// Bucket, suffix `\t0017\tGlobal.Text.<id>`
    Mcdt,

    /// Bucket, suffix `\t0017\tGlobal.Text.<id>`
    Mcdn,

    /// Bucket, suffix `\t0006\t<key>`
    Mgdt,
}

impl Tag {
    /// Every tag, in no particular order.
    pub const ALL: [Self; 10] = [
        Self::Ucdt,
        Self::Ucdn,
        Self::Ugdt,
        Self::Ugdn,
        Self::Utdt,
        Self::Umdt,
        Self::Uidt,
        Self::Mcdt,
        Self::Mcdn,
        Self::Mgdt,
    ];

    /// Length of every tag literal.
    pub const LEN: usize = 4;

    /// Returns the on-disk literal.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ucdt => "ucdt",
            Self::Ucdn => "ucdn",
            Self::Ugdt => "ugdt",
            Self::Ugdn => "ugdn",
            Self::Utdt => "utdt",
            Self::Umdt => "umdt",
            Self::Uidt => "uidt",
            Self::Mcdt => "mcdt",
            Self::Mcdn => "mcdn",
            Self::Mgdt => "mgdt",
        }
    }

    /// Returns `true` if several records may share one hash.
    #[must_use]
    pub fn is_bucket(self) -> bool {
        match self {
            Self::Mcdt | Self::Mcdn | Self::Mgdt => true,
            Self::Ucdt
            | Self::Ucdn
            | Self::Ugdt
            | Self::Ugdn
            | Self::Utdt
            | Self::Umdt
            | Self::Uidt => false,
        }
    }

    /// Returns `true` if a hash maps to at most one record.
    #[must_use]
    pub fn is_single_valued(self) -> bool {
        !self.is_bucket()
    }

    /// Returns `true` if the identifier is recovered by resolving the hash.
    #[must_use]
    pub fn resolves_id(self) -> bool {
        match self {
            Self::Ucdt | Self::Ucdn => true,
            Self::Ugdt
            | Self::Ugdn
            | Self::Utdt
            | Self::Umdt
            | Self::Uidt
            | Self::Mcdt
            | Self::Mcdn
            | Self::Mgdt => false,
        }
    }

    /// Returns `true` if the identifier is spelled out in the text suffix.
    #[must_use]
    pub fn has_text_id(self) -> bool {
        match self {
            Self::Mcdt | Self::Mcdn => true,
            Self::Ucdt
            | Self::Ucdn
            | Self::Ugdt
            | Self::Ugdn
            | Self::Utdt
            | Self::Umdt
            | Self::Uidt
            | Self::Mgdt => false,
        }
    }

    /// Returns `true` if records of this kind appear in the identifier index.
    #[must_use]
    pub fn is_id_bearing(self) -> bool {
        self.resolves_id() || self.has_text_id()
    }

    /// Tag of a newly inserted record with the given text.
    #[must_use]
    pub fn for_text(text: &str) -> Self {
        if text.is_empty() {
            Self::Ucdn
        } else {
            Self::Ucdt
        }
    }
}

impl std::str::FromStr for Tag {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ucdt" => Ok(Self::Ucdt),
            "ucdn" => Ok(Self::Ucdn),
            "ugdt" => Ok(Self::Ugdt),
            "ugdn" => Ok(Self::Ugdn),
            "utdt" => Ok(Self::Utdt),
            "umdt" => Ok(Self::Umdt),
            "uidt" => Ok(Self::Uidt),
            "mcdt" => Ok(Self::Mcdt),
            "mcdn" => Ok(Self::Mcdn),
            "mgdt" => Ok(Self::Mgdt),
            _ => Err(DecodeError::InvalidTag(s.to_owned())),
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn tag_literal_round_trip() {
        for tag in Tag::ALL {
            assert_eq!(Tag::LEN, tag.as_str().len());
            assert_eq!(tag, tag.as_str().parse::<Tag>().unwrap());
        }
    }

    #[test]
    fn tag_unknown_literal() {
        assert!(matches!(
            "xxdt".parse::<Tag>(),
            Err(DecodeError::InvalidTag(s)) if s == "xxdt",
        ));
        assert!("UCDT".parse::<Tag>().is_err());
    }

    #[test]
    fn tag_families() {
        let buckets = Tag::ALL.into_iter().filter(|t| t.is_bucket()).count();
        assert_eq!(3, buckets);

        assert!(Tag::Ucdt.resolves_id());
        assert!(!Tag::Uidt.is_id_bearing());
        assert!(Tag::Mcdn.is_id_bearing());
        assert!(!Tag::Mgdt.is_id_bearing());
    }

    #[test]
    fn tag_for_text() {
        assert_eq!(Tag::Ucdn, Tag::for_text(""));
        assert_eq!(Tag::Ucdt, Tag::for_text("x"));
    }
}
