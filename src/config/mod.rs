// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

mod open_mode;

pub use open_mode::OpenMode;

use crate::{
    file::directory_path_for, line_codec::DEFAULT_CHUNK_SIZE, IdentityResolver, LineEnding,
    Metadata, RecordStore, RecordStream, MAX_ID,
};
use std::{
    fs::File,
    path::{Path, PathBuf},
};

/// `Game` value of files using the foreign identifier scheme
const DEFAULT_FOREIGN_SCHEME_GAME: &str = "h1z1";

/// Locale whose foreign-scheme directories do not match their data files
const DEFAULT_QUIRK_LOCALE: &str = "zh_CN";

/// Compares locales ignoring case and the `-`/`_` spelling difference.
fn locale_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes().zip(b.bytes()).all(|(a, b)| {
            let normalize = |c: u8| if c == b'-' { b'_' } else { c.to_ascii_lowercase() };
            normalize(a) == normalize(b)
        })
}

/// Record store configuration builder
#[derive(Clone, Debug)]
pub struct Config {
    /// Data file path
    #[doc(hidden)]
    pub data_path: PathBuf,

    /// Directory file path
    #[doc(hidden)]
    pub directory_path: PathBuf,

    /// How far the directory is trusted
    pub mode: OpenMode,

    /// Terminator used for writing, detected from the data file if unset
    pub line_ending: Option<LineEnding>,

    /// Read chunk size in bytes
    pub chunk_size: usize,

    /// `Game` values marking the foreign identifier scheme
    pub foreign_scheme_games: Vec<String>,

    /// Locale that, together with the foreign identifier scheme, makes
    /// [`OpenMode::Normal`] stream the data file
    pub quirk_locale: String,

    /// Upper bound of the identifier space
    #[doc(hidden)]
    pub max_id: u32,
}

impl Config {
    /// Initializes a new config for a data/directory file pair.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(data_path: P, directory_path: Q) -> Self {
        Self {
            data_path: data_path.as_ref().to_path_buf(),
            directory_path: directory_path.as_ref().to_path_buf(),
            mode: OpenMode::default(),
            line_ending: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            foreign_scheme_games: vec![DEFAULT_FOREIGN_SCHEME_GAME.into()],
            quirk_locale: DEFAULT_QUIRK_LOCALE.into(),
            max_id: MAX_ID,
        }
    }

    /// Initializes a new config for a data file, the directory file sits next
    /// to it with a `.dir` extension.
    pub fn from_data_path<P: AsRef<Path>>(data_path: P) -> Self {
        let data_path = data_path.as_ref();
        Self::new(data_path, directory_path_for(data_path))
    }

    /// Sets the open mode.
    ///
    /// Defaults to [`OpenMode::Normal`].
    #[must_use]
    pub fn mode(mut self, mode: OpenMode) -> Self {
        self.mode = mode;
        self
    }

    /// Overrides the line terminator used when writing.
    ///
    /// By default, the terminator ending the first data record is kept, and new
    /// stores use the platform's native one.
    #[must_use]
    pub fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = Some(line_ending);
        self
    }

    /// Sets the number of bytes read from disk at a time.
    ///
    /// Defaults to 64 KiB.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is 0.
    #[must_use]
    pub fn chunk_size(mut self, bytes: usize) -> Self {
        assert!(bytes > 0, "chunk size may not be 0");
        self.chunk_size = bytes;
        self
    }

    /// Sets the `Game` metadata values (compared case-insensitively) that mark
    /// a file as using the foreign identifier scheme.
    ///
    /// Defaults to `h1z1`.
    #[must_use]
    pub fn foreign_scheme_games<I, S>(mut self, games: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.foreign_scheme_games = games.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the locale that triggers the streaming fallback of
    /// [`OpenMode::Normal`] on foreign-scheme files.
    ///
    /// Defaults to `zh_CN`.
    #[must_use]
    pub fn quirk_locale<S: Into<String>>(mut self, locale: S) -> Self {
        self.quirk_locale = locale.into();
        self
    }

    /// Shrinks the identifier space.
    #[doc(hidden)]
    #[must_use]
    pub fn max_id(mut self, max_id: u32) -> Self {
        self.max_id = max_id;
        self
    }

    pub(crate) fn resolver(&self) -> IdentityResolver {
        IdentityResolver::with_max_id(self.max_id)
    }

    /// Returns `true` if the header marks the foreign identifier scheme.
    pub(crate) fn is_foreign_scheme(&self, metadata: &Metadata) -> bool {
        metadata.game().is_some_and(|game| {
            self.foreign_scheme_games
                .iter()
                .any(|g| g.eq_ignore_ascii_case(game))
        })
    }

    /// Returns `true` if the header matches the combination whose directory
    /// cannot be trusted.
    pub(crate) fn is_quirk(&self, metadata: &Metadata) -> bool {
        self.is_foreign_scheme(metadata)
            && metadata
                .locale()
                .is_some_and(|locale| locale_eq(locale, &self.quirk_locale))
    }

    /// Opens the file pair and builds a record store.
    pub fn open(self) -> crate::Result<RecordStore> {
        RecordStore::open(self)
    }

    /// Creates an empty record store that writes to the configured paths.
    #[must_use]
    pub fn create_new(self) -> RecordStore {
        RecordStore::create_new(self)
    }

    /// Streams the data file alone, ignoring the directory.
    pub fn stream(&self) -> crate::Result<RecordStream<File>> {
        RecordStream::open_with_chunk_size(&self.data_path, self.chunk_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Field;
    use test_log::test;

    fn metadata(game: &str, locale: &str) -> crate::Result<Metadata> {
        let mut metadata = Metadata::default();
        metadata.set(Field::Game, game)?;
        metadata.set(Field::Locale, locale)?;
        Ok(metadata)
    }

    #[test]
    fn config_directory_path() {
        let config = Config::from_data_path("/a/en_us_data.dat");
        assert_eq!(Path::new("/a/en_us_data.dir"), config.directory_path);
        assert_eq!(OpenMode::Normal, config.mode);
    }

    #[test]
    fn config_foreign_scheme() -> crate::Result<()> {
        let config = Config::from_data_path("x.dat");

        assert!(config.is_foreign_scheme(&metadata("H1Z1", "en_us")?));
        assert!(!config.is_foreign_scheme(&metadata("ps2", "en_us")?));
        assert!(!config.is_foreign_scheme(&Metadata::default()));

        let config = config.foreign_scheme_games(["other"]);
        assert!(!config.is_foreign_scheme(&metadata("h1z1", "en_us")?));
        assert!(config.is_foreign_scheme(&metadata("Other", "en_us")?));

        Ok(())
    }

    #[test]
    fn config_quirk_locale() -> crate::Result<()> {
        let config = Config::from_data_path("x.dat");

        assert!(config.is_quirk(&metadata("h1z1", "zh_CN")?));
        assert!(config.is_quirk(&metadata("h1z1", "zh-cn")?));
        assert!(!config.is_quirk(&metadata("h1z1", "zh_TW")?));
        assert!(!config.is_quirk(&metadata("ps2", "zh_CN")?));

        Ok(())
    }
}
