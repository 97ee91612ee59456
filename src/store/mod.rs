// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

mod id_index;

pub use id_index::IdIndex;

use crate::{
    coding::DecodeError,
    directory::Directory,
    error::Unsupported,
    reader::{DataFile, LocatedReader},
    resolver::{id_hash, IdAllocator},
    writer::Writer,
    Checksum, Config, Error, LineEnding, Metadata, OpenMode, Preamble, Record, Tag,
};
use std::{cell::OnceCell, collections::BTreeMap, path::Path, time::Instant};

/// Stable reference to a record of a [`RecordStore`]
///
/// Handles stay valid across insertions and removals of other records, but
/// are not carried over to the store returned by [`RecordStore::write`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct RecordHandle(pub(crate) usize);

/// In-memory view of a data/directory file pair
///
/// Every record is reachable through its hash. Single-valued kinds own their
/// hash exclusively, bucket kinds share it with other bucket records.
///
/// The identifier index is expensive to build (it hashes the identifier
/// space), so it is only built on first use.
pub struct RecordStore {
    config: Config,

    metadata: Metadata,
    preamble: Preamble,
    line_ending: LineEnding,

    /// Record arena, removal vacates the slot so handles stay stable
    records: Vec<Option<Record>>,

    /// Hash index, buckets keep insertion order
    by_hash: BTreeMap<u32, Vec<RecordHandle>>,

    id_index: OnceCell<IdIndex>,
    allocator: IdAllocator,
}

impl RecordStore {
    pub(crate) fn create_new(config: Config) -> Self {
        let line_ending = config.line_ending.unwrap_or_else(LineEnding::native);
        let allocator = config.resolver().allocator();

        Self {
            config,
            metadata: Metadata::default(),
            preamble: Preamble::default(),
            line_ending,
            records: Vec::new(),
            by_hash: BTreeMap::new(),
            id_index: OnceCell::new(),
            allocator,
        }
    }

    pub(crate) fn open(config: Config) -> crate::Result<Self> {
        log::debug!(
            "Opening {} in {} mode",
            config.data_path.display(),
            config.mode,
        );

        match config.mode {
            OpenMode::Strict => {
                let directory = Directory::read(&config.directory_path, config.chunk_size)?;
                Self::from_directory(config, directory)
            }
            OpenMode::Normal => {
                // The location table of a quirk pair is never parsed
                let metadata =
                    Directory::read_metadata(&config.directory_path, config.chunk_size)?;

                if config.is_quirk(&metadata) {
                    log::warn!(
                        "Not trusting directory {} of a {:?}/{:?} file, streaming {}",
                        config.directory_path.display(),
                        metadata.game(),
                        metadata.locale(),
                        config.data_path.display(),
                    );
                    return Self::from_stream(config, metadata);
                }

                let directory = Directory::read(&config.directory_path, config.chunk_size)?;
                Self::from_directory(config, directory)
            }
            OpenMode::Lenient => {
                let result = Directory::read(&config.directory_path, config.chunk_size)
                    .and_then(|directory| Self::from_directory(config.clone(), directory));

                match result {
                    Ok(store) => Ok(store),
                    Err(e) => {
                        log::warn!(
                            "Could not open {} through its directory, streaming it instead: {e}",
                            config.data_path.display(),
                        );

                        let metadata =
                            Directory::read_metadata(&config.directory_path, config.chunk_size)
                                .unwrap_or_else(|e| {
                                    log::warn!("Ignoring unreadable directory header: {e}");
                                    Metadata::default()
                                });

                        Self::from_stream(config, metadata)
                    }
                }
            }
        }
    }

    fn from_directory(config: Config, directory: Directory) -> crate::Result<Self> {
        let data = LocatedReader::open(&config.data_path, config.chunk_size)?
            .read_all(&directory.locations)?;

        Self::build(config, directory.metadata, data)
    }

    fn from_stream(config: Config, metadata: Metadata) -> crate::Result<Self> {
        let data = config.stream()?.read_all()?;
        Self::build(config, metadata, data)
    }

    fn build(config: Config, metadata: Metadata, data: DataFile) -> crate::Result<Self> {
        let start = Instant::now();

        let mut store = Self::create_new(config);
        store.metadata = metadata;
        store.preamble = data.preamble;

        if store.config.line_ending.is_none() {
            if let Some(line_ending) = data.line_ending {
                store.line_ending = line_ending;
            }
        }

        store.records.reserve(data.records.len());

        for record in data.records {
            store.insert(record)?;
        }

        if let Some(count) = store.metadata.count() {
            if count != store.len() as u64 {
                log::warn!(
                    "Header of {} declares {count} records, found {}",
                    store.config.data_path.display(),
                    store.len(),
                );
            }
        }

        log::debug!(
            "Loaded {} records under {} hashes in {:?}",
            store.len(),
            store.by_hash.len(),
            start.elapsed(),
        );

        Ok(store)
    }

    fn record(&self, handle: RecordHandle) -> Option<&Record> {
        self.records.get(handle.0)?.as_ref()
    }

    /// Path of the data file.
    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.config.data_path
    }

    /// Path of the directory file.
    #[must_use]
    pub fn directory_path(&self) -> &Path {
        &self.config.directory_path
    }

    /// Header, as read or as last written.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Mutable header, used for the next write.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Data file preamble, written back verbatim.
    #[must_use]
    pub fn preamble(&self) -> Preamble {
        self.preamble
    }

    /// Line terminator used for writing.
    #[must_use]
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Returns `true` if the header marks the foreign identifier scheme.
    #[must_use]
    pub fn is_foreign_scheme(&self) -> bool {
        self.config.is_foreign_scheme(&self.metadata)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_hash.values().map(Vec::len).sum()
    }

    /// Returns `true` if there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    /// Returns the records stored under a hash.
    pub fn get(&self, hash: u32) -> impl Iterator<Item = &Record> + '_ {
        self.by_hash
            .get(&hash)
            .into_iter()
            .flatten()
            .filter_map(|handle| self.record(*handle))
    }

    /// Returns the record behind a handle, if it was not removed.
    #[must_use]
    pub fn get_handle(&self, handle: RecordHandle) -> Option<&Record> {
        self.record(handle)
    }

    /// Iterates over all records in hash order; records sharing a hash keep
    /// their insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (RecordHandle, &Record)> + '_ {
        self.by_hash
            .values()
            .flatten()
            .filter_map(|handle| self.record(*handle).map(|record| (*handle, record)))
    }

    /// Returns the identifier index, building it on first access.
    ///
    /// # Errors
    ///
    /// Fails with [`Unsupported::IdIndex`] if the file uses the foreign
    /// identifier scheme, its identifiers cannot be recovered.
    pub fn by_id(&self) -> crate::Result<&IdIndex> {
        if self.is_foreign_scheme() {
            return Err(Error::Unsupported(Unsupported::IdIndex));
        }

        Ok(self
            .id_index
            .get_or_init(|| IdIndex::build(&self.records, &self.config.resolver())))
    }

    /// Looks up a record by identifier.
    pub fn get_by_id(&self, id: u32) -> crate::Result<Option<&Record>> {
        let handle = self.by_id()?.get(id);
        Ok(handle.and_then(|handle| self.record(handle)))
    }

    /// Returns the identifier of a record, if it has one.
    pub fn id_of(&self, handle: RecordHandle) -> crate::Result<Option<u32>> {
        Ok(self.by_id()?.id_of(handle))
    }

    /// Inserts a record as-is.
    ///
    /// # Errors
    ///
    /// Fails with [`DecodeError::DuplicateHash`] if the hash is taken and
    /// either side is a single-valued kind.
    pub fn insert(&mut self, record: Record) -> crate::Result<RecordHandle> {
        if let Some(handles) = self.by_hash.get(&record.hash) {
            let is_shared = record.tag.is_bucket()
                && handles
                    .iter()
                    .filter_map(|handle| self.record(*handle))
                    .all(|other| other.tag.is_bucket());

            if !is_shared {
                return Err(DecodeError::DuplicateHash(record.hash).into());
            }
        }

        let handle = RecordHandle(self.records.len());
        let (hash, tag, text_id) = (record.hash, record.tag, record.text_id());

        self.records.push(Some(record));
        self.by_hash.entry(hash).or_default().push(handle);

        let is_stale = match self.id_index.get_mut() {
            Some(index) if tag.has_text_id() => {
                if let Some(id) = text_id {
                    index.insert(id, handle);
                }
                false
            }
            Some(_) => tag.resolves_id(),
            None => false,
        };

        if is_stale {
            log::debug!("Dropping identifier index, record {hash} needs resolving");
            self.id_index.take();
        }

        Ok(handle)
    }

    /// Adds a text under the next unused identifier and returns the
    /// identifier.
    ///
    /// Identifiers whose hash is already stored are skipped, so the new
    /// record never shares a hash.
    ///
    /// # Errors
    ///
    /// Fails with [`Unsupported::Insert`] on files using the foreign
    /// identifier scheme, and with [`Error::IdSpaceExhausted`] if no
    /// identifier is left.
    pub fn add<S: Into<String>>(&mut self, text: S) -> crate::Result<u32> {
        if self.is_foreign_scheme() {
            return Err(Error::Unsupported(Unsupported::Insert));
        }

        let text = text.into();
        let tag = Tag::for_text(&text);

        let (id, hash) = loop {
            let index = self
                .id_index
                .get_or_init(|| IdIndex::build(&self.records, &self.config.resolver()));

            let id = self.allocator.next_unused(|id| index.contains(id))?;
            let hash = id_hash(id);

            if !self.by_hash.contains_key(&hash) {
                break (id, hash);
            }

            log::debug!("Identifier {id} collides with stored hash {hash}, skipping");
        };

        let handle = RecordHandle(self.records.len());

        self.records.push(Some(Record::new(hash, tag, text)));
        self.by_hash.insert(hash, vec![handle]);

        if let Some(index) = self.id_index.get_mut() {
            index.insert(id, handle);
        }

        log::trace!("Added record {hash} ({tag}) as identifier {id}");

        Ok(id)
    }

    /// Replaces the text of every matching record, keeping hash, tag and
    /// identifier. Returns the number of replaced records.
    ///
    /// Bucket records keep their suffix, see [`Record::set_text`].
    pub fn replace<M: FnMut(&Record) -> bool>(&mut self, matcher: M, text: &str) -> usize {
        self.replace_with(matcher, |_| text.to_owned())
    }

    /// Like [`RecordStore::replace`], computing each new text from the
    /// matched record.
    pub fn replace_with<M, F>(&mut self, mut matcher: M, mut f: F) -> usize
    where
        M: FnMut(&Record) -> bool,
        F: FnMut(&Record) -> String,
    {
        let mut count = 0;

        for record in self.records.iter_mut().flatten() {
            if matcher(record) {
                let text = f(record);
                record.set_text(text);
                count += 1;
            }
        }

        log::trace!("Replaced {count} records");

        count
    }

    /// Removes every matching record and returns how many were removed.
    ///
    /// A hash disappears once its last record is removed.
    pub fn remove<M: FnMut(&Record) -> bool>(&mut self, mut matcher: M) -> usize {
        let mut count = 0;

        let records = &mut self.records;
        let mut index = self.id_index.get_mut();

        self.by_hash.retain(|_, handles| {
            handles.retain(|handle| {
                let Some(slot) = records.get_mut(handle.0) else {
                    return false;
                };

                let is_match = slot.as_ref().is_some_and(&mut matcher);

                if is_match {
                    *slot = None;
                    count += 1;

                    if let Some(index) = index.as_mut() {
                        index.remove(*handle);
                    }
                }

                !is_match
            });

            !handles.is_empty()
        });

        log::trace!("Removed {count} records");

        count
    }

    /// Writes the store back to its own file pair, see
    /// [`RecordStore::write_to`].
    pub fn write(&self) -> crate::Result<Self> {
        self.write_to(&self.config.data_path, &self.config.directory_path)
    }

    /// Writes all records in hash order and returns a store bound to the
    /// written files.
    ///
    /// The header's count, checksum and text length are recomputed. This
    /// store stays usable but no longer reflects what is on disk.
    pub fn write_to<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        data_path: P,
        directory_path: Q,
    ) -> crate::Result<Self> {
        let data_path = data_path.as_ref();
        let directory_path = directory_path.as_ref();

        let directory = Writer::new(data_path, directory_path)
            .use_preamble(self.preamble)
            .use_line_ending(self.line_ending)
            .use_metadata(self.metadata.clone())
            .write(self.iter().map(|(_, record)| record))?;

        let mut config = self.config.clone();
        config.data_path = data_path.to_path_buf();
        config.directory_path = directory_path.to_path_buf();

        let data = DataFile {
            preamble: self.preamble,
            line_ending: Some(self.line_ending),
            records: self.iter().map(|(_, record)| record.clone()).collect(),
        };

        Self::build(config, directory.metadata, data)
    }

    /// Compares the data file on disk against the header checksum.
    ///
    /// Returns `None` if the header carries no checksum.
    pub fn verify_checksum(&self) -> crate::Result<Option<bool>> {
        let Some(expected) = self.metadata.checksum() else {
            return Ok(None);
        };

        let actual = Checksum::of_file(&self.config.data_path)?;

        Ok(Some(actual.to_string().eq_ignore_ascii_case(expected)))
    }
}
