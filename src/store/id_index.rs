// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::RecordHandle;
use crate::{HashMap, HashSet, IdentityResolver, Record};

/// Bidirectional mapping between identifiers and records
///
/// Identifiers live here instead of inside [`Record`], so two records with
/// equal hash, tag and text stay equal no matter which identifier they carry.
#[derive(Clone, Debug, Default)]
pub struct IdIndex {
    by_id: HashMap<u32, RecordHandle>,
    by_handle: HashMap<RecordHandle, u32>,
}

impl IdIndex {
    /// Builds the index over a record arena.
    ///
    /// `ucdt`/`ucdn` identifiers are recovered by hashing the identifier
    /// space, `mcdt`/`mcdn` identifiers are read from their text suffix.
    pub(crate) fn build(records: &[Option<Record>], resolver: &IdentityResolver) -> Self {
        let hashes = records
            .iter()
            .flatten()
            .filter(|record| record.tag.resolves_id())
            .map(|record| record.hash)
            .collect::<HashSet<_>>();

        let id_by_hash = resolver
            .resolve_all(&hashes)
            .into_iter()
            .map(|(id, hash)| (hash, id))
            .collect::<HashMap<_, _>>();

        let mut index = Self::default();

        for (idx, record) in records.iter().enumerate() {
            let Some(record) = record else {
                continue;
            };

            let id = if record.tag.resolves_id() {
                id_by_hash.get(&record.hash).copied()
            } else if record.tag.has_text_id() {
                record.text_id()
            } else {
                None
            };

            if let Some(id) = id {
                index.insert(id, RecordHandle(idx));
            }
        }

        log::debug!("Built identifier index with {} entries", index.len());

        index
    }

    /// Maps an identifier to a record, unless the identifier is taken.
    pub(crate) fn insert(&mut self, id: u32, handle: RecordHandle) -> bool {
        if self.by_id.contains_key(&id) {
            log::warn!("Identifier {id} is claimed by more than one record, keeping the first");
            return false;
        }

        self.by_id.insert(id, handle);
        self.by_handle.insert(handle, id);
        true
    }

    /// Drops the mapping of a record, returning its identifier.
    pub(crate) fn remove(&mut self, handle: RecordHandle) -> Option<u32> {
        let id = self.by_handle.remove(&handle)?;
        self.by_id.remove(&id);
        Some(id)
    }

    /// Returns the record an identifier maps to.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<RecordHandle> {
        self.by_id.get(&id).copied()
    }

    /// Returns the identifier of a record.
    #[must_use]
    pub fn id_of(&self, handle: RecordHandle) -> Option<u32> {
        self.by_handle.get(&handle).copied()
    }

    /// Returns `true` if the identifier is in use.
    #[must_use]
    pub fn contains(&self, id: u32) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Number of identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns `true` if no record has an identifier.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterates over identifier/record pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, RecordHandle)> + '_ {
        self.by_id.iter().map(|(id, handle)| (*id, *handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{resolver::id_hash, Tag};
    use test_log::test;

    #[test]
    fn id_index_build() {
        let records = vec![
            Some(Record::new(id_hash(3), Tag::Ucdt, "three")),
            None,
            Some(Record::new(id_hash(7), Tag::Ucdn, "")),
            Some(Record::new(id_hash(8), Tag::Ugdt, "not indexed")),
            Some(Record::new(1, Tag::Mcdt, "a\t0017\tGlobal.Text.20")),
            Some(Record::new(2, Tag::Mgdt, "b\t0006\tkey")),
            Some(Record::new(3, Tag::Ucdt, "outside the identifier space")),
        ];

        let index = IdIndex::build(&records, &IdentityResolver::with_max_id(10));

        assert_eq!(3, index.len());
        assert_eq!(Some(RecordHandle(0)), index.get(3));
        assert_eq!(Some(RecordHandle(2)), index.get(7));
        assert_eq!(Some(RecordHandle(4)), index.get(20));
        assert!(!index.contains(8));
        assert_eq!(None, index.id_of(RecordHandle(5)));
    }

    #[test]
    fn id_index_first_claim_wins() {
        let records = vec![
            Some(Record::new(1, Tag::Mcdt, "a\t0017\tGlobal.Text.5")),
            Some(Record::new(1, Tag::Mcdt, "b\t0017\tGlobal.Text.5")),
        ];

        let index = IdIndex::build(&records, &IdentityResolver::with_max_id(0));

        assert_eq!(1, index.len());
        assert_eq!(Some(RecordHandle(0)), index.get(5));
        assert_eq!(None, index.id_of(RecordHandle(1)));
    }

    #[test]
    fn id_index_remove() {
        let mut index = IdIndex::default();
        assert!(index.insert(4, RecordHandle(0)));
        assert!(!index.insert(4, RecordHandle(1)));

        assert_eq!(Some(4), index.remove(RecordHandle(0)));
        assert_eq!(None, index.remove(RecordHandle(0)));
        assert!(index.is_empty());
    }
}
