// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{hash::hash_units, HashMap, HashSet};
use std::time::Instant;

/// Highest identifier of the identifier space
pub const MAX_ID: u32 = 5_103_267;

/// Key prefix that identifiers are hashed with
pub const ID_PREFIX: &str = "Global.Text.";

/// Enough room for the prefix plus `u32::MAX` in decimal
const KEY_CAPACITY: usize = 32;

/// Reusable key buffer for `Global.Text.<id>`
///
/// Only the digits are rewritten per identifier, so hashing the whole
/// identifier space does not allocate.
struct IdKey {
    buf: [u8; KEY_CAPACITY],
}

impl IdKey {
    fn new() -> Self {
        let mut buf = [0; KEY_CAPACITY];

        if let Some(prefix) = buf.get_mut(..ID_PREFIX.len()) {
            prefix.copy_from_slice(ID_PREFIX.as_bytes());
        }

        Self { buf }
    }

    #[inline]
    fn hash(&mut self, id: u32) -> u32 {
        let mut digits = [0u8; 10];
        let mut start = digits.len();
        let mut rest = id;

        loop {
            start -= 1;

            // NOTE: rest % 10 < 10
            #[allow(clippy::cast_possible_truncation)]
            let digit = b'0' + (rest % 10) as u8;

            if let Some(slot) = digits.get_mut(start) {
                *slot = digit;
            }

            rest /= 10;
            if rest == 0 {
                break;
            }
        }

        let digits = digits.get(start..).unwrap_or_default();
        let end = ID_PREFIX.len() + digits.len();

        if let Some(tail) = self.buf.get_mut(ID_PREFIX.len()..end) {
            tail.copy_from_slice(digits);
        }

        hash_units(self.buf.get(..end).unwrap_or_default())
    }
}

/// Hashes an identifier, i.e. `hash("Global.Text.<id>")`.
#[must_use]
pub fn id_hash(id: u32) -> u32 {
    IdKey::new().hash(id)
}

/// Formats the key an identifier is hashed from.
#[must_use]
pub fn id_key(id: u32) -> String {
    format!("{ID_PREFIX}{id}")
}

/// Recovers identifiers from hashes by exhaustive trial over the
/// identifier space
///
/// There is no stored inverse of the hash, so the only way back from a
/// hash to its identifier is hashing every identifier in turn.
#[derive(Copy, Clone, Debug)]
pub struct IdentityResolver {
    max_id: u32,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self { max_id: MAX_ID }
    }
}

impl IdentityResolver {
    /// Creates a resolver over `[0, max_id]`.
    #[doc(hidden)]
    #[must_use]
    pub fn with_max_id(max_id: u32) -> Self {
        Self { max_id }
    }

    /// Highest identifier considered.
    #[must_use]
    pub fn max_id(&self) -> u32 {
        self.max_id
    }

    /// Maps identifiers to the hashes they produce, for every hash in
    /// `hashes` that some identifier produces.
    ///
    /// Hashes no identifier produces are left out, which is expected for
    /// hashes generated outside the `Global.Text.<id>` scheme.
    #[must_use]
    pub fn resolve_all(&self, hashes: &HashSet<u32>) -> HashMap<u32, u32> {
        let start = Instant::now();

        let mut pending = hashes.clone();
        let mut resolved = HashMap::default();
        resolved.reserve(pending.len());

        let mut key = IdKey::new();

        for id in 0..=self.max_id {
            if pending.is_empty() {
                break;
            }

            let hash = key.hash(id);

            if pending.remove(&hash) {
                resolved.insert(id, hash);
            }
        }

        log::info!(
            "Resolved {} of {} hashes in {:?}, {} left unresolved",
            resolved.len(),
            hashes.len(),
            start.elapsed(),
            pending.len(),
        );

        resolved
    }

    /// Returns an allocation cursor over `[1, max_id]`.
    #[must_use]
    pub fn allocator(&self) -> IdAllocator {
        IdAllocator {
            next: 1,
            max_id: self.max_id,
        }
    }
}

/// Resumable cursor handing out identifiers that are not in use yet
#[derive(Clone, Debug)]
pub struct IdAllocator {
    next: u32,
    max_id: u32,
}

impl IdAllocator {
    /// Returns the next identifier for which `is_used` is `false`.
    ///
    /// Identifiers are never handed out twice by the same cursor, even when
    /// the caller ends up not using one.
    pub fn next_unused<F: Fn(u32) -> bool>(&mut self, is_used: F) -> crate::Result<u32> {
        while self.next <= self.max_id {
            let id = self.next;
            self.next += 1;

            if !is_used(id) {
                return Ok(id);
            }
        }

        Err(crate::Error::IdSpaceExhausted)
    }

    /// Returns `true` if no identifier is left to hand out.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.next > self.max_id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::hash::hash_str;
    use rand::Rng;
    use test_log::test;

    #[test]
    fn id_hash_matches_string_hash() {
        for id in [0, 1, 9, 10, 99, 100, 384_377, MAX_ID, u32::MAX] {
            assert_eq!(hash_str(&id_key(id)), id_hash(id), "id {id}");
        }
    }

    #[test]
    fn id_hash_golden() {
        assert_eq!(905_058_873, id_hash(384_377));
        assert_eq!(2_587_045_306, id_hash(0));
    }

    #[test]
    fn resolve_all_small_ids() {
        let resolver = IdentityResolver::default();
        let hashes = [0, 1, 2, 42, 100]
            .into_iter()
            .map(id_hash)
            .collect::<HashSet<_>>();

        let resolved = resolver.resolve_all(&hashes);

        assert_eq!(5, resolved.len());
        for id in [0, 1, 2, 42, 100] {
            assert_eq!(Some(&id_hash(id)), resolved.get(&id));
        }
    }

    #[test]
    fn resolve_all_random_ids_round_trip() {
        let resolver = IdentityResolver::with_max_id(200_000);
        let mut rng = rand::rng();

        let ids = (0..50)
            .map(|_| rng.random_range(0..=200_000))
            .collect::<HashSet<u32>>();
        let hashes = ids.iter().copied().map(id_hash).collect::<HashSet<_>>();

        let resolved = resolver.resolve_all(&hashes);
        assert_eq!(hashes.len(), resolved.len());

        for (id, hash) in &resolved {
            assert_eq!(id_hash(*id), *hash);
            assert!(hashes.contains(hash));
        }
    }

    #[test]
    fn resolve_all_leaves_foreign_hashes_unresolved() {
        let resolver = IdentityResolver::with_max_id(1_000);

        let mut hashes = HashSet::default();
        hashes.insert(id_hash(7));
        hashes.insert(hash_str("Something.Else"));

        let resolved = resolver.resolve_all(&hashes);

        assert_eq!(1, resolved.len());
        assert_eq!(Some(&id_hash(7)), resolved.get(&7));
    }

    #[test]
    fn resolve_all_empty() {
        let resolver = IdentityResolver::default();
        assert!(resolver.resolve_all(&HashSet::default()).is_empty());
    }

    #[test]
    fn allocator_skips_used_ids() {
        let mut allocator = IdentityResolver::default().allocator();
        let used = [1, 2, 4].into_iter().collect::<HashSet<u32>>();

        assert_eq!(3, allocator.next_unused(|id| used.contains(&id)).unwrap());
        assert_eq!(5, allocator.next_unused(|id| used.contains(&id)).unwrap());
        assert_eq!(6, allocator.next_unused(|id| used.contains(&id)).unwrap());
    }

    #[test]
    fn allocator_exhaustion() {
        let mut allocator = IdentityResolver::with_max_id(3).allocator();

        assert_eq!(1, allocator.next_unused(|id| id == 2).unwrap());
        assert_eq!(3, allocator.next_unused(|id| id == 2).unwrap());
        assert!(allocator.is_exhausted());
        assert!(matches!(
            allocator.next_unused(|_| false),
            Err(crate::Error::IdSpaceExhausted),
        ));
    }
}
