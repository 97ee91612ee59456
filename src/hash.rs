// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The store's primary key: Bob Jenkins' `lookup2` 32-bit mixing hash,
//! applied to 16-bit code units.
//!
//! Every existing data file was keyed with this exact function, so the bit
//! operations below must not be "improved".

/// Initial value of the `a` and `b` accumulators (golden ratio).
const GOLDEN_RATIO: u32 = 0x9e37_79b9;

/// Number of code units consumed per mixing round.
const BLOCK_LEN: usize = 12;

#[inline(always)]
#[allow(clippy::many_single_char_names)]
fn mix(mut a: u32, mut b: u32, mut c: u32) -> (u32, u32, u32) {
    a = a.wrapping_sub(b).wrapping_sub(c) ^ (c >> 13);
    b = b.wrapping_sub(c).wrapping_sub(a) ^ (a << 8);
    c = c.wrapping_sub(a).wrapping_sub(b) ^ (b >> 13);
    a = a.wrapping_sub(b).wrapping_sub(c) ^ (c >> 12);
    b = b.wrapping_sub(c).wrapping_sub(a) ^ (a << 16);
    c = c.wrapping_sub(a).wrapping_sub(b) ^ (b >> 5);
    a = a.wrapping_sub(b).wrapping_sub(c) ^ (c >> 3);
    b = b.wrapping_sub(c).wrapping_sub(a) ^ (a << 10);
    c = c.wrapping_sub(a).wrapping_sub(b) ^ (b >> 15);
    (a, b, c)
}

/// Packs up to 4 code units little-endian style, each shifted by 8 bits
/// (not 16), truncating to 32 bits.
#[inline(always)]
fn word<T: Copy + Into<u32>>(units: &[T]) -> u32 {
    units
        .iter()
        .zip([0u32, 8, 16, 24])
        .fold(0, |acc, (&unit, shift)| acc.wrapping_add(unit.into() << shift))
}

/// Hashes a sequence of code units.
///
/// `u8` and `u16` units hash identically for ASCII input, so ASCII keys can
/// be hashed from their bytes without transcoding.
///
/// An empty key hashes to `0`.
#[must_use]
#[allow(clippy::many_single_char_names)]
pub fn hash_units<T: Copy + Into<u32>>(key: &[T]) -> u32 {
    if key.is_empty() {
        return 0;
    }

    let mut a = GOLDEN_RATIO;
    let mut b = GOLDEN_RATIO;
    let mut c = 0u32;

    let mut blocks = key.chunks_exact(BLOCK_LEN);

    for block in &mut blocks {
        let (k0, rest) = block.split_at(4);
        let (k1, k2) = rest.split_at(4);

        a = a.wrapping_add(word(k0));
        b = b.wrapping_add(word(k1));
        c = c.wrapping_add(word(k2));

        (a, b, c) = mix(a, b, c);
    }

    // NOTE: Legacy behaviour: the length is truncated to 32 bits
    #[allow(clippy::cast_possible_truncation)]
    {
        c = c.wrapping_add(key.len() as u32);
    }

    // The low byte of c is reserved for the length, so the tail
    // fills c starting at bit 8
    for (idx, &unit) in blocks.remainder().iter().enumerate() {
        let unit: u32 = unit.into();

        match idx {
            0..=3 => a = a.wrapping_add(unit << (8 * idx)),
            4..=7 => b = b.wrapping_add(unit << (8 * (idx - 4))),
            _ => c = c.wrapping_add(unit << (8 * (idx - 7))),
        }
    }

    let (_, _, c) = mix(a, b, c);
    c
}

/// Hashes a string by its UTF-16 code units.
#[must_use]
pub fn hash_str(key: &str) -> u32 {
    if key.is_ascii() {
        hash_units(key.as_bytes())
    } else {
        let units = key.encode_utf16().collect::<Vec<_>>();
        hash_units(&units)
    }
}
