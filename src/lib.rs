// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A record store for localized game text, kept as a pair of files.
//!
//! ##### About
//!
//! A *data* file holds one tab-delimited record per line
//! (`hash<TAB>tag<TAB>text`), a *directory* file holds a metadata header and
//! the byte offset and size of every record. Records are keyed by a legacy
//! 32-bit mixing hash of `Global.Text.<id>`, so identifiers are not stored
//! anywhere and have to be recovered by hashing the whole identifier space.
//!
//! Some record kinds (*buckets*) may share a hash, they are told apart by a
//! suffix embedded in their text.
//!
//! ```
//! # fn main() -> locale_store::Result<()> {
//! # let folder = tempfile::tempdir()?;
//! use locale_store::{Config, OpenMode};
//!
//! let data_path = folder.path().join("en_us_data.dat");
//!
//! let mut store = Config::from_data_path(&data_path).create_new();
//! let id = store.add("Coin Flow Saw")?;
//! store.write()?;
//!
//! let store = Config::from_data_path(&data_path)
//!     .mode(OpenMode::Strict)
//!     .open()?;
//! assert_eq!("Coin Flow Saw", store.get_by_id(id)?.unwrap().text);
//! # Ok(())
//! # }
//! ```
//!
//! Text may span multiple lines, so a data file can also be read forward
//! without its directory, see [`RecordStream`].

#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![warn(clippy::multiple_crate_versions)]
#![allow(clippy::option_if_let_else)]
#![warn(clippy::redundant_feature_names)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

#[doc(hidden)]
pub type HashMap<K, V> = std::collections::HashMap<K, V, rustc_hash::FxBuildHasher>;

#[doc(hidden)]
pub type HashSet<K> = std::collections::HashSet<K, rustc_hash::FxBuildHasher>;

#[doc(hidden)]
pub mod checksum;

#[doc(hidden)]
pub mod coding;

/// Configuration
pub mod config;

mod directory;
mod error;

#[doc(hidden)]
pub mod file;

/// The legacy mixing hash
pub mod hash;

mod line_codec;
mod location;

/// Directory file header
pub mod metadata;

mod preamble;
mod reader;
mod record;
mod resolver;
mod store;
mod stream;
mod tag;
mod writer;

pub use {
    checksum::Checksum,
    coding::{DecodeError, EncodeError},
    config::{Config, OpenMode},
    directory::Directory,
    error::{Error, Result, Unsupported},
    line_codec::{LineCodec, LineEnding, TextEncoding},
    location::RecordLocation,
    metadata::Metadata,
    preamble::Preamble,
    reader::{DataFile, LocatedReader},
    record::{Record, Suffix},
    resolver::{id_hash, id_key, IdAllocator, IdentityResolver, ID_PREFIX, MAX_ID},
    store::{IdIndex, RecordHandle, RecordStore},
    stream::RecordStream,
    tag::Tag,
    writer::Writer,
};
