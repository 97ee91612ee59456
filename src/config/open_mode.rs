// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// How much a data/directory pair's location table is trusted when opening
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum OpenMode {
    /// Trust the directory unconditionally, propagate every failure
    Strict,

    /// Trust the directory, except for the known-broken combination of the
    /// foreign identifier scheme and the quirk locale, where the data file
    /// is streamed instead
    #[default]
    Normal,

    /// Try the directory, stream the data file if anything fails
    Lenient,
}

impl std::fmt::Display for OpenMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Strict => "strict",
                Self::Normal => "normal",
                Self::Lenient => "lenient",
            }
        )
    }
}
