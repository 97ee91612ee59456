// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Extension of data files
pub const DATA_EXTENSION: &str = "dat";

/// Extension of directory files
pub const DIRECTORY_EXTENSION: &str = "dir";

/// Write buffer size
const WRITE_BUFFER_SIZE: usize = 64 * 1_024;

/// Returns the directory file path belonging to a data file path.
#[must_use]
pub fn directory_path_for(data_path: &Path) -> PathBuf {
    data_path.with_extension(DIRECTORY_EXTENSION)
}

/// A file that is written to a temporary sibling and only moved into place
/// on [`AtomicFile::commit`]
///
/// Dropping it without committing leaves the destination untouched.
pub struct AtomicFile {
    path: PathBuf,
    temp_file: tempfile::NamedTempFile,
}

impl AtomicFile {
    /// Stages a new version of `path`.
    pub fn create(path: &Path) -> crate::Result<Self> {
        let folder = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => std::env::current_dir()?,
        };

        Ok(Self {
            path: path.to_path_buf(),
            temp_file: tempfile::NamedTempFile::new_in(folder)?,
        })
    }

    /// Writes the staged content through a buffered writer, then syncs it.
    pub fn write_with<T, F>(&mut self, f: F) -> crate::Result<T>
    where
        F: FnOnce(&mut BufWriter<&mut File>) -> crate::Result<T>,
    {
        let result = {
            let mut writer =
                BufWriter::with_capacity(WRITE_BUFFER_SIZE, self.temp_file.as_file_mut());
            let result = f(&mut writer)?;
            writer.flush()?;
            result
        };

        self.temp_file.as_file().sync_all()?;

        Ok(result)
    }

    /// Moves the staged content over the destination.
    pub fn commit(self) -> crate::Result<()> {
        self.temp_file.persist(&self.path)?;

        #[cfg(not(target_os = "windows"))]
        if let Some(folder) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fsync_directory(folder)?;
        }

        Ok(())
    }
}

/// Atomically rewrites a file
pub fn write_atomic<T, F>(path: &Path, f: F) -> crate::Result<T>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> crate::Result<T>,
{
    let mut file = AtomicFile::create(path)?;
    let result = file.write_with(f)?;
    file.commit()?;
    Ok(result)
}

#[cfg(not(target_os = "windows"))]
pub fn fsync_directory(path: &Path) -> std::io::Result<()> {
    let file = std::fs::File::open(path)?;
    debug_assert!(file.metadata()?.is_dir());
    file.sync_all()
}

#[cfg(target_os = "windows")]
pub fn fsync_directory(_path: &Path) -> std::io::Result<()> {
    // Cannot fsync directory on Windows
    Ok(())
}
