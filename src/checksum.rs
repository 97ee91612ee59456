// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// A 128-bit content checksum
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Checksum(u128);

/// Lowercase hex, 32 digits
impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl Checksum {
    /// Wraps a checksum value.
    #[must_use]
    pub fn from_raw(value: u128) -> Self {
        Self(value)
    }

    /// Returns the raw 128-bit integer.
    #[must_use]
    pub fn into_u128(self) -> u128 {
        self.0
    }

    /// Checksums a byte slice.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(bytes))
    }

    /// Checksums a whole file.
    pub fn of_file(path: &std::path::Path) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        let mut reader = ChecksummedReader::new(std::io::BufReader::new(file));
        std::io::copy(&mut reader, &mut std::io::sink())?;
        Ok(reader.checksum())
    }
}

/// Writer that checksums everything written through it
pub struct ChecksummedWriter<W: std::io::Write> {
    inner: W,
    hasher: xxhash_rust::xxh3::Xxh3Default,
    written: u64,
}

impl<W: std::io::Write> ChecksummedWriter<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self {
            inner: writer,
            hasher: xxhash_rust::xxh3::Xxh3Default::new(),
            written: 0,
        }
    }

    /// Checksum of everything written so far.
    pub fn checksum(&self) -> Checksum {
        Checksum::from_raw(self.hasher.digest128())
    }

    /// Number of bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Returns the wrapped writer.
    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.inner
    }
}

impl<W: std::io::Write> std::io::Write for ChecksummedWriter<W> {
    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }

    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        let written = buf.get(..n).unwrap_or_default();

        self.hasher.update(written);
        self.written += n as u64;

        Ok(n)
    }
}

/// Reader that checksums everything read through it
pub struct ChecksummedReader<R: std::io::Read> {
    inner: R,
    hasher: xxhash_rust::xxh3::Xxh3Default,
}

impl<R: std::io::Read> ChecksummedReader<R> {
    /// Wraps a reader.
    pub fn new(reader: R) -> Self {
        Self {
            inner: reader,
            hasher: xxhash_rust::xxh3::Xxh3Default::new(),
        }
    }

    pub fn checksum(&self) -> Checksum {
        Checksum::from_raw(self.hasher.digest128())
    }
}

impl<R: std::io::Read> std::io::Read for ChecksummedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(buf.get(..n).unwrap_or_default());
        Ok(n)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use test_log::test;

    #[test]
    fn checksum_display_is_padded_hex() {
        assert_eq!("0000000000000000000000000000000f", Checksum::from_raw(15).to_string());
        assert_eq!(32, Checksum::of(b"abc").to_string().len());
    }

    #[test]
    fn checksummed_writer_matches_one_shot() {
        let mut writer = ChecksummedWriter::new(vec![]);
        writer.write_all(b"hello ").unwrap();
        writer.write_all(b"world").unwrap();

        assert_eq!(11, writer.written());
        assert_eq!(Checksum::of(b"hello world"), writer.checksum());
        assert_eq!(b"hello world".to_vec(), *writer.inner_mut());
    }

    #[test]
    fn checksum_of_file() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("x.dat");
        std::fs::write(&path, b"some bytes")?;

        assert_eq!(Checksum::of(b"some bytes"), Checksum::of_file(&path)?);

        Ok(())
    }
}
