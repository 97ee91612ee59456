// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::coding::DecodeError;
use std::io::{Read, Seek, SeekFrom};

/// Default read chunk size
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1_024;

/// Line-ending convention
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LineEnding {
    /// `\r\n`
    CrLf,

    /// `\n`
    Lf,

    /// `\r`
    Cr,
}

impl LineEnding {
    /// Returns the terminator's bytes.
    #[must_use]
    pub fn as_bytes(self) -> &'static [u8] {
        self.as_str().as_bytes()
    }

    /// Returns the terminator as a string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CrLf => "\r\n",
            Self::Lf => "\n",
            Self::Cr => "\r",
        }
    }

    /// Returns the terminator's length in bytes.
    #[must_use]
    pub fn len(self) -> usize {
        self.as_bytes().len()
    }

    /// Returns the platform's native terminator.
    #[must_use]
    pub fn native() -> Self {
        if cfg!(windows) {
            Self::CrLf
        } else {
            Self::Lf
        }
    }
}

impl std::fmt::Display for LineEnding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CrLf => "CRLF",
            Self::Lf => "LF",
            Self::Cr => "CR",
        };
        write!(f, "{name}")
    }
}

/// Text encoding used to decode line bytes
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum TextEncoding {
    /// UTF-8
    #[default]
    Utf8,

    /// ISO-8859-1, every byte is one character
    Latin1,
}

impl TextEncoding {
    /// Decodes a complete line.
    ///
    /// `offset` is the absolute position of the first byte and is only
    /// used for error reporting.
    pub fn decode(self, bytes: Vec<u8>, offset: u64) -> Result<String, DecodeError> {
        match self {
            Self::Utf8 => String::from_utf8(bytes).map_err(|e| DecodeError::Utf8 {
                offset,
                error: e.utf8_error(),
            }),
            Self::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }
}

/// Incremental byte stream to line decoder
///
/// Lines are collected as raw bytes up to the terminator and only then
/// decoded, so chunk boundaries falling inside a multi-byte character
/// are harmless. `\r` and `\n` never occur inside a multi-byte UTF-8
/// sequence.
///
/// The codec remembers the terminator of the line just read and of the
/// line before it, so a caller stitching continuation lines together
/// while holding one line of lookahead can rejoin them faithfully.
pub struct LineCodec<R: Read> {
    inner: R,
    encoding: TextEncoding,

    buf: Vec<u8>,

    /// Read cursor inside `buf`
    pos: usize,

    /// Number of valid bytes in `buf`
    len: usize,

    /// Absolute stream offset of `buf[0]`
    buf_offset: u64,

    previous_ending: Option<LineEnding>,
    current_ending: Option<LineEnding>,
}

impl<R: Read> LineCodec<R> {
    /// Creates a codec with the default chunk size.
    pub fn new(inner: R, encoding: TextEncoding) -> Self {
        Self::with_chunk_size(inner, encoding, DEFAULT_CHUNK_SIZE)
    }

    /// Creates a codec reading `chunk_size` bytes at a time.
    ///
    /// The reader is taken to be positioned at offset 0.
    pub fn with_chunk_size(inner: R, encoding: TextEncoding, chunk_size: usize) -> Self {
        Self {
            inner,
            encoding,
            buf: vec![0; chunk_size.max(1)],
            pos: 0,
            len: 0,
            buf_offset: 0,
            previous_ending: None,
            current_ending: None,
        }
    }

    /// Changes the encoding used for subsequent lines.
    pub fn set_encoding(&mut self, encoding: TextEncoding) {
        self.encoding = encoding;
    }

    /// Returns the encoding.
    #[must_use]
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Absolute offset of the next unread byte.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.buf_offset + self.pos as u64
    }

    /// Terminator of the line returned by the last [`LineCodec::next_line`],
    /// `None` if that line ended at end of stream.
    #[must_use]
    pub fn line_ending(&self) -> Option<LineEnding> {
        self.current_ending
    }

    /// Terminator of the line before the last one.
    #[must_use]
    pub fn previous_line_ending(&self) -> Option<LineEnding> {
        self.previous_ending
    }

    /// Makes sure at least one unread byte is buffered.
    ///
    /// Returns `false` at end of stream.
    fn fill(&mut self) -> std::io::Result<bool> {
        if self.pos < self.len {
            return Ok(true);
        }

        self.buf_offset += self.len as u64;
        self.pos = 0;
        self.len = 0;

        loop {
            match self.inner.read(&mut self.buf) {
                Ok(n) => {
                    self.len = n;
                    return Ok(n > 0);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }

    /// Returns the next raw byte without consuming it.
    pub fn peek_byte(&mut self) -> Result<Option<u8>, DecodeError> {
        if !self.fill()? {
            return Ok(None);
        }
        Ok(self.buf.get(self.pos).copied())
    }

    /// Consumes and returns the next raw byte.
    pub fn next_byte(&mut self) -> Result<Option<u8>, DecodeError> {
        let byte = self.peek_byte()?;
        if byte.is_some() {
            self.pos += 1;
        }
        Ok(byte)
    }

    /// Reads exactly `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, DecodeError> {
        // `n` may come from a corrupt directory, so grow with the data
        let mut out = Vec::with_capacity(n.min(self.buf.len()));

        while out.len() < n {
            if !self.fill()? {
                return Err(DecodeError::Io(std::io::Error::from(
                    std::io::ErrorKind::UnexpectedEof,
                )));
            }

            let want = n - out.len();
            let available = self.len - self.pos;
            let take = want.min(available);

            out.extend_from_slice(
                self.buf
                    .get(self.pos..self.pos + take)
                    .unwrap_or_default(),
            );
            self.pos += take;
        }

        Ok(out)
    }

    /// Reads raw bytes up to, but not including, the next `\r` or `\n`
    /// (or end of stream).
    pub fn read_until_line_end(&mut self) -> Result<Vec<u8>, DecodeError> {
        let mut out = Vec::new();

        while let Some(byte) = self.peek_byte()? {
            if byte == b'\r' || byte == b'\n' {
                break;
            }
            out.push(byte);
            self.pos += 1;
        }

        Ok(out)
    }

    /// Decodes raw bytes with the codec's encoding.
    pub fn decode(&self, bytes: Vec<u8>, offset: u64) -> Result<String, DecodeError> {
        self.encoding.decode(bytes, offset)
    }

    /// Reads the next line, without its terminator.
    ///
    /// Returns `None` at end of stream.
    pub fn next_line(&mut self) -> Result<Option<String>, DecodeError> {
        let start = self.position();
        let mut line = Vec::new();

        let ending = loop {
            if !self.fill()? {
                if line.is_empty() {
                    return Ok(None);
                }
                break None;
            }

            let found = {
                let window = self.buf.get(self.pos..self.len).unwrap_or_default();

                if let Some(idx) = memchr::memchr2(b'\r', b'\n', window) {
                    line.extend_from_slice(window.get(..idx).unwrap_or_default());
                    Some((idx, window.get(idx).copied()))
                } else {
                    line.extend_from_slice(window);
                    None
                }
            };

            match found {
                Some((idx, Some(b'\n'))) => {
                    self.pos += idx + 1;
                    break Some(LineEnding::Lf);
                }
                Some((idx, _)) => {
                    self.pos += idx + 1;

                    // The \n of a CRLF may sit in the next chunk
                    if self.peek_byte()? == Some(b'\n') {
                        self.pos += 1;
                        break Some(LineEnding::CrLf);
                    }
                    break Some(LineEnding::Cr);
                }
                None => {
                    self.pos = self.len;
                }
            }
        };

        self.previous_ending = self.current_ending;
        self.current_ending = ending;

        self.decode(line, start).map(Some)
    }
}

impl<R: Read + Seek> LineCodec<R> {
    /// Moves the cursor to an absolute offset.
    ///
    /// Stays inside the buffered chunk when possible, so a forward walk over
    /// nearby offsets does not hit the underlying reader.
    pub fn seek_to(&mut self, offset: u64) -> Result<(), DecodeError> {
        let buffered_end = self.buf_offset + self.len as u64;

        if offset >= self.buf_offset && offset <= buffered_end {
            #[allow(clippy::cast_possible_truncation)]
            {
                self.pos = (offset - self.buf_offset) as usize;
            }
            return Ok(());
        }

        self.inner.seek(SeekFrom::Start(offset))?;
        self.buf_offset = offset;
        self.pos = 0;
        self.len = 0;

        Ok(())
    }
}
