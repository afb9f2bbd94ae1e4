//! Positional Reader
//!
//! A buffered, seekable byte source that reports the logical offset of the
//! next unconsumed byte. The tokenizer consumes out of the read-ahead buffer,
//! so the underlying source position runs ahead of what the parser has seen
//! by exactly the number of buffered bytes.

use super::{ParseError, ParseResult, DEFAULT_BUFFER_CAPACITY};
use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom};

const CHUNK_SIZE: usize = 8 * 1024;

/// Buffered reader with an exact logical cursor
pub struct PositionalReader<R> {
    inner: BufReader<R>,
}

impl<R: Read + Seek> PositionalReader<R> {
    /// Wrap a source with the default buffer capacity
    pub fn new(source: R) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY, source)
    }

    /// Wrap a source with an explicit buffer capacity
    pub fn with_capacity(capacity: usize, source: R) -> Self {
        Self {
            inner: BufReader::with_capacity(capacity.max(1), source),
        }
    }

    /// Logical offset: the source position minus the bytes still buffered
    pub fn current_offset(&mut self) -> ParseResult<u64> {
        let buffered = self.inner.buffer().len() as u64;
        let raw = self.inner.get_mut().stream_position()?;
        Ok(raw.saturating_sub(buffered))
    }

    /// Reposition to `offset`, discarding everything buffered
    pub fn seek_to(&mut self, offset: u64) -> ParseResult<()> {
        // BufReader::seek always drops its buffer
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Total length of the source. The logical cursor is left unchanged.
    pub fn source_len(&mut self) -> ParseResult<u64> {
        let offset = self.current_offset()?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        self.seek_to(offset)?;
        Ok(end)
    }

    /// Fill `buf` completely, accumulating over short reads.
    ///
    /// Running out of input before `buf.len()` bytes is a
    /// [`ParseError::ReadFailed`]; the contents of `buf` are unspecified then.
    pub fn read_exactly(&mut self, buf: &mut [u8]) -> ParseResult<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::debug!("Read failed after {} of {} bytes: {}", filled, buf.len(), e);
                    return Err(ParseError::Io(e));
                }
            }
        }

        if filled < buf.len() {
            tracing::debug!("Short read: requested {} bytes, got {}", buf.len(), filled);
            return Err(ParseError::ReadFailed {
                requested: buf.len(),
                read: filled,
            });
        }
        Ok(filled)
    }

    /// Read exactly `len` bytes into a new vector.
    ///
    /// Memory grows with the data actually read, so a bogus huge length fails
    /// with [`ParseError::ReadFailed`] at end of input instead of allocating it.
    pub fn read_vec(&mut self, len: u64) -> ParseResult<Vec<u8>> {
        let requested = usize::try_from(len).unwrap_or(usize::MAX);
        let mut out = Vec::with_capacity(requested.min(CHUNK_SIZE));
        let mut chunk = [0u8; CHUNK_SIZE];

        while out.len() < requested {
            let want = (requested - out.len()).min(CHUNK_SIZE);
            match self.inner.read(&mut chunk[..want]) {
                Ok(0) => {
                    return Err(ParseError::ReadFailed {
                        requested,
                        read: out.len(),
                    })
                }
                Ok(n) => out.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ParseError::Io(e)),
            }
        }
        Ok(out)
    }

    /// Read at most `limit` bytes (everything up to end of input when `None`)
    pub fn read_up_to(&mut self, limit: Option<usize>) -> ParseResult<Vec<u8>> {
        let mut out = Vec::new();
        match limit {
            Some(limit) => {
                (&mut self.inner).take(limit as u64).read_to_end(&mut out)?;
            }
            None => {
                self.inner.read_to_end(&mut out)?;
            }
        }
        Ok(out)
    }

    /// Next byte without consuming it
    pub fn peek_byte(&mut self) -> ParseResult<Option<u8>> {
        loop {
            match self.inner.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Consume and return the next byte
    pub fn next_byte(&mut self) -> ParseResult<Option<u8>> {
        let byte = self.peek_byte()?;
        if byte.is_some() {
            self.inner.consume(1);
        }
        Ok(byte)
    }

    pub fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}
