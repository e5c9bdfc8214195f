//! Pull-mode decoding on top of the push decoder.
//!
//! A [`RowReader`] owns a byte source and a [`DecodeSession`], and reads from
//! the source whenever the session runs dry. It uses a fixed size buffer, so
//! the source is never read into memory all at once.

use alloc::{vec, vec::Vec};

use log::trace;

use crate::error::PngError;

use super::{Action, DecodeSession, DecoderConfig, Row};

/// Somewhere to get PNG bytes from.
pub trait ByteSource {
  /// Reads up to `buf.len()` bytes, returning how many were read.
  ///
  /// Returning 0 means the source is out of bytes.
  fn read(&mut self, buf: &mut [u8]) -> Result<usize, PngError>;
}
impl ByteSource for &[u8] {
  #[inline]
  fn read(&mut self, buf: &mut [u8]) -> Result<usize, PngError> {
    let n = buf.len().min(self.len());
    let (head, tail) = self.split_at(n);
    buf[..n].copy_from_slice(head);
    *self = tail;
    Ok(n)
  }
}

/// Adapts any [`Read`](std::io::Read) to be a [`ByteSource`].
#[cfg(feature = "std")]
#[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
#[derive(Debug)]
pub struct IoSource<R>(pub R);
#[cfg(feature = "std")]
impl<R: std::io::Read> ByteSource for IoSource<R> {
  fn read(&mut self, buf: &mut [u8]) -> Result<usize, PngError> {
    loop {
      match self.0.read(buf) {
        Ok(n) => return Ok(n),
        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
        Err(e) => return Err(e.into()),
      }
    }
  }
}

/// What [`RowReader::next_row`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRow<'a> {
  Row(Row<'a>),
  /// `IEND` was reached. There are no more rows.
  Done,
}

/// Decodes a PNG one row at a time, reading bytes as needed.
#[derive(Debug)]
pub struct RowReader<S> {
  session: DecodeSession,
  source: S,
  buf: Vec<u8>,
  start: usize,
  end: usize,
  source_empty: bool,
}
impl<S: ByteSource> RowReader<S> {
  /// The default size of the read buffer.
  pub const BUFFER_SIZE: usize = 4096;

  #[inline]
  #[must_use]
  pub fn new(source: S, config: DecoderConfig) -> Self {
    Self::with_buffer_size(source, config, Self::BUFFER_SIZE)
  }

  #[must_use]
  pub fn with_buffer_size(source: S, config: DecoderConfig, size: usize) -> Self {
    Self {
      session: DecodeSession::new(config),
      source,
      buf: vec![0; size.max(1)],
      start: 0,
      end: 0,
      source_empty: false,
    }
  }

  #[inline]
  #[must_use]
  pub const fn session(&self) -> &DecodeSession {
    &self.session
  }

  /// Gives back the session, along with the source.
  ///
  /// Any bytes read from the source but not yet decoded are lost.
  #[inline]
  #[must_use]
  pub fn into_parts(self) -> (DecodeSession, S) {
    (self.session, self.source)
  }

  /// Decodes until the next row, or until the end of the image.
  ///
  /// ## Failure
  /// * Any decoding error.
  /// * The source ran out of bytes before `IEND` ([`PngError::UnexpectedEof`]).
  pub fn next_row(&mut self) -> Result<PullRow<'_>, PngError> {
    if let Some(e) = self.session.error() {
      return Err(e);
    }
    loop {
      if self.start == self.end && !self.session.is_done() {
        self.refill()?;
      }
      let (used, action) = self.session.step(&self.buf[self.start..self.end])?;
      self.start += used;
      match action {
        Action::RowReady(info) => {
          return Ok(PullRow::Row(Row { pass: info.pass, y: info.y, data: self.session.row() }))
        }
        Action::ImageComplete => return self.complete(),
        Action::ChunkHandled(ty) => trace!("{ty} handled"),
        Action::NeedMoreData => (),
      }
    }
  }

  /// Reads every remaining row, giving back the finished session.
  pub fn read_to_end(mut self) -> Result<DecodeSession, PngError> {
    while let PullRow::Row(_) = self.next_row()? {}
    Ok(self.session)
  }

  fn refill(&mut self) -> Result<(), PngError> {
    if self.source_empty {
      return Err(PngError::UnexpectedEof);
    }
    let n = self.source.read(&mut self.buf)?;
    if n == 0 {
      self.source_empty = true;
      return Err(PngError::UnexpectedEof);
    }
    self.start = 0;
    self.end = n;
    Ok(())
  }

  fn complete(&mut self) -> Result<PullRow<'_>, PngError> {
    // only bytes already in hand count, the source isn't drained
    let trailing = self.end - self.start;
    if trailing > 0 {
      self.start = self.end;
      self.session.note_trailing_data(trailing)?;
    }
    Ok(PullRow::Done)
  }
}
