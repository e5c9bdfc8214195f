//! A resumable zlib inflater that one chunk type can own at a time.
//!
//! PNG uses zlib streams in several places: the image data, the ICC profile,
//! and compressed text. We only keep one decompressor around and hand it
//! between those users. A user has to [`claim`](InflateStream::claim) the
//! stream first, which gives back an [`InflateClaim`] token. The token is
//! required to feed data in, and it's consumed by
//! [`release`](InflateStream::release), so code that doesn't hold the claim
//! can't push bytes into someone else's stream.
//!
//! The decompressor runs in wrapping mode over a 32K window (the largest
//! DEFLATE back-reference distance). Output that the caller doesn't have room
//! for yet just stays in the window until the next call, so callers can ask
//! for exactly one scanline at a time.

use alloc::{boxed::Box, vec, vec::Vec};
use core::fmt::Display;

use miniz_oxide::inflate::{
  core::{
    decompress,
    inflate_flags::{
      TINFL_FLAG_COMPUTE_ADLER32, TINFL_FLAG_HAS_MORE_INPUT, TINFL_FLAG_IGNORE_ADLER32,
      TINFL_FLAG_PARSE_ZLIB_HEADER,
    },
    DecompressorOxide,
  },
  TINFLStatus,
};

use super::ChunkType;

/// Size of the wrapping output window.
pub const WINDOW_SIZE: usize = 32_768;

/// Most input bytes handed to the codec in a single call.
pub const INFLATE_QUANTUM: usize = 32_768;

/// Why the codec stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InflateErrorKind {
  /// The DEFLATE data or the zlib header is invalid.
  Corrupt,
  /// The Adler-32 checksum at the end of the stream doesn't match.
  Checksum,
  /// The codec couldn't make progress with the data it had.
  Stalled,
  /// The codec was called wrong.
  BadParam,
  /// The claim token isn't the current owner of the stream.
  StaleClaim,
}

/// A codec failure and its diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InflateError {
  pub kind: InflateErrorKind,
  pub message: &'static str,
}
impl InflateError {
  #[inline]
  #[must_use]
  pub const fn new(kind: InflateErrorKind) -> Self {
    let message = match kind {
      InflateErrorKind::Corrupt => "invalid compressed data",
      InflateErrorKind::Checksum => "incorrect data check",
      InflateErrorKind::Stalled => "decompression made no progress",
      InflateErrorKind::BadParam => "bad decompressor parameters",
      InflateErrorKind::StaleClaim => "stream not claimed by this chunk",
    };
    Self { kind, message }
  }
}
impl Display for InflateError {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str(self.message)
  }
}

/// Where a call to [`InflateStream::feed`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamStatus {
  /// All input was used and the stream isn't over.
  NeedMoreInput,
  /// The output buffer is full. There may be more output waiting.
  OutputFull,
  /// The zlib stream is over and all of its output was delivered.
  StreamEnded,
  Error(InflateError),
}
impl StreamStatus {
  /// A human readable description, available for every status.
  #[inline]
  #[must_use]
  pub const fn message(self) -> &'static str {
    match self {
      Self::NeedMoreInput => "need more input",
      Self::OutputFull => "output buffer full",
      Self::StreamEnded => "stream end",
      Self::Error(e) => e.message,
    }
  }
}

/// The result of one [`InflateStream::feed`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InflateProgress {
  /// Input bytes used.
  pub consumed: usize,
  /// Output bytes written, starting at the front of the output buffer.
  pub produced: usize,
  pub status: StreamStatus,
}

/// Proof that a particular chunk type currently owns the stream.
///
/// Not `Clone`: there's exactly one live claim at a time.
#[derive(Debug, PartialEq, Eq)]
pub struct InflateClaim {
  owner: ChunkType,
  generation: u32,
}
impl InflateClaim {
  #[inline]
  #[must_use]
  pub const fn owner(&self) -> ChunkType {
    self.owner
  }
}

/// Returned when trying to claim a stream that's already owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlreadyClaimed {
  pub held: ChunkType,
  pub requested: ChunkType,
}

/// The shared zlib decompressor.
pub struct InflateStream {
  decomp: Box<DecompressorOxide>,
  window: Vec<u8>,
  /// Total output so far, the window write position is this masked.
  total_out: usize,
  pending_start: usize,
  pending_len: usize,
  /// The codec consumed all input last time and wants more.
  needs_input: bool,
  ended: bool,
  owner: Option<ChunkType>,
  generation: u32,
  ignore_adler32: bool,
  message: &'static str,
}
impl Default for InflateStream {
  #[inline]
  fn default() -> Self {
    Self::new(false)
  }
}
impl core::fmt::Debug for InflateStream {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("InflateStream")
      .field("owner", &self.owner)
      .field("generation", &self.generation)
      .field("total_out", &self.total_out)
      .field("pending_len", &self.pending_len)
      .field("ended", &self.ended)
      .field("message", &self.message)
      .finish_non_exhaustive()
  }
}
impl InflateStream {
  /// Makes a new, unclaimed stream.
  ///
  /// With `ignore_adler32` set, the checksum at the end of each zlib stream
  /// isn't verified.
  #[must_use]
  pub fn new(ignore_adler32: bool) -> Self {
    Self {
      decomp: Box::default(),
      window: vec![0; WINDOW_SIZE],
      total_out: 0,
      pending_start: 0,
      pending_len: 0,
      needs_input: true,
      ended: false,
      owner: None,
      generation: 0,
      ignore_adler32,
      message: "",
    }
  }

  /// The chunk type that owns the stream right now.
  #[inline]
  #[must_use]
  pub const fn owner(&self) -> Option<ChunkType> {
    self.owner
  }

  /// The diagnostic message for the most recent status.
  #[inline]
  #[must_use]
  pub const fn last_message(&self) -> &'static str {
    self.message
  }

  /// If the current zlib stream has reached its end.
  #[inline]
  #[must_use]
  pub const fn is_ended(&self) -> bool {
    self.ended && self.pending_len == 0
  }

  /// Takes ownership of the stream for `owner`, starting a fresh zlib stream.
  ///
  /// ## Failure
  /// * If some other claim is still live you get back who holds it. The stream
  ///   isn't touched.
  pub fn claim(&mut self, owner: ChunkType) -> Result<InflateClaim, AlreadyClaimed> {
    if let Some(held) = self.owner {
      return Err(AlreadyClaimed { held, requested: owner });
    }
    self.reset();
    self.owner = Some(owner);
    self.generation = self.generation.wrapping_add(1);
    Ok(InflateClaim { owner, generation: self.generation })
  }

  /// Gives the stream back. A stale claim (from before an eviction) does
  /// nothing.
  #[inline]
  pub fn release(&mut self, claim: InflateClaim) {
    if self.holds(&claim) {
      self.owner = None;
      self.reset();
    }
  }

  /// Forcibly ends the current claim, and resets the stream.
  ///
  /// The old claim token stops working. Returns the evicted owner.
  #[inline]
  pub fn evict(&mut self) -> Option<ChunkType> {
    let held = self.owner.take();
    self.generation = self.generation.wrapping_add(1);
    self.reset();
    held
  }

  #[inline]
  #[must_use]
  pub fn holds(&self, claim: &InflateClaim) -> bool {
    self.owner == Some(claim.owner) && self.generation == claim.generation
  }

  fn reset(&mut self) {
    self.decomp.init();
    self.total_out = 0;
    self.pending_start = 0;
    self.pending_len = 0;
    self.needs_input = true;
    self.ended = false;
    self.message = "";
  }

  fn flags(&self) -> u32 {
    let check = if self.ignore_adler32 {
      TINFL_FLAG_IGNORE_ADLER32
    } else {
      TINFL_FLAG_COMPUTE_ADLER32
    };
    TINFL_FLAG_PARSE_ZLIB_HEADER | TINFL_FLAG_HAS_MORE_INPUT | check
  }

  /// Copies as much pending window output as fits into `out`.
  fn drain_pending(&mut self, out: &mut [u8]) -> usize {
    let n = self.pending_len.min(out.len());
    let start = self.pending_start;
    let first = n.min(WINDOW_SIZE - start);
    out[..first].copy_from_slice(&self.window[start..start + first]);
    out[first..n].copy_from_slice(&self.window[..n - first]);
    self.pending_start = (start + n) & (WINDOW_SIZE - 1);
    self.pending_len -= n;
    n
  }

  /// Pushes `input` through the decompressor, writing into `out`.
  ///
  /// This keeps going until the input is used up, `out` is full, the stream
  /// ends, or there's an error. The input is handed to the codec in pieces of
  /// at most [`INFLATE_QUANTUM`] bytes.
  ///
  /// Calling this with empty input is fine, and delivers any output that
  /// didn't fit last time.
  pub fn feed(
    &mut self, claim: &InflateClaim, mut input: &[u8], out: &mut [u8],
  ) -> InflateProgress {
    if !self.holds(claim) {
      let status = StreamStatus::Error(InflateError::new(InflateErrorKind::StaleClaim));
      self.message = status.message();
      return InflateProgress { consumed: 0, produced: 0, status };
    }
    let mut consumed = 0;
    let mut produced = 0;
    let status = loop {
      produced += self.drain_pending(&mut out[produced..]);
      if self.pending_len > 0 {
        break StreamStatus::OutputFull;
      }
      if self.ended {
        break StreamStatus::StreamEnded;
      }
      if produced == out.len() {
        break StreamStatus::OutputFull;
      }
      if input.is_empty() && self.needs_input {
        break StreamStatus::NeedMoreInput;
      }
      let quantum = input.len().min(INFLATE_QUANTUM);
      let write_pos = self.total_out & (WINDOW_SIZE - 1);
      let flags = self.flags();
      let (st, used, made) =
        decompress(&mut self.decomp, &input[..quantum], &mut self.window, write_pos, flags);
      input = &input[used..];
      consumed += used;
      self.total_out = self.total_out.wrapping_add(made);
      self.pending_start = write_pos;
      self.pending_len = made;
      match st {
        TINFLStatus::Done => self.ended = true,
        TINFLStatus::NeedsMoreInput => self.needs_input = true,
        TINFLStatus::HasMoreOutput => self.needs_input = false,
        TINFLStatus::Adler32Mismatch => {
          break StreamStatus::Error(InflateError::new(InflateErrorKind::Checksum))
        }
        TINFLStatus::FailedCannotMakeProgress => {
          break StreamStatus::Error(InflateError::new(InflateErrorKind::Stalled))
        }
        TINFLStatus::BadParam => {
          break StreamStatus::Error(InflateError::new(InflateErrorKind::BadParam))
        }
        _ => break StreamStatus::Error(InflateError::new(InflateErrorKind::Corrupt)),
      }
    };
    self.message = status.message();
    InflateProgress { consumed, produced, status }
  }
}
