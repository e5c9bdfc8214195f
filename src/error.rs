use core::fmt::{Display, Formatter};

use crate::png::{ChunkType, InflateError};

/// A fatal problem with the PNG stream.
///
/// Once a session reports one of these it stays failed, and every later call
/// gives back the same error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PngError {
  /// The first bytes aren't the PNG signature.
  NotPng,
  /// The first four signature bytes match but the rest don't, which is what
  /// happens when a PNG goes through a newline conversion.
  AsciiConversion,
  /// A chunk type tag had bytes outside of `A-Z` and `a-z`.
  InvalidChunkType(ChunkType),
  /// A chunk declared a length above `2^31 - 1`.
  ChunkTooLong { chunk_type: ChunkType, length: u32 },
  /// Some chunk other than `IHDR` came first.
  MissingIhdr(ChunkType),
  /// A second `IHDR` showed up.
  DuplicateIhdr,
  /// The `IHDR` data wasn't 13 bytes.
  InvalidIhdrLength(u32),
  /// Width or height was 0 or above `2^31 - 1`.
  InvalidDimensions { width: u32, height: u32 },
  /// Width or height is legal but above the configured limits.
  DimensionsExceedLimits { width: u32, height: u32 },
  /// The color type byte isn't a known color type.
  InvalidColorType(u8),
  /// The bit depth isn't allowed for this color type.
  InvalidBitDepth { color_type: u8, bit_depth: u8 },
  /// Only compression method 0 is defined.
  InvalidCompressionMethod(u8),
  /// Only filter method 0 is defined.
  InvalidFilterMethod(u8),
  /// Only interlace methods 0 and 1 are defined.
  InvalidInterlaceMethod(u8),
  /// A second `PLTE` showed up.
  DuplicatePalette,
  /// The `PLTE` of an indexed image had an unusable length.
  InvalidPalette(u32),
  /// An indexed image started its image data without a palette.
  MissingPalette,
  /// `IEND` arrived before any `IDAT`.
  MissingImageData,
  /// A critical chunk type we don't know how to handle.
  UnhandledCriticalChunk(ChunkType),
  /// The CRC stored after a chunk doesn't match the chunk.
  CrcMismatch { chunk_type: ChunkType, expected: u32, actual: u32 },
  /// A scanline started with a filter byte above 4.
  InvalidFilterType(u8),
  /// The zlib stream of the image data is broken.
  Inflate(InflateError),
  /// The inflater was claimed while another chunk type held it.
  InflateOwnership { held: ChunkType, requested: ChunkType },
  /// The image data ended before every scanline was produced, or the zlib
  /// stream never terminated.
  NotEnoughImageData,
  /// The input ended before `IEND`.
  UnexpectedEof,
  /// The allocator couldn't give us enough space.
  AllocationFailed,
  /// A benign problem, promoted to fatal by the configuration.
  Benign(Warning),
  /// The byte source failed.
  #[cfg(feature = "std")]
  Io(std::io::ErrorKind),
}
impl From<alloc::collections::TryReserveError> for PngError {
  #[inline]
  fn from(_: alloc::collections::TryReserveError) -> Self {
    Self::AllocationFailed
  }
}
impl From<InflateError> for PngError {
  #[inline]
  fn from(e: InflateError) -> Self {
    Self::Inflate(e)
  }
}
#[cfg(feature = "std")]
impl From<std::io::Error> for PngError {
  #[inline]
  fn from(e: std::io::Error) -> Self {
    Self::Io(e.kind())
  }
}
impl Display for PngError {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    match self {
      Self::NotPng => write!(f, "not a PNG file"),
      Self::AsciiConversion => write!(f, "PNG file corrupted by ASCII conversion"),
      Self::InvalidChunkType(t) => write!(f, "invalid chunk type {t:?}"),
      Self::ChunkTooLong { chunk_type, length } => {
        write!(f, "{chunk_type}: chunk length {length} too large")
      }
      Self::MissingIhdr(t) => write!(f, "{t}: missing IHDR"),
      Self::DuplicateIhdr => write!(f, "IHDR: out of place"),
      Self::InvalidIhdrLength(len) => write!(f, "IHDR: invalid length {len}"),
      Self::InvalidDimensions { width, height } => {
        write!(f, "IHDR: invalid image size {width}x{height}")
      }
      Self::DimensionsExceedLimits { width, height } => {
        write!(f, "IHDR: image size {width}x{height} exceeds user limits")
      }
      Self::InvalidColorType(c) => write!(f, "IHDR: invalid color type {c}"),
      Self::InvalidBitDepth { color_type, bit_depth } => {
        write!(f, "IHDR: invalid bit depth {bit_depth} for color type {color_type}")
      }
      Self::InvalidCompressionMethod(m) => write!(f, "IHDR: unknown compression method {m}"),
      Self::InvalidFilterMethod(m) => write!(f, "IHDR: unknown filter method {m}"),
      Self::InvalidInterlaceMethod(m) => write!(f, "IHDR: unknown interlace method {m}"),
      Self::DuplicatePalette => write!(f, "PLTE: duplicate"),
      Self::InvalidPalette(len) => write!(f, "PLTE: invalid length {len}"),
      Self::MissingPalette => write!(f, "IDAT: missing PLTE"),
      Self::MissingImageData => write!(f, "IEND: missing IDAT"),
      Self::UnhandledCriticalChunk(t) => write!(f, "{t}: unknown critical chunk"),
      Self::CrcMismatch { chunk_type, expected, actual } => {
        write!(f, "{chunk_type}: CRC error (stored {expected:08X}, computed {actual:08X})")
      }
      Self::InvalidFilterType(tag) => write!(f, "bad adaptive filter value {tag}"),
      Self::Inflate(e) => write!(f, "IDAT: {e}"),
      Self::InflateOwnership { held, requested } => {
        write!(f, "{requested}: inflater already claimed by {held}")
      }
      Self::NotEnoughImageData => write!(f, "not enough image data"),
      Self::UnexpectedEof => write!(f, "unexpected end of PNG data"),
      Self::AllocationFailed => write!(f, "allocation failed"),
      Self::Benign(w) => Display::fmt(w, f),
      #[cfg(feature = "std")]
      Self::Io(kind) => write!(f, "read error: {kind:?}"),
    }
  }
}
#[cfg(feature = "std")]
impl std::error::Error for PngError {}

/// A benign problem: decoding continues and the problem is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Warning {
  /// The chunk being processed, if any.
  pub chunk_type: Option<ChunkType>,
  pub kind: WarningKind,
}
impl Display for Warning {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    match self.chunk_type {
      Some(t) => write!(f, "{t}: {}", self.kind),
      None => Display::fmt(&self.kind, f),
    }
  }
}

/// The different benign problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum WarningKind {
  /// An ancillary chunk's CRC didn't match.
  CrcMismatch { expected: u32, actual: u32 },
  /// The chunk appeared after a chunk it must come before.
  OutOfPlace,
  /// A chunk that may only appear once appeared again.
  Duplicate,
  /// Wrong data length for this chunk type.
  InvalidLength(u32),
  /// Data length was fine but a field value isn't.
  InvalidValue,
  /// The chunk only makes sense after a `PLTE`.
  MissingPalette,
  /// The palette had more entries than the bit depth can index.
  PaletteTruncated { entries: u16, max: u16 },
  /// A palette on a grayscale image.
  PaletteIgnored,
  /// `IEND` with a non-zero length.
  IendNotEmpty(u32),
  /// An `IDAT` after the `IDAT` sequence was closed by some other chunk.
  TooManyIdats,
  /// Compressed data after the last scanline or after the stream end.
  ExtraCompressedData,
  /// Bytes after `IEND`.
  TrailingData(usize),
  /// An ancillary chunk above the configured size limit, skipped.
  ChunkTooLarge(u32),
  /// A text or profile keyword was empty, too long, or unterminated.
  BadKeyword,
  /// An ancillary chunk used an unknown compression method.
  UnknownCompression(u8),
  /// The compressed part of an ancillary chunk couldn't be inflated.
  Inflate(InflateError),
  /// The compressed part of an ancillary chunk ended early.
  TruncatedCompressedData,
  /// The compressed part of an ancillary chunk inflates to more than the
  /// configured limit.
  DecompressedTooLarge(usize),
  /// The inflater was taken away from its previous owner.
  OwnershipEvicted { held: ChunkType },
}
impl Display for WarningKind {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    match self {
      Self::CrcMismatch { expected, actual } => {
        write!(f, "CRC error (stored {expected:08X}, computed {actual:08X})")
      }
      Self::OutOfPlace => write!(f, "out of place"),
      Self::Duplicate => write!(f, "duplicate"),
      Self::InvalidLength(len) => write!(f, "invalid length {len}"),
      Self::InvalidValue => write!(f, "invalid"),
      Self::MissingPalette => write!(f, "missing PLTE"),
      Self::PaletteTruncated { entries, max } => {
        write!(f, "{entries} palette entries truncated to {max}")
      }
      Self::PaletteIgnored => write!(f, "ignored in grayscale PNG"),
      Self::IendNotEmpty(len) => write!(f, "invalid length {len}"),
      Self::TooManyIdats => write!(f, "too many IDATs found"),
      Self::ExtraCompressedData => write!(f, "extra compressed data"),
      Self::TrailingData(n) => write!(f, "{n} bytes after IEND"),
      Self::ChunkTooLarge(len) => write!(f, "chunk data of {len} bytes is too large"),
      Self::BadKeyword => write!(f, "bad keyword"),
      Self::UnknownCompression(m) => write!(f, "unknown compression type {m}"),
      Self::Inflate(e) => Display::fmt(e, f),
      Self::TruncatedCompressedData => write!(f, "truncated compressed data"),
      Self::DecompressedTooLarge(limit) => {
        write!(f, "decompressed data is larger than the {limit} byte limit")
      }
      Self::OwnershipEvicted { held } => write!(f, "inflater taken from {held}"),
    }
  }
}
