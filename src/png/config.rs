use super::InterlaceDisplay;

/// What to do when a chunk's CRC doesn't match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrcAction {
  /// Stop decoding with [`PngError::CrcMismatch`](crate::PngError::CrcMismatch).
  Error,
  /// Record a warning and use the chunk anyway.
  Warn,
  /// Record a warning and skip the chunk.
  ///
  /// Critical chunks can't be skipped, so for them this is the same as
  /// `Warn`.
  Discard,
}

/// What to do when the inflater is claimed while someone else holds it.
///
/// That can only happen through a logic error, so this mostly picks between
/// failing loudly and carrying on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnershipPolicy {
  /// The claim is a fatal error.
  Strict,
  /// Warn, reset the inflater, and give it to the new claimant.
  Lenient,
}
impl Default for OwnershipPolicy {
  #[inline]
  fn default() -> Self {
    if cfg!(debug_assertions) {
      Self::Strict
    } else {
      Self::Lenient
    }
  }
}

/// Runtime settings for a decode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecoderConfig {
  /// CRC mismatch handling for critical chunks.
  pub crc_critical: CrcAction,
  /// CRC mismatch handling for ancillary chunks.
  pub crc_ancillary: CrcAction,
  pub ownership: OwnershipPolicy,
  /// Turn every warning into a fatal [`PngError::Benign`](crate::PngError::Benign).
  pub benign_errors_fatal: bool,
  /// Skip the Adler-32 check at the end of each zlib stream.
  pub ignore_adler32: bool,
  /// Expand and combine interlaced passes into full rows.
  ///
  /// When this is off, interlaced images give each pass row as it is stored,
  /// and there's no persistent image.
  pub enable_interlace: bool,
  pub interlace_display: InterlaceDisplay,
  /// Keep a full copy of the image as it's decoded.
  ///
  /// Without it, rows are only available as they're produced.
  pub keep_image: bool,
  /// Parse `gAMA`, `cHRM`, `sRGB`, `iCCP`, and `sBIT`. When this is off they
  /// get skipped like any other unknown ancillary chunk.
  pub enable_gamma: bool,
  /// Keep `tEXt`, `zTXt`, and `iTXt` chunks (decompressed).
  pub keep_text: bool,
  /// Keep the data of ancillary chunks the decoder doesn't understand.
  pub keep_unknown_chunks: bool,
  pub max_width: u32,
  pub max_height: u32,
  /// Largest ancillary chunk that will be buffered. Bigger ones are skipped.
  pub max_chunk_len: u32,
  /// Largest decompressed size of an ancillary chunk.
  pub max_inflated_len: usize,
}
impl Default for DecoderConfig {
  #[inline]
  fn default() -> Self {
    Self {
      crc_critical: CrcAction::Error,
      crc_ancillary: CrcAction::Discard,
      ownership: OwnershipPolicy::default(),
      benign_errors_fatal: false,
      ignore_adler32: false,
      enable_interlace: true,
      interlace_display: InterlaceDisplay::Block,
      keep_image: true,
      enable_gamma: true,
      keep_text: true,
      keep_unknown_chunks: false,
      max_width: 1_000_000,
      max_height: 1_000_000,
      max_chunk_len: 8 * 1024 * 1024,
      max_inflated_len: 8 * 1024 * 1024,
    }
  }
}
