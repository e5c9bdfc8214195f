#![no_std]
#![cfg_attr(docs_rs, feature(doc_cfg))]

//! A streaming PNG decoder.
//!
//! PNG bytes can be given to the decoder in pieces of any size, and each
//! scanline comes out as soon as it has been decompressed and unfiltered. See
//! the [`png`] module for the details.
//!
//! The crate is `no_std`, but does need `alloc`. The `std` feature (on by
//! default) adds `std::error::Error` support and reading from `std::io`.

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

mod error;
pub use error::*;

pub mod png;

/// The rendering intent given by an `sRGB` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
// Note(Lokathor): This doesn't have direct impls to parse to and from bytes
// because each format uses different bytes to mean each of these options.
pub enum SrgbIntent {
  /// for images preferring good adaptation to the output device gamut at the
  /// expense of colorimetric accuracy, such as photographs.
  Perceptual,
  /// for images requiring colour appearance matching (relative to the output
  /// device white point), such as logos.
  RelativeColorimetric,
  /// for images preferring preservation of saturation at the expense of hue and
  /// lightness, such as charts and graphs.
  Saturation,
  /// for images requiring preservation of absolute colorimetry, such as
  /// previews of images destined for a different output device (proofs).
  AbsoluteColorimetric,
}
