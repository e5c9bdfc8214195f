//! Holds all the tools for decoding PNG data.
//!
//! ## Automated PNG Decoding
//! If the whole PNG is already in memory and you just want the pixels, call
//! [`decode`]. You get back a [`DecodedImage`] with the header, the packed
//! pixel rows, the palette, and everything kept from the ancillary chunks.
//!
//! ## Push Decoding
//! Usually PNG data arrives in pieces: off of a network socket, out of a file
//! read in blocks, and so on. Instead of collecting it all first you can hand
//! each piece to a [`DecodeSession`] as it shows up.
//!
//! The general format of a PNG is that the information is stored in "chunks".
//! There's four "critical" chunk types:
//! * **Header** (`IHDR`) - This has all the important information about the
//!   image's dimensions, pixel format, and if the image is interlaced or not.
//! * **Palette** (`PLTE`) - If an image uses indexed color it will have a
//!   palette of what index values map to what `RGB8` values.
//! * **Image Data** (`IDAT`) - One or more chunks of compressed data. All of
//!   the compressed data forms a single zlib data stream, and all of the image
//!   data chunks must appear one after the other.
//! * **End** (`IEND`) - The last chunk, lets you know you had the full PNG and
//!   your data wasn't truncated accidentally.
//!
//! Between the header and the end there can also be "ancillary" chunks. The
//! session checks where these appear and keeps the ones it understands in an
//! [`AncillaryInfo`], but it never applies them to the pixels.
//!
//! ```no_run
//! use pngpush::png::*;
//! let pieces: &[&[u8]] = unimplemented!("data from somewhere");
//! let mut session = begin_decode(DecoderConfig::default());
//! for piece in pieces {
//!   session.feed_with(piece, |row| println!("row {}: {} bytes", row.y, row.data.len()))?;
//! }
//! let image = session.finish()?;
//! # Ok::<(), pngpush::PngError>(())
//! ```
//!
//! Image data is never buffered up. The bytes of each `IDAT` go right into
//! the inflater, and each scanline is unfiltered and handed out as soon as its
//! last byte is decompressed. When storing the PNG, the raw pixel values are
//! first "filtered" (to try and make them more compression-friendly), and then
//! compressed, so decoding reverses those steps:
//!
//! * **Unfiltering:** Each scanline starts with a byte saying which filter was
//!   used for that line. The filters predict each byte from the bytes to the
//!   left and above, so a line can only be unfiltered once the line before it
//!   is done.
//! * **Interlacing:** An interlaced image is stored as seven "reduced images",
//!   each with its own scanlines. As the rows of each pass come in they get
//!   spread out to the full image width (see [`InterlaceDisplay`]) and merged
//!   into the image, so that a rough version of the picture can be shown
//!   early and then refined.
//!
//! ## Problems
//! Anything that makes the image undecodable is a [`PngError`](crate::PngError)
//! and stops the session. Smaller problems (a bad ancillary chunk, junk after
//! `IEND`, and so on) are recorded as a [`Warning`](crate::Warning) and the
//! decode keeps going. The [`DecoderConfig`] can change the CRC handling, or
//! make every warning fatal.
//!
//! ## Pull Decoding
//! If you'd rather ask for rows than be handed them, a [`RowReader`] wraps a
//! session around any [`ByteSource`] and reads more bytes each time the
//! session runs out.

mod accumulator;
pub use accumulator::*;

pub mod adam7;

mod ancillary;
pub use ancillary::*;

mod chunk;
pub use chunk::*;

mod combine;
pub use combine::*;

mod config;
pub use config::*;

mod crc32;
pub use crc32::*;

mod ihdr;
pub use ihdr::*;

mod inflate;
pub use inflate::*;

mod plte;
pub use plte::*;

mod pull;
pub use pull::*;

mod session;
pub use session::*;

mod text;
pub use text::*;

mod unfilter;
pub use unfilter::*;
