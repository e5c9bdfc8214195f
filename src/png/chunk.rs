use core::fmt::{Debug, Display, Write};

use crate::error::PngError;

/// The first eight bytes of a PNG datastream should match these bytes.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// The largest length any chunk can declare, `2^31 - 1`.
pub const MAX_CHUNK_LEN: u32 = 0x7FFF_FFFF;

/// Checks `bytes` against the signature, starting at signature index
/// `offset`.
///
/// Only as many bytes as are given get checked, so this works on a signature
/// that's arriving in pieces.
///
/// * A mismatch in the first four bytes means this just isn't a PNG.
/// * A mismatch after that means the `\r\n`, `\x1A`, `\n` bytes got mangled,
///   which is what a text-mode transfer does to a PNG.
pub fn check_signature(bytes: &[u8], offset: usize) -> Result<(), PngError> {
  let expected = PNG_SIGNATURE.get(offset..).unwrap_or(&[]);
  match bytes.iter().zip(expected).position(|(b, e)| b != e) {
    None => Ok(()),
    Some(i) if offset + i < 4 => Err(PngError::NotPng),
    Some(_) => Err(PngError::AsciiConversion),
  }
}

/// A chunk's four byte type tag.
///
/// Each byte is an ASCII letter, and bit 5 of each byte (lowercase vs
/// uppercase) carries a property of the chunk type:
/// * byte 0: ancillary (lowercase) or critical (uppercase)
/// * byte 1: private (lowercase) or public (uppercase)
/// * byte 2: reserved, must be uppercase
/// * byte 3: safe to copy (lowercase) or not (uppercase)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChunkType(pub [u8; 4]);
#[allow(nonstandard_style)]
impl ChunkType {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const PLTE: Self = Self(*b"PLTE");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");
  pub const tRNS: Self = Self(*b"tRNS");
  pub const gAMA: Self = Self(*b"gAMA");
  pub const cHRM: Self = Self(*b"cHRM");
  pub const sRGB: Self = Self(*b"sRGB");
  pub const iCCP: Self = Self(*b"iCCP");
  pub const sBIT: Self = Self(*b"sBIT");
  pub const bKGD: Self = Self(*b"bKGD");
  pub const hIST: Self = Self(*b"hIST");
  pub const pHYs: Self = Self(*b"pHYs");
  pub const sPLT: Self = Self(*b"sPLT");
  pub const oFFs: Self = Self(*b"oFFs");
  pub const pCAL: Self = Self(*b"pCAL");
  pub const sCAL: Self = Self(*b"sCAL");
  pub const tIME: Self = Self(*b"tIME");
  pub const tEXt: Self = Self(*b"tEXt");
  pub const zTXt: Self = Self(*b"zTXt");
  pub const iTXt: Self = Self(*b"iTXt");

  /// If every byte is an ASCII letter.
  #[inline]
  #[must_use]
  pub const fn is_valid(self) -> bool {
    let mut i = 0;
    while i < 4 {
      let b = self.0[i];
      if !b.is_ascii_alphabetic() {
        return false;
      }
      i += 1;
    }
    true
  }

  /// Critical chunks must be understood to decode the image.
  #[inline]
  #[must_use]
  pub const fn is_critical(self) -> bool {
    (self.0[0] & 0x20) == 0
  }

  #[inline]
  #[must_use]
  pub const fn is_ancillary(self) -> bool {
    !self.is_critical()
  }

  /// Public chunks are ones defined by the PNG spec or registered with it.
  #[inline]
  #[must_use]
  pub const fn is_public(self) -> bool {
    (self.0[1] & 0x20) == 0
  }

  /// The reserved bit is clear (uppercase), as all current chunks have it.
  #[inline]
  #[must_use]
  pub const fn is_reserved_bit_clear(self) -> bool {
    (self.0[2] & 0x20) == 0
  }

  /// An editor that changes critical chunks can still copy this chunk along.
  #[inline]
  #[must_use]
  pub const fn is_safe_to_copy(self) -> bool {
    (self.0[3] & 0x20) != 0
  }
}
impl Debug for ChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    for b in self.0 {
      if b.is_ascii_graphic() {
        f.write_char(b as char)?;
      } else {
        write!(f, "\\x{b:02X}")?;
      }
    }
    Ok(())
  }
}
impl Display for ChunkType {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    Debug::fmt(self, f)
  }
}

/// The 8 bytes in front of every chunk's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkHeader {
  /// Length of the data, not counting the type or the CRC.
  pub length: u32,
  pub chunk_type: ChunkType,
}
impl ChunkHeader {
  /// Parses a big-endian length and the type tag.
  ///
  /// ## Failure
  /// * The length can't be above [`MAX_CHUNK_LEN`].
  /// * The type tag must be ASCII letters.
  pub fn parse(bytes: [u8; 8]) -> Result<Self, PngError> {
    let [l0, l1, l2, l3, t0, t1, t2, t3] = bytes;
    let length = u32::from_be_bytes([l0, l1, l2, l3]);
    let chunk_type = ChunkType([t0, t1, t2, t3]);
    if !chunk_type.is_valid() {
      return Err(PngError::InvalidChunkType(chunk_type));
    }
    if length > MAX_CHUNK_LEN {
      return Err(PngError::ChunkTooLong { chunk_type, length });
    }
    Ok(Self { length, chunk_type })
  }
}

#[test]
fn test_chunk_type_properties() {
  assert!(ChunkType::IHDR.is_critical());
  assert!(ChunkType::IHDR.is_public());
  assert!(!ChunkType::IHDR.is_safe_to_copy());
  assert!(ChunkType::tEXt.is_ancillary());
  assert!(ChunkType::tEXt.is_safe_to_copy());
  let private = ChunkType(*b"prIv");
  assert!(private.is_ancillary());
  assert!(!private.is_public());
  assert!(private.is_reserved_bit_clear());
  assert!(!ChunkType(*b"ab[d").is_valid());
  assert!(!ChunkType(*b"ab`d").is_valid());
  assert!(!ChunkType(*b"IH1R").is_valid());
  assert!(ChunkType(*b"AzaZ").is_valid());
}

#[test]
fn test_check_signature() {
  assert_eq!(check_signature(&PNG_SIGNATURE, 0), Ok(()));
  assert_eq!(check_signature(&PNG_SIGNATURE[..3], 0), Ok(()));
  assert_eq!(check_signature(&PNG_SIGNATURE[5..], 5), Ok(()));
  assert_eq!(check_signature(b"GIF89a", 0), Err(PngError::NotPng));
  assert_eq!(check_signature(&[137, 80, 78, 70], 0), Err(PngError::NotPng));
  // a unix2dos style conversion of `\n` to `\r\n`
  assert_eq!(
    check_signature(&[137, 80, 78, 71, 13, 13, 10, 26], 0),
    Err(PngError::AsciiConversion)
  );
  assert_eq!(check_signature(&[10], 7), Ok(()));
  assert_eq!(check_signature(&[13], 7), Err(PngError::AsciiConversion));
}

#[test]
fn test_chunk_header_parse() {
  let h = ChunkHeader::parse([0, 0, 0, 13, b'I', b'H', b'D', b'R']).unwrap();
  assert_eq!(h, ChunkHeader { length: 13, chunk_type: ChunkType::IHDR });
  assert_eq!(
    ChunkHeader::parse([0x80, 0, 0, 0, b'I', b'D', b'A', b'T']),
    Err(PngError::ChunkTooLong { chunk_type: ChunkType::IDAT, length: 0x8000_0000 })
  );
  assert_eq!(
    ChunkHeader::parse([0, 0, 0, 0, b'I', b'D', 0, b'T']),
    Err(PngError::InvalidChunkType(ChunkType([b'I', b'D', 0, b'T'])))
  );
}
