//! Text chunks, ICC profiles, and other keyword-led chunks.

use alloc::{string::String, vec::Vec};

use crate::error::WarningKind;

use super::ChunkType;

/// A text chunk, with any compression already undone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextChunk {
  /// `tEXt`, `zTXt`, or `iTXt`.
  pub chunk_type: ChunkType,
  /// Latin-1, 1 to 79 bytes.
  pub keyword: Vec<u8>,
  /// `iTXt` only: an RFC 3066 language tag.
  pub language: Vec<u8>,
  /// `iTXt` only: the keyword, translated, in UTF-8.
  pub translated_keyword: Vec<u8>,
  /// Latin-1 for `tEXt` and `zTXt`, UTF-8 for `iTXt`.
  pub text: Vec<u8>,
}
impl TextChunk {
  #[inline]
  #[must_use]
  pub fn keyword_string(&self) -> String {
    self.keyword.iter().map(|&b| b as char).collect()
  }

  /// The text decoded with the right encoding for the chunk type.
  #[must_use]
  pub fn text_string(&self) -> String {
    if self.chunk_type == ChunkType::iTXt {
      String::from_utf8_lossy(&self.text).into_owned()
    } else {
      self.text.iter().map(|&b| b as char).collect()
    }
  }
}

/// An embedded ICC profile, decompressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IccProfile {
  pub name: Vec<u8>,
  pub profile: Vec<u8>,
}

/// An ancillary chunk the decoder doesn't understand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnknownChunk {
  pub chunk_type: ChunkType,
  pub data: Vec<u8>,
}

/// A text chunk split into its parts, before decompression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawText<'b> {
  pub keyword: &'b [u8],
  pub language: &'b [u8],
  pub translated_keyword: &'b [u8],
  pub body: &'b [u8],
  pub compressed: bool,
}

/// Splits off a null-terminated keyword of 1 to 79 bytes.
pub(crate) fn split_keyword(data: &[u8]) -> Result<(&[u8], &[u8]), WarningKind> {
  let nul = data.iter().position(|&b| b == 0).ok_or(WarningKind::BadKeyword)?;
  if !(1..=79).contains(&nul) {
    return Err(WarningKind::BadKeyword);
  }
  Ok((&data[..nul], &data[nul + 1..]))
}

fn split_nul(data: &[u8]) -> Result<(&[u8], &[u8]), WarningKind> {
  let nul = data.iter().position(|&b| b == 0).ok_or(WarningKind::InvalidValue)?;
  Ok((&data[..nul], &data[nul + 1..]))
}

/// The compression method byte has to be 0 (zlib).
fn compression_method(data: &[u8]) -> Result<&[u8], WarningKind> {
  match data {
    [0, rest @ ..] => Ok(rest),
    [m, ..] => Err(WarningKind::UnknownCompression(*m)),
    [] => Err(WarningKind::InvalidLength(0)),
  }
}

pub(crate) fn parse_text(chunk_type: ChunkType, data: &[u8]) -> Result<RawText<'_>, WarningKind> {
  let (keyword, rest) = split_keyword(data)?;
  let mut raw =
    RawText { keyword, language: &[], translated_keyword: &[], body: rest, compressed: false };
  match chunk_type {
    ChunkType::zTXt => {
      raw.body = compression_method(rest)?;
      raw.compressed = true;
    }
    ChunkType::iTXt => {
      let (flag, rest) = rest.split_first().ok_or(WarningKind::InvalidLength(data.len() as u32))?;
      let rest = match flag {
        0 => rest.get(1..).ok_or(WarningKind::InvalidLength(data.len() as u32))?,
        1 => compression_method(rest)?,
        _ => return Err(WarningKind::InvalidValue),
      };
      let (language, rest) = split_nul(rest)?;
      let (translated_keyword, body) = split_nul(rest)?;
      raw = RawText { keyword, language, translated_keyword, body, compressed: *flag == 1 };
    }
    _ => (),
  }
  Ok(raw)
}

/// Splits `iCCP` data into the profile name and the compressed profile.
pub(crate) fn parse_iccp(data: &[u8]) -> Result<(&[u8], &[u8]), WarningKind> {
  let (name, rest) = split_keyword(data)?;
  Ok((name, compression_method(rest)?))
}
