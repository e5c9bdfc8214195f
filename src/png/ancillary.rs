//! The fixed layout ancillary chunks, and the rules for where ancillary chunks
//! may appear.
//!
//! The decoder checks these chunks and keeps their values, but it doesn't
//! apply any of them to the pixels.

use alloc::vec::Vec;

use crate::{error::WarningKind, SrgbIntent};

use super::{ChunkType, ColorType, IccProfile, ImageHeader, TextChunk, UnknownChunk};

/// CIE 1931 xy chromaticities, times 100,000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chromaticities {
  pub white: [u32; 2],
  pub red: [u32; 2],
  pub green: [u32; 2],
  pub blue: [u32; 2],
}

/// Background color to show the image against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Background {
  Y(u16),
  RGB([u16; 3]),
  Index(u8),
}

/// Transparency data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Transparency {
  /// This grey value is fully transparent.
  Y(u16),
  /// This color is fully transparent.
  RGB([u16; 3]),
  /// Alpha values that pair with the palette entries. There can be fewer
  /// alpha entries than palette entries; the rest are fully opaque.
  Index(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhysicalDimensions {
  pub pixels_per_unit_x: u32,
  pub pixels_per_unit_y: u32,
  /// The unit is the meter, otherwise the values only give an aspect ratio.
  pub unit_is_meter: bool,
}

/// Last modification time, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LastModified {
  pub year: u16,
  pub month: u8,
  pub day: u8,
  pub hour: u8,
  pub minute: u8,
  /// Up to 60, for leap seconds.
  pub second: u8,
}

/// Everything the decoder keeps from the ancillary chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AncillaryInfo {
  /// Image gamma times 100,000.
  pub gamma: Option<u32>,
  pub chromaticities: Option<Chromaticities>,
  pub srgb: Option<SrgbIntent>,
  /// Significant bits per channel (one value per channel, three for an
  /// indexed image).
  pub significant_bits: Option<Vec<u8>>,
  pub background: Option<Background>,
  /// Usage frequency of each palette entry.
  pub histogram: Option<Vec<u16>>,
  pub physical: Option<PhysicalDimensions>,
  pub modified: Option<LastModified>,
  pub icc_profile: Option<IccProfile>,
  pub text: Vec<TextChunk>,
  pub unknown: Vec<UnknownChunk>,
}

/// Ancillary chunks that may appear at most once.
#[inline]
#[must_use]
pub(crate) fn is_single_instance(chunk_type: ChunkType) -> bool {
  matches!(
    chunk_type,
    ChunkType::gAMA
      | ChunkType::cHRM
      | ChunkType::sRGB
      | ChunkType::iCCP
      | ChunkType::sBIT
      | ChunkType::tRNS
      | ChunkType::bKGD
      | ChunkType::hIST
      | ChunkType::pHYs
      | ChunkType::tIME
      | ChunkType::oFFs
      | ChunkType::pCAL
      | ChunkType::sCAL
  )
}

/// If an ancillary chunk is in a place it isn't allowed.
#[must_use]
pub(crate) fn placement_problem(
  chunk_type: ChunkType, has_plte: bool, has_idat: bool, indexed: bool,
) -> Option<WarningKind> {
  match chunk_type {
    ChunkType::gAMA | ChunkType::cHRM | ChunkType::sRGB | ChunkType::iCCP | ChunkType::sBIT
      if has_plte || has_idat =>
    {
      Some(WarningKind::OutOfPlace)
    }
    ChunkType::tRNS
    | ChunkType::bKGD
    | ChunkType::hIST
    | ChunkType::pHYs
    | ChunkType::sPLT
    | ChunkType::oFFs
    | ChunkType::pCAL
    | ChunkType::sCAL
      if has_idat =>
    {
      Some(WarningKind::OutOfPlace)
    }
    ChunkType::hIST if !has_plte => Some(WarningKind::MissingPalette),
    ChunkType::tRNS | ChunkType::bKGD if indexed && !has_plte => Some(WarningKind::MissingPalette),
    _ => None,
  }
}

#[inline]
fn u16_be(bytes: &[u8], i: usize) -> u16 {
  u16::from_be_bytes([bytes[i], bytes[i + 1]])
}

#[inline]
fn u32_be(bytes: &[u8], i: usize) -> u32 {
  u32::from_be_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]])
}

#[inline]
fn expect_len(data: &[u8], len: usize) -> Result<(), WarningKind> {
  if data.len() == len {
    Ok(())
  } else {
    Err(WarningKind::InvalidLength(data.len() as u32))
  }
}

pub(crate) fn parse_gama(data: &[u8]) -> Result<u32, WarningKind> {
  expect_len(data, 4)?;
  match u32_be(data, 0) {
    0 => Err(WarningKind::InvalidValue),
    gamma => Ok(gamma),
  }
}

pub(crate) fn parse_chrm(data: &[u8]) -> Result<Chromaticities, WarningKind> {
  expect_len(data, 32)?;
  let v = |n: usize| u32_be(data, n * 4);
  Ok(Chromaticities {
    white: [v(0), v(1)],
    red: [v(2), v(3)],
    green: [v(4), v(5)],
    blue: [v(6), v(7)],
  })
}

pub(crate) fn parse_srgb(data: &[u8]) -> Result<SrgbIntent, WarningKind> {
  expect_len(data, 1)?;
  Ok(match data[0] {
    0 => SrgbIntent::Perceptual,
    1 => SrgbIntent::RelativeColorimetric,
    2 => SrgbIntent::Saturation,
    3 => SrgbIntent::AbsoluteColorimetric,
    _ => return Err(WarningKind::InvalidValue),
  })
}

pub(crate) fn parse_sbit(data: &[u8], header: &ImageHeader) -> Result<Vec<u8>, WarningKind> {
  let (channels, max) = match header.color_type {
    ColorType::Index => (3, 8),
    _ => (usize::from(header.channels()), header.bit_depth),
  };
  expect_len(data, channels)?;
  if data.iter().any(|&b| b == 0 || b > max) {
    return Err(WarningKind::InvalidValue);
  }
  Ok(data.to_vec())
}

pub(crate) fn parse_bkgd(
  data: &[u8], header: &ImageHeader, palette_len: usize,
) -> Result<Background, WarningKind> {
  match header.color_type {
    ColorType::Index => {
      expect_len(data, 1)?;
      if usize::from(data[0]) >= palette_len {
        return Err(WarningKind::InvalidValue);
      }
      Ok(Background::Index(data[0]))
    }
    ColorType::Y | ColorType::YA => {
      expect_len(data, 2)?;
      Ok(Background::Y(u16_be(data, 0)))
    }
    ColorType::RGB | ColorType::RGBA => {
      expect_len(data, 6)?;
      Ok(Background::RGB([u16_be(data, 0), u16_be(data, 2), u16_be(data, 4)]))
    }
  }
}

pub(crate) fn parse_trns(
  data: &[u8], header: &ImageHeader, palette_len: usize,
) -> Result<Transparency, WarningKind> {
  match header.color_type {
    ColorType::Y => {
      expect_len(data, 2)?;
      Ok(Transparency::Y(u16_be(data, 0)))
    }
    ColorType::RGB => {
      expect_len(data, 6)?;
      Ok(Transparency::RGB([u16_be(data, 0), u16_be(data, 2), u16_be(data, 4)]))
    }
    ColorType::Index => {
      if data.is_empty() || data.len() > palette_len {
        return Err(WarningKind::InvalidLength(data.len() as u32));
      }
      Ok(Transparency::Index(data.to_vec()))
    }
    // there's already a full alpha channel
    ColorType::YA | ColorType::RGBA => Err(WarningKind::InvalidValue),
  }
}

pub(crate) fn parse_hist(data: &[u8], palette_len: usize) -> Result<Vec<u16>, WarningKind> {
  expect_len(data, palette_len * 2)?;
  Ok(data.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect())
}

pub(crate) fn parse_phys(data: &[u8]) -> Result<PhysicalDimensions, WarningKind> {
  expect_len(data, 9)?;
  let unit_is_meter = match data[8] {
    0 => false,
    1 => true,
    _ => return Err(WarningKind::InvalidValue),
  };
  Ok(PhysicalDimensions {
    pixels_per_unit_x: u32_be(data, 0),
    pixels_per_unit_y: u32_be(data, 4),
    unit_is_meter,
  })
}

pub(crate) fn parse_time(data: &[u8]) -> Result<LastModified, WarningKind> {
  expect_len(data, 7)?;
  let t = LastModified {
    year: u16_be(data, 0),
    month: data[2],
    day: data[3],
    hour: data[4],
    minute: data[5],
    second: data[6],
  };
  if !(1..=12).contains(&t.month)
    || !(1..=31).contains(&t.day)
    || t.hour > 23
    || t.minute > 59
    || t.second > 60
  {
    return Err(WarningKind::InvalidValue);
  }
  Ok(t)
}
