use crate::error::PngError;

use super::MAX_CHUNK_LEN;

/// The kind of color stored in each pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ColorType {
  /// Greyscale
  Y = 0,
  /// Red, Green, Blue
  RGB = 2,
  /// Index into a palette.
  ///
  /// The palette will have RGB8 data. There may optionally be a transparency
  /// chunk.
  Index = 3,
  /// Greyscale + Alpha
  YA = 4,
  /// Red, Green, Blue, Alpha
  RGBA = 6,
}
impl ColorType {
  /// The number of channels in this type of color.
  #[inline]
  #[must_use]
  pub const fn channel_count(self) -> u8 {
    match self {
      Self::Y => 1,
      Self::RGB => 3,
      Self::Index => 1,
      Self::YA => 2,
      Self::RGBA => 4,
    }
  }

  /// The bit depths the format allows with this color type.
  #[inline]
  #[must_use]
  pub const fn allowed_bit_depths(self) -> &'static [u8] {
    match self {
      Self::Y => &[1, 2, 4, 8, 16],
      Self::Index => &[1, 2, 4, 8],
      Self::RGB | Self::YA | Self::RGBA => &[8, 16],
    }
  }

  #[inline]
  #[must_use]
  pub const fn has_alpha(self) -> bool {
    matches!(self, Self::YA | Self::RGBA)
  }
}
impl TryFrom<u8> for ColorType {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => Self::Y,
      2 => Self::RGB,
      3 => Self::Index,
      4 => Self::YA,
      6 => Self::RGBA,
      _ => return Err(PngError::InvalidColorType(value)),
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InterlaceMethod {
  /// Scanlines are stored top to bottom.
  None,
  /// The image is stored as seven reduced images, see [`adam7`](super::adam7).
  Adam7,
}

/// Image header.
///
/// Every field is checked when this is parsed, so any value of this type
/// describes an image the decoder can handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHeader {
  pub width: u32,
  pub height: u32,
  /// Bits per channel.
  pub bit_depth: u8,
  pub color_type: ColorType,
  pub compression_method: u8,
  pub filter_method: u8,
  pub interlace_method: InterlaceMethod,
}
impl TryFrom<&[u8]> for ImageHeader {
  type Error = PngError;
  fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
    match value {
      [
        w0,
        w1,
        w2,
        w3,
        h0,
        h1,
        h2,
        h3,
        bit_depth,
        color_type,
        compression_method,
        filter_method,
        interlace_method,
      ] => {
        let width = u32::from_be_bytes([*w0, *w1, *w2, *w3]);
        let height = u32::from_be_bytes([*h0, *h1, *h2, *h3]);
        if width == 0 || height == 0 || width > MAX_CHUNK_LEN || height > MAX_CHUNK_LEN {
          return Err(PngError::InvalidDimensions { width, height });
        }
        let color_type_enum = ColorType::try_from(*color_type)?;
        if !color_type_enum.allowed_bit_depths().contains(bit_depth) {
          return Err(PngError::InvalidBitDepth {
            color_type: *color_type,
            bit_depth: *bit_depth,
          });
        }
        if *compression_method != 0 {
          return Err(PngError::InvalidCompressionMethod(*compression_method));
        }
        if *filter_method != 0 {
          return Err(PngError::InvalidFilterMethod(*filter_method));
        }
        let interlace_method = match interlace_method {
          0 => InterlaceMethod::None,
          1 => InterlaceMethod::Adam7,
          other => return Err(PngError::InvalidInterlaceMethod(*other)),
        };
        Ok(Self {
          width,
          height,
          bit_depth: *bit_depth,
          color_type: color_type_enum,
          compression_method: *compression_method,
          filter_method: *filter_method,
          interlace_method,
        })
      }
      _ => Err(PngError::InvalidIhdrLength(value.len() as u32)),
    }
  }
}
impl ImageHeader {
  #[inline]
  #[must_use]
  pub const fn channels(&self) -> u8 {
    self.color_type.channel_count()
  }

  /// Bits per pixel (at most 64).
  #[inline]
  #[must_use]
  pub const fn pixel_depth(&self) -> u8 {
    self.bit_depth * self.channels()
  }

  /// The "filter unit" of the image: bytes per pixel, rounded up to 1 for
  /// depths below 8 bits.
  #[inline]
  #[must_use]
  pub const fn bytes_per_pixel(&self) -> usize {
    (self.pixel_depth() as usize + 7) / 8
  }

  /// Bytes used by a row of `width` pixels of this format, without the filter
  /// byte.
  #[inline]
  #[must_use]
  pub const fn rowbytes(&self, width: u32) -> usize {
    (width as usize * self.pixel_depth() as usize + 7) / 8
  }

  /// Bytes in one full-width row.
  #[inline]
  #[must_use]
  pub const fn row_bytes(&self) -> usize {
    self.rowbytes(self.width)
  }

  /// Bytes in the whole final image, if that fits in `usize`.
  #[inline]
  #[must_use]
  pub fn image_bytes(&self) -> Option<usize> {
    self.row_bytes().checked_mul(self.height as usize)
  }

  #[inline]
  #[must_use]
  pub const fn is_interlaced(&self) -> bool {
    matches!(self.interlace_method, InterlaceMethod::Adam7)
  }
}

#[test]
fn test_image_header_parse() {
  let ihdr = ImageHeader::try_from(&[0, 0, 0, 3, 0, 0, 1, 0, 8, 6, 0, 0, 1][..]).unwrap();
  assert_eq!(ihdr.width, 3);
  assert_eq!(ihdr.height, 256);
  assert_eq!(ihdr.color_type, ColorType::RGBA);
  assert_eq!(ihdr.pixel_depth(), 32);
  assert_eq!(ihdr.bytes_per_pixel(), 4);
  assert_eq!(ihdr.row_bytes(), 12);
  assert!(ihdr.is_interlaced());

  let gray1 = ImageHeader::try_from(&[0, 0, 0, 9, 0, 0, 0, 1, 1, 0, 0, 0, 0][..]).unwrap();
  assert_eq!(gray1.bytes_per_pixel(), 1);
  assert_eq!(gray1.row_bytes(), 2);

  assert_eq!(
    ImageHeader::try_from(&[0, 0, 0, 0, 0, 0, 0, 1, 8, 0, 0, 0, 0][..]),
    Err(PngError::InvalidDimensions { width: 0, height: 1 })
  );
  assert_eq!(
    ImageHeader::try_from(&[0, 0, 0, 1, 0, 0, 0, 1, 4, 2, 0, 0, 0][..]),
    Err(PngError::InvalidBitDepth { color_type: 2, bit_depth: 4 })
  );
  assert_eq!(
    ImageHeader::try_from(&[0, 0, 0, 1, 0, 0, 0, 1, 8, 5, 0, 0, 0][..]),
    Err(PngError::InvalidColorType(5))
  );
  assert_eq!(
    ImageHeader::try_from(&[0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 1, 0, 0][..]),
    Err(PngError::InvalidCompressionMethod(1))
  );
  assert_eq!(
    ImageHeader::try_from(&[0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 64, 0][..]),
    Err(PngError::InvalidFilterMethod(64))
  );
  assert_eq!(
    ImageHeader::try_from(&[0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0, 2][..]),
    Err(PngError::InvalidInterlaceMethod(2))
  );
  assert_eq!(ImageHeader::try_from(&[0; 12][..]), Err(PngError::InvalidIhdrLength(12)));
}

#[test]
fn test_legal_depth_combinations() {
  let mut legal = 0;
  for color_type in 0..=6 {
    for bit_depth in 0..=16 {
      let bytes = [0, 0, 0, 1, 0, 0, 0, 1, bit_depth, color_type, 0, 0, 0];
      if ImageHeader::try_from(&bytes[..]).is_ok() {
        legal += 1;
      }
    }
  }
  assert_eq!(legal, 5 + 2 + 4 + 2 + 2);
}
