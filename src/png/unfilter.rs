//! From the PNG spec:
//!
//! > Filters are applied to **bytes**, not to pixels, regardless of the bit
//! > depth or color type of the image.
//!
//! Each scanline picks one of five filters. Reconstructing a byte `x` uses
//! the already reconstructed bytes around it:
//!
//! ```txt
//! c b
//! a x
//! ```
//!
//! * `a` is the byte one filter unit (pixel, rounded up to a whole byte) to
//!   the left.
//! * `b` is the byte directly above, in the previous scanline.
//! * `c` is the byte above `a`.
//!
//! Bytes to the left of the first pixel, and every byte of the scanline "above"
//! the first one in each image or Adam7 pass, count as 0.

use crate::error::PngError;

/// The filter type byte in front of each scanline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum FilterType {
  None = 0,
  Sub = 1,
  Up = 2,
  Average = 3,
  Paeth = 4,
}
impl TryFrom<u8> for FilterType {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => Self::None,
      1 => Self::Sub,
      2 => Self::Up,
      3 => Self::Average,
      4 => Self::Paeth,
      _ => return Err(PngError::InvalidFilterType(value)),
    })
  }
}

/// Picks whichever of `a`, `b`, or `c` is closest to `a + b - c`.
#[inline]
#[must_use]
pub const fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p: i32 = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  // Note(Lokathor): The PNG spec is extremely specific that you shall not,
  // under any circumstances, alter the order of evaluation of this
  // expression's tests.
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// `Average` prediction, computed without the byte sum wrapping.
#[inline]
#[must_use]
const fn average_predict(a: u8, b: u8) -> u8 {
  ((a as u16 + b as u16) / 2) as u8
}

/// Reverses the filter on `current` in place.
///
/// * `bpp` is the filter unit: bytes per complete pixel, at least 1.
/// * `previous` is the reconstructed scanline above, or all zeroes for the
///   first scanline of an image or pass. It must be as long as `current`.
///
/// The slices don't include the filter type byte.
pub fn unfilter_row(filter: FilterType, bpp: usize, previous: &[u8], current: &mut [u8]) {
  debug_assert!((1..=8).contains(&bpp));
  debug_assert_eq!(previous.len(), current.len());
  let len = current.len();
  let lead = bpp.min(len);
  match filter {
    FilterType::None => (),
    FilterType::Sub => {
      for i in bpp..len {
        current[i] = current[i].wrapping_add(current[i - bpp]);
      }
    }
    FilterType::Up => {
      current.iter_mut().zip(previous.iter()).for_each(|(x, b)| {
        *x = x.wrapping_add(*b);
      });
    }
    FilterType::Average => {
      for i in 0..lead {
        current[i] = current[i].wrapping_add(previous[i] / 2);
      }
      for i in bpp..len {
        current[i] = current[i].wrapping_add(average_predict(current[i - bpp], previous[i]));
      }
    }
    FilterType::Paeth => {
      // with a and c both 0 the predictor always picks b
      for i in 0..lead {
        current[i] = current[i].wrapping_add(previous[i]);
      }
      for i in bpp..len {
        let p = paeth_predict(current[i - bpp], previous[i], previous[i - bpp]);
        current[i] = current[i].wrapping_add(p);
      }
    }
  }
}
