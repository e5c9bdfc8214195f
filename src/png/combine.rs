//! Merging scanlines into the final image.

use super::adam7::{X_START, X_STEP};

/// How the pixels of an interlaced pass are shown before the later passes
/// arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterlaceDisplay {
  /// Only write each pass pixel to its own position. Early passes look like
  /// scattered dots.
  Sparkle,
  /// Also write each pass pixel over the columns to its right that later
  /// passes will fill in, so early passes look like a blocky preview.
  #[default]
  Block,
}

/// How many columns a pass pixel writes in each mode.
#[inline]
#[must_use]
const fn run_width(pass: u8, display: InterlaceDisplay) -> u32 {
  match display {
    InterlaceDisplay::Sparkle => 1,
    InterlaceDisplay::Block => X_STEP[pass as usize] - X_START[pass as usize],
  }
}

/// The bits of byte `byte_index` that `pass` writes, for packed pixels.
#[inline]
#[must_use]
fn pass_byte_mask(pass: u8, run: u32, depth: u32, byte_index: usize, width: u32) -> u8 {
  let p = pass as usize;
  let per_byte = 8 / depth;
  let pixel_mask = ((1_u32 << depth) - 1) as u8;
  let mut mask = 0_u8;
  for k in 0..per_byte {
    let x = byte_index as u32 * per_byte + k;
    if x >= width {
      break;
    }
    let offset = x % X_STEP[p];
    if offset >= X_START[p] && offset - X_START[p] < run {
      mask |= pixel_mask << (8 - depth * (k + 1));
    }
  }
  mask
}

/// Copies the first `width` pixels of `src` into `dest`, leaving any bits of
/// the final byte past the last pixel alone.
fn copy_whole_row(dest: &mut [u8], src: &[u8], pixel_depth: u32, width: u32) {
  let bits = width as usize * pixel_depth as usize;
  let full = bits / 8;
  dest[..full].copy_from_slice(&src[..full]);
  let extra = bits % 8;
  if extra != 0 {
    let mask = 0xFF_u8 << (8 - extra);
    dest[full] = (dest[full] & !mask) | (src[full] & mask);
  }
}

/// Merges a row into a row of the persistent image.
///
/// * With `pass` as `None` the whole row is copied over.
/// * With `Some(pass)`, `src` must be the output of
///   [`expand_row`](super::adam7::expand_row), and only the columns that the
///   pass (and the `display` mode) cover get written.
///
/// Bits in `dest` that aren't covered keep their old values, including any
/// padding bits at the end of the row.
pub fn combine_row(
  dest: &mut [u8], src: &[u8], pass: Option<u8>, pixel_depth: u8, width: u32,
  display: InterlaceDisplay,
) {
  let depth = u32::from(pixel_depth);
  let pass = match pass {
    None => return copy_whole_row(dest, src, depth, width),
    Some(p) => p,
  };
  let p = pass as usize;
  let run = run_width(pass, display);
  if run == X_STEP[p] && X_START[p] == 0 {
    // every column is covered
    return copy_whole_row(dest, src, depth, width);
  }
  if depth >= 8 {
    let bpp = depth as usize / 8;
    let mut x = X_START[p];
    while x < width {
      let end = (x + run).min(width);
      let range = x as usize * bpp..end as usize * bpp;
      dest[range.clone()].copy_from_slice(&src[range]);
      x += X_STEP[p];
    }
  } else {
    let row_bytes = (width as usize * depth as usize + 7) / 8;
    for (i, (d, s)) in dest[..row_bytes].iter_mut().zip(src).enumerate() {
      let mask = pass_byte_mask(pass, run, depth, i, width);
      *d = (*d & !mask) | (*s & mask);
    }
  }
}
