//! Adam7 interlacing.
//!
//! An interlaced image is stored as seven "reduced" images. Each pass takes
//! the pixels at a fixed offset and spacing within every 8x8 block:
//!
//! ```txt
//! 1 6 4 6 2 6 4 6
//! 7 7 7 7 7 7 7 7
//! 5 6 5 6 5 6 5 6
//! 7 7 7 7 7 7 7 7
//! 3 6 4 6 3 6 4 6
//! 7 7 7 7 7 7 7 7
//! 5 6 5 6 5 6 5 6
//! 7 7 7 7 7 7 7 7
//! ```
//!
//! Passes are numbered 0 through 6 here. A small image can have passes with no
//! pixels at all, and those passes have no scanlines in the data stream.

use bitfrob::u8_replicate_bits;

/// The number of passes.
pub const PASS_COUNT: u8 = 7;

/// First column of each pass.
pub const X_START: [u32; 7] = [0, 4, 0, 2, 0, 1, 0];
/// Column spacing of each pass.
pub const X_STEP: [u32; 7] = [8, 8, 4, 4, 2, 2, 1];
/// First row of each pass.
pub const Y_START: [u32; 7] = [0, 0, 4, 0, 2, 0, 1];
/// Row spacing of each pass.
pub const Y_STEP: [u32; 7] = [8, 8, 8, 4, 4, 2, 2];

#[inline]
const fn reduce(full: u32, start: u32, step: u32) -> u32 {
  if full <= start {
    0
  } else {
    (full - start + step - 1) / step
  }
}

/// The width and height of the reduced image of `pass`.
///
/// ## Panics
/// * `pass` must be less than [`PASS_COUNT`].
#[inline]
#[must_use]
pub const fn pass_dimensions(pass: u8, width: u32, height: u32) -> (u32, u32) {
  let p = pass as usize;
  (reduce(width, X_START[p], X_STEP[p]), reduce(height, Y_START[p], Y_STEP[p]))
}

/// Converts a position within the reduced image of `pass` into a position
/// within the full image.
///
/// ## Panics
/// * `pass` must be less than [`PASS_COUNT`].
#[inline]
#[must_use]
pub const fn pass_pos_to_full(pass: u8, x: u32, y: u32) -> (u32, u32) {
  let p = pass as usize;
  (X_START[p] + x * X_STEP[p], Y_START[p] + y * Y_STEP[p])
}

/// The first pass at or after `pass` that has any pixels.
#[inline]
#[must_use]
pub fn next_nonempty_pass(pass: u8, width: u32, height: u32) -> Option<u8> {
  (pass..PASS_COUNT).find(|&p| {
    let (w, h) = pass_dimensions(p, width, height);
    w > 0 && h > 0
  })
}

#[inline]
fn packed_get(row: &[u8], index: usize, depth: usize) -> u8 {
  let bit = index * depth;
  let shift = 8 - depth - (bit % 8);
  (row[bit / 8] >> shift) & ((1 << depth) - 1) as u8
}

#[inline]
fn packed_set(row: &mut [u8], index: usize, depth: usize, value: u8) {
  let bit = index * depth;
  let shift = 8 - depth - (bit % 8);
  let mask = (((1 << depth) - 1) as u8) << shift;
  let byte = &mut row[bit / 8];
  *byte = (*byte & !mask) | ((value << shift) & mask);
}

/// Spreads the pixels of one pass row out to full image width, in place.
///
/// `row` starts with the `sub_width` pixels of the pass row. Afterwards pixel
/// `j` of the pass covers columns `j * x_step` through `(j + 1) * x_step - 1`,
/// clipped to `final_width`. Because `x_start < x_step`, that run contains
/// pixel `j`'s real column, along with the columns of the later passes that
/// fall within its block.
///
/// The work goes from the last pixel to the first so that no source pixel is
/// overwritten before it's read. Depths below 8 work at the bit level.
///
/// Returns the number of pixels now in the row.
///
/// ## Panics
/// * `pass` must be less than [`PASS_COUNT`].
/// * `row` must have room for the expanded width.
pub fn expand_row(
  row: &mut [u8], pass: u8, sub_width: u32, final_width: u32, pixel_depth: u8,
) -> u32 {
  let step = X_STEP[pass as usize] as usize;
  let out_width = (sub_width as usize * step).min(final_width as usize);
  let depth = pixel_depth as usize;
  if step == 1 || sub_width == 0 {
    return out_width as u32;
  }
  if depth >= 8 {
    let bpp = depth / 8;
    for j in (0..sub_width as usize).rev() {
      let src = j * bpp;
      let start = j * step;
      let end = (start + step).min(out_width);
      for x in (start..end).rev() {
        row.copy_within(src..src + bpp, x * bpp);
      }
    }
  } else {
    let per_byte = 8 / depth;
    for j in (0..sub_width as usize).rev() {
      let value = packed_get(row, j, depth);
      let start = j * step;
      let mut x = (start + step).min(out_width);
      while x > start {
        if x % per_byte == 0 && x - start >= per_byte {
          // a whole byte of this one pixel
          row[x / per_byte - 1] = u8_replicate_bits(depth as u32, value);
          x -= per_byte;
        } else {
          x -= 1;
          packed_set(row, x, depth, value);
        }
      }
    }
  }
  out_width as u32
}
