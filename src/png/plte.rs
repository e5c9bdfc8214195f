use alloc::vec::Vec;

use crate::error::{PngError, WarningKind};

use super::{ColorType, ImageHeader};

/// The most entries a palette can have.
pub const MAX_PALETTE_LEN: usize = 256;

/// Checks a `PLTE` length before any of the data is buffered.
///
/// * `Ok(Ok(()))`: go ahead and read the palette.
/// * `Ok(Err(kind))`: the palette is unusable but the image doesn't need one,
///   so it gets skipped with a warning.
/// * `Err`: an indexed image with an unusable palette.
pub(crate) fn check_palette_length(
  length: u32, header: &ImageHeader,
) -> Result<Result<(), WarningKind>, PngError> {
  let bad = length == 0 || length % 3 != 0 || length as usize > 3 * MAX_PALETTE_LEN;
  match header.color_type {
    ColorType::Index if bad => Err(PngError::InvalidPalette(length)),
    ColorType::Y | ColorType::YA => Ok(Err(WarningKind::PaletteIgnored)),
    _ if bad => Ok(Err(WarningKind::InvalidLength(length))),
    _ => Ok(Ok(())),
  }
}

/// Splits `PLTE` data into entries.
///
/// An indexed image can't use more entries than its bit depth can index, so
/// extra entries are dropped and reported.
pub(crate) fn parse_palette(
  data: &[u8], header: &ImageHeader,
) -> Result<(Vec<[u8; 3]>, Option<WarningKind>), PngError> {
  let entries: &[[u8; 3]] =
    bytemuck::try_cast_slice(data).map_err(|_| PngError::InvalidPalette(data.len() as u32))?;
  let max = match header.color_type {
    ColorType::Index => 1_usize << header.bit_depth,
    _ => MAX_PALETTE_LEN,
  };
  if entries.len() > max {
    let warning =
      WarningKind::PaletteTruncated { entries: entries.len() as u16, max: max as u16 };
    Ok((entries[..max].to_vec(), Some(warning)))
  } else {
    Ok((entries.to_vec(), None))
  }
}
