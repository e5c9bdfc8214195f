use super::ChunkType;

const CRC_TABLE: [u32; 256] = make_crc_table();

const fn make_crc_table() -> [u32; 256] {
  let mut out = [0; 256];
  let mut n = 0;
  while n < 256 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 8 {
      if (c & 1) != 0 {
        c = 0xEDB8_8320_u32 ^ (c >> 1);
      } else {
        c = c >> 1;
      }
      //
      k += 1;
    }
    out[n] = c;
    //
    n += 1;
  }
  out
}

#[inline]
fn update_crc(mut crc: u32, bytes: &[u8]) -> u32 {
  for &byte in bytes {
    let i = (crc ^ u32::from(byte)) as u8 as usize;
    crc = CRC_TABLE[i] ^ (crc >> 8);
  }
  crc
}

/// Continues a finished CRC32 value over more bytes, zlib style.
///
/// Start with `0` and feed the bytes in as many pieces as you like.
#[inline]
#[must_use]
pub fn crc32(running: u32, bytes: &[u8]) -> u32 {
  update_crc(running ^ u32::MAX, bytes) ^ u32::MAX
}

/// The CRC of a single chunk, built up as the chunk's bytes arrive.
///
/// The chunk CRC covers the type tag and the data, but not the length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkCrc(u32);
impl ChunkCrc {
  /// Starts a CRC that already includes the type tag.
  #[inline]
  #[must_use]
  pub fn new(chunk_type: ChunkType) -> Self {
    Self(update_crc(u32::MAX, &chunk_type.0))
  }

  #[inline]
  pub fn update(&mut self, bytes: &[u8]) {
    self.0 = update_crc(self.0, bytes);
  }

  /// The CRC value as it should appear after the chunk data.
  #[inline]
  #[must_use]
  pub const fn finish(&self) -> u32 {
    self.0 ^ u32::MAX
  }
}

#[test]
fn test_crc_known_values() {
  assert_eq!(ChunkCrc::new(ChunkType::IEND).finish(), 0xAE42_6082);
  assert_eq!(crc32(0, b"123456789"), 0xCBF4_3926);
  // pieces give the same answer as the whole
  assert_eq!(crc32(crc32(0, b"1234"), b"56789"), 0xCBF4_3926);
  let mut c = ChunkCrc::new(ChunkType(*b"1234"));
  c.update(b"5");
  c.update(b"6789");
  assert_eq!(c.finish(), 0xCBF4_3926);
}
