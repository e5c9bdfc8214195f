use alloc::vec::Vec;

/// Collects a fixed number of bytes that might arrive over several calls.
///
/// Chunk headers, CRC fields, and buffered chunk bodies are all "I need
/// exactly N bytes before I can look at any of them". Each input call hands
/// its bytes to [`gather`](Self::gather), which takes only what's still
/// missing and leaves the rest of the input for the caller.
#[derive(Debug, Clone, Default)]
pub struct ByteAccumulator {
  buf: Vec<u8>,
}
impl ByteAccumulator {
  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self { buf: Vec::new() }
  }

  /// Moves bytes from `input` until `want` bytes are held.
  ///
  /// Returns how many bytes of `input` were used, and if `want` bytes are now
  /// held.
  #[inline]
  pub fn gather(&mut self, want: usize, input: &[u8]) -> (usize, bool) {
    let missing = want.saturating_sub(self.buf.len());
    let used = missing.min(input.len());
    self.buf.extend_from_slice(&input[..used]);
    (used, self.buf.len() >= want)
  }

  #[inline]
  #[must_use]
  pub fn bytes(&self) -> &[u8] {
    &self.buf
  }

  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.buf.len()
  }

  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.buf.is_empty()
  }

  #[inline]
  pub fn clear(&mut self) {
    self.buf.clear();
  }

  /// Takes the held bytes out, so they can be used while `self` is borrowed
  /// for other things. Hand the `Vec` back with [`recycle`](Self::recycle) to
  /// keep the allocation.
  #[inline]
  #[must_use]
  pub fn take(&mut self) -> Vec<u8> {
    core::mem::take(&mut self.buf)
  }

  #[inline]
  pub fn recycle(&mut self, mut buf: Vec<u8>) {
    buf.clear();
    self.buf = buf;
  }

  /// Copies out a fixed size array once that many bytes are held.
  #[inline]
  #[must_use]
  pub fn array<const N: usize>(&self) -> Option<[u8; N]> {
    self.buf.get(..N)?.try_into().ok()
  }
}

#[test]
fn test_gather_in_pieces() {
  let mut acc = ByteAccumulator::new();
  assert_eq!(acc.gather(8, &[1, 2, 3]), (3, false));
  assert_eq!(acc.gather(8, &[]), (0, false));
  assert_eq!(acc.gather(8, &[4, 5, 6, 7, 8, 9, 10]), (5, true));
  assert_eq!(acc.array::<8>(), Some([1, 2, 3, 4, 5, 6, 7, 8]));
  // already full, nothing more gets taken
  assert_eq!(acc.gather(8, &[11]), (0, true));
  acc.clear();
  assert!(acc.is_empty());
  assert_eq!(acc.array::<4>(), None);
  // zero length requests are complete right away
  assert_eq!(acc.gather(0, &[1]), (0, true));
}

#[test]
fn test_take_and_recycle() {
  let mut acc = ByteAccumulator::new();
  acc.gather(3, b"abc");
  let v = acc.take();
  assert_eq!(v, b"abc");
  assert!(acc.is_empty());
  acc.recycle(v);
  assert!(acc.is_empty());
  assert_eq!(acc.gather(2, b"xyz"), (2, true));
  assert_eq!(acc.bytes(), b"xy");
}
