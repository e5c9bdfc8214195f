//! The push-mode decoder.
//!
//! A [`DecodeSession`] accepts a PNG in whatever pieces it arrives in. Any
//! field or chunk that's cut off at the end of a call is held until the next
//! call, so feeding a file one byte at a time gives exactly the same result as
//! feeding it all at once.
//!
//! The session walks through the chunks, checking the ordering rules and the
//! CRC of each one. Image data is never buffered whole: `IDAT` bytes go
//! straight into the inflater, and each scanline is reconstructed (and, for
//! interlaced images, expanded and merged into the image) as soon as its last
//! byte comes out.

use alloc::vec::Vec;
use core::mem::swap;

use log::{debug, trace, warn};

use crate::error::{PngError, Warning, WarningKind};

use super::{
  adam7::{expand_row, next_nonempty_pass, pass_dimensions, pass_pos_to_full},
  ancillary::{
    is_single_instance, parse_bkgd, parse_chrm, parse_gama, parse_hist, parse_phys, parse_sbit,
    parse_srgb, parse_time, parse_trns, placement_problem, AncillaryInfo, Transparency,
  },
  check_signature, combine_row,
  inflate::{
    AlreadyClaimed, InflateClaim, InflateError, InflateErrorKind, InflateStream, StreamStatus,
  },
  plte::{check_palette_length, parse_palette},
  text::{parse_iccp, parse_text, IccProfile, TextChunk, UnknownChunk},
  unfilter_row, ByteAccumulator, ChunkCrc, ChunkHeader, ChunkType, ColorType, CrcAction,
  DecoderConfig, FilterType, ImageHeader, OwnershipPolicy, PNG_SIGNATURE,
};

/// What a call to the session ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
  /// All the input was used (or held), and more is needed.
  NeedMoreData,
  /// A chunk was fully processed.
  ChunkHandled(ChunkType),
  /// A scanline is ready, see [`DecodeSession::row`].
  ///
  /// Only [`DecodeSession::step`] gives this, [`DecodeSession::feed_with`]
  /// passes rows to its callback instead.
  RowReady(RowInfo),
  /// `IEND` was processed.
  ImageComplete,
}

/// Where a finished scanline belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowInfo {
  /// The Adam7 pass, for interlaced images.
  pub pass: Option<u8>,
  /// The row of the full image.
  pub y: u32,
}

/// A finished scanline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row<'a> {
  pub pass: Option<u8>,
  pub y: u32,
  /// The row's pixels, packed as the image header describes.
  ///
  /// * When the session keeps an image, this is the row of that image, with
  ///   every pass so far merged in.
  /// * Otherwise it's the scanline by itself (for an interlaced image: the
  ///   pass row spread over the full width, or the bare pass row when
  ///   interlace handling is off).
  pub data: &'a [u8],
}

/// Everything decoded from a complete PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
  pub header: ImageHeader,
  /// Packed rows, without filter bytes. Empty if the image wasn't kept.
  pub pixels: Vec<u8>,
  pub palette: Vec<[u8; 3]>,
  pub transparency: Option<Transparency>,
  pub ancillary: AncillaryInfo,
  pub warnings: Vec<Warning>,
}

/// How a chunk's data was handled before its CRC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Body {
  Buffered,
  Skipped,
  ImageData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  Signature,
  ChunkHeader,
  ChunkBody(ChunkHeader),
  /// Bytes still to pass over.
  SkipBody(ChunkHeader, u32),
  /// Bytes still to inflate.
  ImageData(ChunkHeader, u32),
  ChunkCrc(ChunkHeader, Body),
  Done,
  Failed(PngError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Mode {
  has_plte: bool,
  has_idat: bool,
  /// `IDAT` chunks are arriving and the sequence hasn't been closed yet.
  in_idat: bool,
  after_idat: bool,
}

/// The scanline buffers and where we are in the image.
#[derive(Debug, Default)]
struct Rows {
  pass: Option<u8>,
  pass_width: u32,
  pass_rows: u32,
  row_in_pass: u32,
  /// Bytes in a row of this pass, filter byte included.
  row_len: usize,
  /// Bytes of the current row received so far.
  fill: usize,
  current: Vec<u8>,
  previous: Vec<u8>,
  /// A full width row for expanding interlaced rows.
  work: Vec<u8>,
  complete: bool,
}
impl Rows {
  fn allocate(&mut self, ihdr: &ImageHeader) -> Result<(), PngError> {
    let len = 1 + ihdr.row_bytes();
    for buf in [&mut self.current, &mut self.previous, &mut self.work] {
      buf.clear();
      buf.try_reserve_exact(len)?;
      buf.resize(len, 0);
    }
    Ok(())
  }

  fn begin_pass(&mut self, ihdr: &ImageHeader, pass: Option<u8>) {
    let (width, height) = match pass {
      Some(p) => pass_dimensions(p, ihdr.width, ihdr.height),
      None => (ihdr.width, ihdr.height),
    };
    trace!("pass {pass:?}: {width}x{height}");
    self.pass = pass;
    self.pass_width = width;
    self.pass_rows = height;
    self.row_in_pass = 0;
    self.row_len = 1 + ihdr.rowbytes(width);
    self.fill = 0;
    self.previous.fill(0);
  }

  fn begin(&mut self, ihdr: &ImageHeader) {
    if ihdr.is_interlaced() {
      match next_nonempty_pass(0, ihdr.width, ihdr.height) {
        Some(p) => self.begin_pass(ihdr, Some(p)),
        None => self.complete = true,
      }
    } else {
      self.begin_pass(ihdr, None);
    }
  }

  fn advance(&mut self, ihdr: &ImageHeader) {
    self.row_in_pass += 1;
    if self.row_in_pass < self.pass_rows {
      return;
    }
    match self.pass.and_then(|p| next_nonempty_pass(p + 1, ihdr.width, ihdr.height)) {
      Some(next) => self.begin_pass(ihdr, Some(next)),
      None => self.complete = true,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowView {
  None,
  Image(u32),
  Work(usize),
}

/// A PNG decode in progress.
#[derive(Debug)]
pub struct DecodeSession {
  config: DecoderConfig,
  state: State,
  mode: Mode,
  /// Signature, chunk header, and CRC bytes.
  fixed: ByteAccumulator,
  body: ByteAccumulator,
  crc: ChunkCrc,
  header: Option<ImageHeader>,
  palette: Vec<[u8; 3]>,
  transparency: Option<Transparency>,
  ancillary: AncillaryInfo,
  seen: Vec<ChunkType>,
  inflate: InflateStream,
  idat_claim: Option<InflateClaim>,
  /// An image data error waiting on the `IDAT` CRC.
  corrupt_data: Option<PngError>,
  stream_ended: bool,
  extra_data_warned: bool,
  rows: Rows,
  row_view: RowView,
  image: Vec<u8>,
  warnings: Vec<Warning>,
}

/// Starts decoding a new PNG.
#[inline]
#[must_use]
pub fn begin_decode(config: DecoderConfig) -> DecodeSession {
  DecodeSession::new(config)
}

/// Decodes a complete PNG that's entirely in memory.
pub fn decode(png: &[u8], config: DecoderConfig) -> Result<DecodedImage, PngError> {
  let mut session = begin_decode(config);
  match session.feed(png)? {
    Action::ImageComplete => session.finish(),
    _ => Err(PngError::UnexpectedEof),
  }
}

impl DecodeSession {
  #[must_use]
  pub fn new(config: DecoderConfig) -> Self {
    Self {
      config,
      state: State::Signature,
      mode: Mode::default(),
      fixed: ByteAccumulator::new(),
      body: ByteAccumulator::new(),
      crc: ChunkCrc::new(ChunkType::IHDR),
      header: None,
      palette: Vec::new(),
      transparency: None,
      ancillary: AncillaryInfo::default(),
      seen: Vec::new(),
      inflate: InflateStream::new(config.ignore_adler32),
      idat_claim: None,
      corrupt_data: None,
      stream_ended: false,
      extra_data_warned: false,
      rows: Rows::default(),
      row_view: RowView::None,
      image: Vec::new(),
      warnings: Vec::new(),
    }
  }

  #[inline]
  #[must_use]
  pub const fn config(&self) -> &DecoderConfig {
    &self.config
  }

  /// The image header, once `IHDR` has been processed.
  #[inline]
  #[must_use]
  pub const fn header(&self) -> Option<&ImageHeader> {
    self.header.as_ref()
  }

  #[inline]
  #[must_use]
  pub fn palette(&self) -> &[[u8; 3]] {
    &self.palette
  }

  #[inline]
  #[must_use]
  pub const fn transparency(&self) -> Option<&Transparency> {
    self.transparency.as_ref()
  }

  #[inline]
  #[must_use]
  pub const fn ancillary(&self) -> &AncillaryInfo {
    &self.ancillary
  }

  /// Benign problems found so far.
  #[inline]
  #[must_use]
  pub fn warnings(&self) -> &[Warning] {
    &self.warnings
  }

  /// The fatal error that stopped this session, if any.
  #[inline]
  #[must_use]
  pub const fn error(&self) -> Option<PngError> {
    match self.state {
      State::Failed(e) => Some(e),
      _ => None,
    }
  }

  /// If `IEND` has been processed.
  #[inline]
  #[must_use]
  pub const fn is_done(&self) -> bool {
    matches!(self.state, State::Done)
  }

  /// If every scanline has been produced.
  #[inline]
  #[must_use]
  pub const fn rows_complete(&self) -> bool {
    self.rows.complete
  }

  /// The Adam7 pass rows are coming from, for interlaced images.
  #[inline]
  #[must_use]
  pub const fn current_pass(&self) -> Option<u8> {
    self.rows.pass
  }

  /// The image as decoded so far, if the session keeps one.
  #[inline]
  #[must_use]
  pub fn image(&self) -> Option<&[u8]> {
    if self.image.is_empty() {
      None
    } else {
      Some(&self.image)
    }
  }

  /// The most recently finished row. See [`Row::data`].
  #[must_use]
  pub fn row(&self) -> &[u8] {
    match self.row_view {
      RowView::None => &[],
      RowView::Work(len) => &self.rows.work[..len],
      RowView::Image(y) => {
        let row_bytes = self.header.map_or(0, |h| h.row_bytes());
        &self.image[y as usize * row_bytes..][..row_bytes]
      }
    }
  }

  /// Gives all of `bytes` to the decoder.
  ///
  /// Returns `ImageComplete` once `IEND` is processed. Otherwise, all the bytes
  /// were used and more are needed: this returns `ChunkHandled` with the last
  /// chunk finished during the call, or `NeedMoreData` if no chunk finished.
  #[inline]
  pub fn feed(&mut self, bytes: &[u8]) -> Result<Action, PngError> {
    self.feed_with(bytes, |_| ())
  }

  /// Like [`feed`](Self::feed), also passing each finished row to `op`.
  pub fn feed_with<F: FnMut(Row<'_>)>(
    &mut self, mut bytes: &[u8], mut op: F,
  ) -> Result<Action, PngError> {
    let mut last = Action::NeedMoreData;
    loop {
      let (used, action) = self.step(bytes)?;
      bytes = &bytes[used..];
      match action {
        Action::NeedMoreData => {
          debug_assert!(bytes.is_empty());
          return Ok(last);
        }
        Action::ChunkHandled(_) => last = action,
        Action::RowReady(info) => op(Row { pass: info.pass, y: info.y, data: self.row() }),
        Action::ImageComplete => {
          if !bytes.is_empty() {
            self.note_trailing_data(bytes.len())?;
          }
          return Ok(Action::ImageComplete);
        }
      }
    }
  }

  /// Processes `bytes` up to the next event.
  ///
  /// Returns how many bytes were used along with the event. `NeedMoreData`
  /// is only returned once every byte has been used or held. After a
  /// `RowReady`, call again even with no new bytes: there can be more rows
  /// waiting in the inflater.
  pub fn step(&mut self, bytes: &[u8]) -> Result<(usize, Action), PngError> {
    if let State::Failed(e) = self.state {
      return Err(e);
    }
    match self.step_inner(bytes) {
      Ok(out) => Ok(out),
      Err(e) => {
        debug!("decode failed: {e}");
        self.state = State::Failed(e);
        Err(e)
      }
    }
  }

  /// Ends the session, giving back the decoded image.
  ///
  /// ## Failure
  /// * The session failed, or hasn't reached `IEND`.
  pub fn finish(self) -> Result<DecodedImage, PngError> {
    match self.state {
      State::Done => (),
      State::Failed(e) => return Err(e),
      _ => return Err(PngError::UnexpectedEof),
    }
    let header = self.header.ok_or(PngError::UnexpectedEof)?;
    Ok(DecodedImage {
      header,
      pixels: self.image,
      palette: self.palette,
      transparency: self.transparency,
      ancillary: self.ancillary,
      warnings: self.warnings,
    })
  }

  /// Bytes after `IEND`. When warnings are fatal, this fails the session.
  pub(crate) fn note_trailing_data(&mut self, count: usize) -> Result<(), PngError> {
    let result = self.warn(None, WarningKind::TrailingData(count));
    if let Err(e) = result {
      debug!("decode failed: {e}");
      self.state = State::Failed(e);
    }
    result
  }

  fn warn(&mut self, chunk_type: Option<ChunkType>, kind: WarningKind) -> Result<(), PngError> {
    let warning = Warning { chunk_type, kind };
    warn!("{warning}");
    if self.config.benign_errors_fatal {
      return Err(PngError::Benign(warning));
    }
    self.warnings.push(warning);
    Ok(())
  }

  fn step_inner(&mut self, bytes: &[u8]) -> Result<(usize, Action), PngError> {
    let mut pos = 0;
    loop {
      let rest = &bytes[pos..];
      match self.state {
        State::Signature => {
          let have = self.fixed.len();
          let (used, done) = self.fixed.gather(PNG_SIGNATURE.len(), rest);
          check_signature(&rest[..used], have)?;
          pos += used;
          if !done {
            return Ok((pos, Action::NeedMoreData));
          }
          self.fixed.clear();
          self.state = State::ChunkHeader;
        }
        State::ChunkHeader => {
          let (used, done) = self.fixed.gather(8, rest);
          pos += used;
          if !done {
            return Ok((pos, Action::NeedMoreData));
          }
          let raw: [u8; 8] = self.fixed.array().ok_or(PngError::UnexpectedEof)?;
          self.fixed.clear();
          self.begin_chunk(ChunkHeader::parse(raw)?)?;
        }
        State::ChunkBody(header) => {
          let (used, done) = self.body.gather(header.length as usize, rest);
          self.crc.update(&rest[..used]);
          pos += used;
          if !done {
            return Ok((pos, Action::NeedMoreData));
          }
          self.state = State::ChunkCrc(header, Body::Buffered);
        }
        State::SkipBody(header, remaining) => {
          let take = rest.len().min(remaining as usize);
          self.crc.update(&rest[..take]);
          pos += take;
          let remaining = remaining - take as u32;
          if remaining > 0 {
            self.state = State::SkipBody(header, remaining);
            return Ok((pos, Action::NeedMoreData));
          }
          self.state = State::ChunkCrc(header, Body::Skipped);
        }
        State::ImageData(header, remaining) => {
          let avail = rest.len().min(remaining as usize);
          let (used, row) = match self.pump_image_data(&rest[..avail]) {
            Ok(out) => out,
            Err(e) => {
              // the chunk's CRC decides which error gets reported
              self.corrupt_data = Some(e);
              self.state = State::SkipBody(header, remaining);
              continue;
            }
          };
          self.crc.update(&rest[..used]);
          pos += used;
          let remaining = remaining - used as u32;
          self.state = State::ImageData(header, remaining);
          if let Some(info) = row {
            return Ok((pos, Action::RowReady(info)));
          }
          if remaining == 0 {
            self.state = State::ChunkCrc(header, Body::ImageData);
          } else if used == avail {
            return Ok((pos, Action::NeedMoreData));
          }
        }
        State::ChunkCrc(header, body) => {
          let (used, done) = self.fixed.gather(4, rest);
          pos += used;
          if !done {
            return Ok((pos, Action::NeedMoreData));
          }
          let declared = u32::from_be_bytes(self.fixed.array().ok_or(PngError::UnexpectedEof)?);
          self.fixed.clear();
          let action = self.finish_chunk(header, body, declared)?;
          return Ok((pos, action));
        }
        State::Done => return Ok((pos, Action::ImageComplete)),
        State::Failed(e) => return Err(e),
      }
    }
  }

  /// Looks at a new chunk header and picks how to read the chunk data.
  fn begin_chunk(&mut self, header: ChunkHeader) -> Result<(), PngError> {
    let ty = header.chunk_type;
    trace!("{ty} chunk, {} bytes", header.length);
    if self.mode.in_idat && ty != ChunkType::IDAT {
      self.finish_image_data()?;
    }
    self.crc = ChunkCrc::new(ty);
    let skip = State::SkipBody(header, header.length);
    let ihdr = match self.header {
      Some(ihdr) => ihdr,
      None if ty == ChunkType::IHDR => {
        if header.length != 13 {
          return Err(PngError::InvalidIhdrLength(header.length));
        }
        self.state = State::ChunkBody(header);
        return Ok(());
      }
      None => return Err(PngError::MissingIhdr(ty)),
    };
    self.state = match ty {
      ChunkType::IHDR => return Err(PngError::DuplicateIhdr),
      ChunkType::PLTE => {
        if self.mode.has_plte {
          return Err(PngError::DuplicatePalette);
        }
        if self.mode.has_idat {
          self.warn(Some(ty), WarningKind::OutOfPlace)?;
          skip
        } else {
          match check_palette_length(header.length, &ihdr)? {
            Ok(()) => State::ChunkBody(header),
            Err(kind) => {
              self.warn(Some(ty), kind)?;
              skip
            }
          }
        }
      }
      ChunkType::IDAT => self.begin_image_data(header, &ihdr)?,
      ChunkType::IEND => {
        if !self.mode.has_idat {
          return Err(PngError::MissingImageData);
        }
        if header.length != 0 {
          self.warn(Some(ty), WarningKind::IendNotEmpty(header.length))?;
        }
        skip
      }
      _ if ty.is_critical() => return Err(PngError::UnhandledCriticalChunk(ty)),
      _ => self.begin_ancillary(header, &ihdr)?,
    };
    Ok(())
  }

  fn begin_image_data(
    &mut self, header: ChunkHeader, ihdr: &ImageHeader,
  ) -> Result<State, PngError> {
    if ihdr.color_type == ColorType::Index && !self.mode.has_plte {
      return Err(PngError::MissingPalette);
    }
    if self.mode.after_idat {
      self.warn(Some(ChunkType::IDAT), WarningKind::TooManyIdats)?;
      return Ok(State::SkipBody(header, header.length));
    }
    if !self.mode.has_idat {
      debug!("image data begins");
      self.idat_claim = Some(self.claim_inflater(ChunkType::IDAT)?);
      self.mode.has_idat = true;
      self.rows.begin(ihdr);
    }
    self.mode.in_idat = true;
    Ok(State::ImageData(header, header.length))
  }

  /// Chunk types that get parsed, rather than skipped or kept as unknown.
  fn understands(&self, ty: ChunkType) -> bool {
    match ty {
      ChunkType::gAMA | ChunkType::cHRM | ChunkType::sRGB | ChunkType::iCCP | ChunkType::sBIT => {
        self.config.enable_gamma
      }
      ChunkType::tEXt | ChunkType::zTXt | ChunkType::iTXt => self.config.keep_text,
      ChunkType::tRNS
      | ChunkType::bKGD
      | ChunkType::hIST
      | ChunkType::pHYs
      | ChunkType::tIME => true,
      _ => false,
    }
  }

  fn begin_ancillary(
    &mut self, header: ChunkHeader, ihdr: &ImageHeader,
  ) -> Result<State, PngError> {
    let ty = header.chunk_type;
    let skip = State::SkipBody(header, header.length);
    let understood = self.understands(ty);
    if !understood && !self.config.keep_unknown_chunks {
      return Ok(skip);
    }
    let indexed = ihdr.color_type == ColorType::Index;
    if let Some(kind) = placement_problem(ty, self.mode.has_plte, self.mode.has_idat, indexed) {
      self.warn(Some(ty), kind)?;
      return Ok(skip);
    }
    if is_single_instance(ty) && self.seen.contains(&ty) {
      self.warn(Some(ty), WarningKind::Duplicate)?;
      return Ok(skip);
    }
    if header.length > self.config.max_chunk_len {
      self.warn(Some(ty), WarningKind::ChunkTooLarge(header.length))?;
      return Ok(skip);
    }
    Ok(State::ChunkBody(header))
  }

  /// Checks the CRC and hands buffered data to its handler.
  fn finish_chunk(
    &mut self, header: ChunkHeader, body: Body, declared: u32,
  ) -> Result<Action, PngError> {
    let ty = header.chunk_type;
    let actual = self.crc.finish();
    let mut use_data = true;
    if actual != declared {
      let policy =
        if ty.is_critical() { self.config.crc_critical } else { self.config.crc_ancillary };
      let kind = WarningKind::CrcMismatch { expected: declared, actual };
      match policy {
        CrcAction::Error => {
          return Err(PngError::CrcMismatch { chunk_type: ty, expected: declared, actual })
        }
        CrcAction::Warn => self.warn(Some(ty), kind)?,
        CrcAction::Discard => {
          self.warn(Some(ty), kind)?;
          use_data = ty.is_critical();
        }
      }
    }
    if let Some(e) = self.corrupt_data.take() {
      return Err(e);
    }
    if body == Body::Buffered {
      let data = self.body.take();
      let result = if use_data { self.handle_chunk(ty, &data) } else { Ok(()) };
      self.body.recycle(data);
      result?;
    }
    if ty == ChunkType::IEND {
      debug!("IEND reached");
      self.state = State::Done;
      return Ok(Action::ImageComplete);
    }
    self.state = State::ChunkHeader;
    Ok(Action::ChunkHandled(ty))
  }

  fn handle_chunk(&mut self, ty: ChunkType, data: &[u8]) -> Result<(), PngError> {
    match ty {
      ChunkType::IHDR => self.handle_ihdr(data),
      ChunkType::PLTE => self.handle_plte(data),
      _ => self.handle_ancillary(ty, data),
    }
  }

  fn handle_ihdr(&mut self, data: &[u8]) -> Result<(), PngError> {
    let ihdr = ImageHeader::try_from(data)?;
    let (width, height) = (ihdr.width, ihdr.height);
    if width > self.config.max_width || height > self.config.max_height {
      return Err(PngError::DimensionsExceedLimits { width, height });
    }
    debug!(
      "IHDR: {width}x{height}, {:?} at {} bits, {:?}",
      ihdr.color_type, ihdr.bit_depth, ihdr.interlace_method
    );
    self.rows.allocate(&ihdr)?;
    let keep = self.config.keep_image && (!ihdr.is_interlaced() || self.config.enable_interlace);
    if keep {
      let len = ihdr.image_bytes().ok_or(PngError::AllocationFailed)?;
      self.image.try_reserve_exact(len)?;
      self.image.resize(len, 0);
    }
    self.header = Some(ihdr);
    Ok(())
  }

  fn handle_plte(&mut self, data: &[u8]) -> Result<(), PngError> {
    let ihdr = self.header.ok_or(PngError::MissingIhdr(ChunkType::PLTE))?;
    let (entries, warning) = parse_palette(data, &ihdr)?;
    if let Some(kind) = warning {
      self.warn(Some(ChunkType::PLTE), kind)?;
    }
    trace!("PLTE: {} entries", entries.len());
    self.palette = entries;
    self.mode.has_plte = true;
    Ok(())
  }

  fn handle_ancillary(&mut self, ty: ChunkType, data: &[u8]) -> Result<(), PngError> {
    let ihdr = self.header.ok_or(PngError::MissingIhdr(ty))?;
    let palette_len = self.palette.len();
    let info = &mut self.ancillary;
    let result = match ty {
      ChunkType::gAMA => parse_gama(data).map(|v| info.gamma = Some(v)),
      ChunkType::cHRM => parse_chrm(data).map(|v| info.chromaticities = Some(v)),
      ChunkType::sRGB => parse_srgb(data).map(|v| info.srgb = Some(v)),
      ChunkType::sBIT => parse_sbit(data, &ihdr).map(|v| info.significant_bits = Some(v)),
      ChunkType::bKGD => parse_bkgd(data, &ihdr, palette_len).map(|v| info.background = Some(v)),
      ChunkType::hIST => parse_hist(data, palette_len).map(|v| info.histogram = Some(v)),
      ChunkType::pHYs => parse_phys(data).map(|v| info.physical = Some(v)),
      ChunkType::tIME => parse_time(data).map(|v| info.modified = Some(v)),
      ChunkType::tRNS => match parse_trns(data, &ihdr, palette_len) {
        Ok(v) => {
          self.transparency = Some(v);
          Ok(())
        }
        Err(kind) => Err(kind),
      },
      ChunkType::iCCP if self.config.enable_gamma => return self.handle_iccp(data),
      ChunkType::tEXt | ChunkType::zTXt | ChunkType::iTXt if self.config.keep_text => {
        return self.handle_text(ty, data)
      }
      _ => {
        let mut copy = Vec::new();
        copy.try_reserve_exact(data.len())?;
        copy.extend_from_slice(data);
        info.unknown.push(UnknownChunk { chunk_type: ty, data: copy });
        Ok(())
      }
    };
    match result {
      Ok(()) => {
        self.seen.push(ty);
        Ok(())
      }
      Err(kind) => self.warn(Some(ty), kind),
    }
  }

  fn handle_iccp(&mut self, data: &[u8]) -> Result<(), PngError> {
    let (name, compressed) = match parse_iccp(data) {
      Ok(parts) => parts,
      Err(kind) => return self.warn(Some(ChunkType::iCCP), kind),
    };
    if let Some(profile) = self.inflate_ancillary(ChunkType::iCCP, compressed)? {
      trace!("iCCP: {} byte profile", profile.len());
      self.ancillary.icc_profile = Some(IccProfile { name: name.to_vec(), profile });
      self.seen.push(ChunkType::iCCP);
    }
    Ok(())
  }

  fn handle_text(&mut self, ty: ChunkType, data: &[u8]) -> Result<(), PngError> {
    let raw = match parse_text(ty, data) {
      Ok(raw) => raw,
      Err(kind) => return self.warn(Some(ty), kind),
    };
    let text = if raw.compressed {
      match self.inflate_ancillary(ty, raw.body)? {
        Some(text) => text,
        None => return Ok(()),
      }
    } else {
      raw.body.to_vec()
    };
    self.ancillary.text.push(TextChunk {
      chunk_type: ty,
      keyword: raw.keyword.to_vec(),
      language: raw.language.to_vec(),
      translated_keyword: raw.translated_keyword.to_vec(),
      text,
    });
    Ok(())
  }

  fn claim_inflater(&mut self, owner: ChunkType) -> Result<InflateClaim, PngError> {
    let conflict = match self.inflate.claim(owner) {
      Ok(claim) => return Ok(claim),
      Err(conflict) => conflict,
    };
    let AlreadyClaimed { held, requested } = conflict;
    match self.config.ownership {
      OwnershipPolicy::Strict => Err(PngError::InflateOwnership { held, requested }),
      OwnershipPolicy::Lenient => {
        self.warn(Some(requested), WarningKind::OwnershipEvicted { held })?;
        self.inflate.evict();
        if held == ChunkType::IDAT {
          self.idat_claim = None;
        }
        self
          .inflate
          .claim(owner)
          .map_err(|e| PngError::InflateOwnership { held: e.held, requested: e.requested })
      }
    }
  }

  /// Inflates the compressed part of an ancillary chunk.
  ///
  /// Problems with the compressed data are warnings, giving `Ok(None)`.
  fn inflate_ancillary(
    &mut self, owner: ChunkType, compressed: &[u8],
  ) -> Result<Option<Vec<u8>>, PngError> {
    let claim = self.claim_inflater(owner)?;
    let limit = self.config.max_inflated_len;
    let mut out = Vec::new();
    let mut buf = [0_u8; 1024];
    let mut input = compressed;
    let outcome = loop {
      let p = self.inflate.feed(&claim, input, &mut buf);
      input = &input[p.consumed..];
      if out.len() + p.produced > limit {
        break Ok(Err(WarningKind::DecompressedTooLarge(limit)));
      }
      if out.try_reserve(p.produced).is_err() {
        break Err(PngError::AllocationFailed);
      }
      out.extend_from_slice(&buf[..p.produced]);
      match p.status {
        StreamStatus::StreamEnded => break Ok(Ok(())),
        StreamStatus::OutputFull => continue,
        StreamStatus::NeedMoreInput => break Ok(Err(WarningKind::TruncatedCompressedData)),
        StreamStatus::Error(e) => break Ok(Err(WarningKind::Inflate(e))),
      }
    };
    self.inflate.release(claim);
    match outcome? {
      Ok(()) => Ok(Some(out)),
      Err(kind) => {
        self.warn(Some(owner), kind)?;
        Ok(None)
      }
    }
  }

  fn stale_claim() -> PngError {
    PngError::Inflate(InflateError::new(InflateErrorKind::StaleClaim))
  }

  /// Runs image data through the inflater and into the current row.
  ///
  /// Returns the input used, and the row that was finished, if any.
  fn pump_image_data(&mut self, input: &[u8]) -> Result<(usize, Option<RowInfo>), PngError> {
    if self.rows.complete || self.stream_ended {
      if !self.rows.complete {
        return Err(PngError::NotEnoughImageData);
      }
      return self.discard_extra_data(input);
    }
    let claim = self.idat_claim.as_ref().ok_or_else(Self::stale_claim)?;
    let rows = &mut self.rows;
    let p = self.inflate.feed(claim, input, &mut rows.current[rows.fill..rows.row_len]);
    rows.fill += p.produced;
    match p.status {
      StreamStatus::Error(e) => return Err(PngError::Inflate(e)),
      StreamStatus::StreamEnded => self.stream_ended = true,
      StreamStatus::NeedMoreInput | StreamStatus::OutputFull => (),
    }
    if self.rows.fill == self.rows.row_len {
      let info = self.finish_row()?;
      return Ok((p.consumed, Some(info)));
    }
    if self.stream_ended {
      return Err(PngError::NotEnoughImageData);
    }
    Ok((p.consumed, None))
  }

  /// Every row is done: look for the end of the zlib stream and complain
  /// about anything else.
  fn discard_extra_data(&mut self, input: &[u8]) -> Result<(usize, Option<RowInfo>), PngError> {
    if self.stream_ended {
      if !input.is_empty() {
        self.warn_extra_data()?;
      }
      return Ok((input.len(), None));
    }
    let claim = self.idat_claim.as_ref().ok_or_else(Self::stale_claim)?;
    let mut scratch = [0_u8; 256];
    let mut used = 0;
    let mut extra = false;
    loop {
      let p = self.inflate.feed(claim, &input[used..], &mut scratch);
      used += p.consumed;
      extra |= p.produced > 0;
      match p.status {
        StreamStatus::StreamEnded => {
          self.stream_ended = true;
          break;
        }
        StreamStatus::NeedMoreInput => break,
        StreamStatus::OutputFull => continue,
        StreamStatus::Error(e) => return Err(PngError::Inflate(e)),
      }
    }
    if self.stream_ended && used < input.len() {
      extra = true;
      used = input.len();
    }
    if extra {
      self.warn_extra_data()?;
    }
    Ok((used, None))
  }

  fn warn_extra_data(&mut self) -> Result<(), PngError> {
    if self.extra_data_warned {
      return Ok(());
    }
    self.extra_data_warned = true;
    self.warn(Some(ChunkType::IDAT), WarningKind::ExtraCompressedData)
  }

  /// Closes the `IDAT` sequence, which is only fine if the image is
  /// complete.
  fn finish_image_data(&mut self) -> Result<(), PngError> {
    self.mode.in_idat = false;
    self.mode.after_idat = true;
    if self.rows.complete && !self.stream_ended {
      self.discard_extra_data(&[])?;
    }
    if !self.rows.complete || !self.stream_ended {
      return Err(PngError::NotEnoughImageData);
    }
    if let Some(claim) = self.idat_claim.take() {
      self.inflate.release(claim);
    }
    debug!("image data complete");
    Ok(())
  }

  /// Unfilters the finished row and sends it along.
  fn finish_row(&mut self) -> Result<RowInfo, PngError> {
    let ihdr = self.header.ok_or(PngError::MissingIhdr(ChunkType::IDAT))?;
    let rows = &mut self.rows;
    let len = rows.row_len;
    let filter = FilterType::try_from(rows.current[0])?;
    unfilter_row(filter, ihdr.bytes_per_pixel(), &rows.previous[1..len], &mut rows.current[1..len]);
    swap(&mut rows.current, &mut rows.previous);
    rows.fill = 0;
    let y = match rows.pass {
      Some(p) => pass_pos_to_full(p, 0, rows.row_in_pass).1,
      None => rows.row_in_pass,
    };
    let info = RowInfo { pass: rows.pass, y };
    self.compose_row(&ihdr, info);
    self.rows.advance(&ihdr);
    Ok(info)
  }

  /// Puts the unfiltered row (now in `previous`) where it goes.
  fn compose_row(&mut self, ihdr: &ImageHeader, info: RowInfo) {
    let rows = &mut self.rows;
    let depth = ihdr.pixel_depth();
    let pixels = &rows.previous[1..rows.row_len];
    let row_bytes = ihdr.row_bytes();
    let keep = !self.image.is_empty();
    let display = self.config.interlace_display;
    let y = info.y as usize;
    self.row_view = match info.pass {
      None if keep => {
        let dest = &mut self.image[y * row_bytes..][..row_bytes];
        combine_row(dest, pixels, None, depth, ihdr.width, display);
        RowView::Image(info.y)
      }
      None => {
        rows.work[..pixels.len()].copy_from_slice(pixels);
        RowView::Work(pixels.len())
      }
      Some(_) if !self.config.enable_interlace => {
        rows.work[..pixels.len()].copy_from_slice(pixels);
        RowView::Work(pixels.len())
      }
      Some(pass) => {
        rows.work[..pixels.len()].copy_from_slice(pixels);
        let width = expand_row(&mut rows.work, pass, rows.pass_width, ihdr.width, depth);
        if keep {
          let dest = &mut self.image[y * row_bytes..][..row_bytes];
          combine_row(dest, &rows.work[..row_bytes], Some(pass), depth, ihdr.width, display);
          RowView::Image(info.y)
        } else {
          RowView::Work(ihdr.rowbytes(width))
        }
      }
    };
  }
}
