use miniz_oxide::deflate::compress_to_vec_zlib;
use pngpush::{
  png::{adam7::*, *},
  PngError, Warning, WarningKind,
};

use build::*;

#[test]
fn test_one_gray_pixel() {
  let png = png_file(&ihdr(1, 1, 8, 0, 0), &[], &compress_to_vec_zlib(&[0, 128], 6));
  let image = decode(&png, DecoderConfig::default()).unwrap();
  assert_eq!(image.header.width, 1);
  assert_eq!(image.header.height, 1);
  assert_eq!(image.header.color_type, ColorType::Y);
  assert_eq!(image.pixels, [128]);
  assert!(image.warnings.is_empty());
}

#[test]
fn test_all_formats_decode() {
  for (color_type, depths) in [
    (0, &[1, 2, 4, 8, 16][..]),
    (2, &[8, 16][..]),
    (3, &[1, 2, 4, 8][..]),
    (4, &[8, 16][..]),
    (6, &[8, 16][..]),
  ] {
    for &depth in depths {
      for (w, h) in [(1, 1), (3, 2), (13, 7)] {
        let img = TestImage::random(w, h, depth, color_type);
        let png = img.to_png(false);
        let image = decode(&png, DecoderConfig::default()).unwrap();
        assert_eq!(image.pixels, img.pixels, "color {color_type} depth {depth} size {w}x{h}");
      }
    }
  }
}

#[test]
fn test_byte_at_a_time_matches_all_at_once() {
  let img = TestImage::random(13, 9, 8, 2);
  let png = img.to_png(false);

  let mut whole = Vec::new();
  let mut session = begin_decode(DecoderConfig::default());
  let action = session.feed_with(&png, |row| whole.push((row.y, row.data.to_vec()))).unwrap();
  assert_eq!(action, Action::ImageComplete);

  let mut single = Vec::new();
  let mut slow = begin_decode(DecoderConfig::default());
  for (i, byte) in png.iter().enumerate() {
    let action =
      slow.feed_with(core::slice::from_ref(byte), |row| single.push((row.y, row.data.to_vec())));
    let action = action.unwrap();
    if i + 1 < png.len() {
      assert_ne!(action, Action::ImageComplete, "finished early at {i}");
    } else {
      assert_eq!(action, Action::ImageComplete);
    }
  }
  assert_eq!(whole, single);
  assert_eq!(whole.len(), 9);
  assert_eq!(session.image(), slow.image());
  assert_eq!(slow.finish().unwrap().pixels, img.pixels);
}

#[test]
fn test_random_split_points() {
  let img = TestImage::random(40, 23, 16, 6);
  let png = img.to_png(true);
  let mut session = begin_decode(DecoderConfig::default());
  let mut rest = &png[..];
  while !rest.is_empty() {
    let n = (usize::from(crate::rand_bytes(1)[0]) % 97 + 1).min(rest.len());
    session.feed(&rest[..n]).unwrap();
    rest = &rest[n..];
  }
  assert!(session.is_done());
  assert_eq!(session.finish().unwrap().pixels, img.pixels);
}

#[test]
fn test_many_small_idats() {
  let img = TestImage::random(9, 9, 4, 0);
  let compressed = compress_to_vec_zlib(&img.scanlines(false), 6);
  let mut png = PNG_SIGNATURE.to_vec();
  png.extend(chunk(b"IHDR", &img.ihdr(false)));
  for byte in &compressed {
    png.extend(chunk(b"IDAT", core::slice::from_ref(byte)));
  }
  png.extend(chunk(b"IEND", &[]));
  let image = decode(&png, DecoderConfig::default()).unwrap();
  assert_eq!(image.pixels, img.pixels);
  assert!(image.warnings.is_empty());
}

#[test]
fn test_step_reports_each_row() {
  let img = TestImage::random(5, 6, 8, 4);
  let png = img.to_png(false);
  let mut session = begin_decode(DecoderConfig::default());
  let mut rest = &png[..];
  let mut rows = Vec::new();
  let mut chunks = Vec::new();
  loop {
    let (used, action) = session.step(rest).unwrap();
    rest = &rest[used..];
    match action {
      Action::RowReady(info) => {
        assert_eq!(session.row(), &img.pixels[info.y as usize * 10..][..10]);
        rows.push(info);
      }
      Action::ChunkHandled(ty) => chunks.push(ty),
      Action::ImageComplete => break,
      Action::NeedMoreData => panic!("the whole file was given"),
    }
  }
  assert!(rest.is_empty());
  let ys: Vec<u32> = rows.iter().map(|r| r.y).collect();
  assert_eq!(ys, [0, 1, 2, 3, 4, 5]);
  assert!(rows.iter().all(|r| r.pass.is_none()));
  assert_eq!(chunks, [ChunkType::IHDR, ChunkType::IDAT]);
}

#[test]
fn test_signature_problems() {
  let img = TestImage::random(2, 2, 8, 0);
  let mut png = img.to_png(false);
  png[0] = b'G';
  assert_eq!(decode(&png, DecoderConfig::default()), Err(PngError::NotPng));

  let mut png = img.to_png(false);
  png[4] = b'\n';
  assert_eq!(decode(&png, DecoderConfig::default()), Err(PngError::AsciiConversion));

  // detected as soon as the bad byte arrives
  let mut session = begin_decode(DecoderConfig::default());
  assert_eq!(session.feed(&png[..4]), Ok(Action::NeedMoreData));
  assert_eq!(session.feed(&png[4..5]), Err(PngError::AsciiConversion));
  // and the session stays failed
  assert_eq!(session.feed(&png[5..]), Err(PngError::AsciiConversion));
  assert_eq!(session.error(), Some(PngError::AsciiConversion));
}

#[test]
fn test_chunk_ordering_errors() {
  let img = TestImage::random(3, 3, 8, 2);
  let idat = compress_to_vec_zlib(&img.scanlines(false), 6);

  // no IHDR first
  let mut png = PNG_SIGNATURE.to_vec();
  png.extend(chunk(b"gAMA", &[0, 0, 0xB1, 0x8F]));
  png.extend(chunk(b"IHDR", &img.ihdr(false)));
  assert_eq!(decode(&png, DecoderConfig::default()), Err(PngError::MissingIhdr(ChunkType::gAMA)));

  // IEND without any IDAT
  let mut png = PNG_SIGNATURE.to_vec();
  png.extend(chunk(b"IHDR", &img.ihdr(false)));
  png.extend(chunk(b"IEND", &[]));
  assert_eq!(decode(&png, DecoderConfig::default()), Err(PngError::MissingImageData));

  // two IHDR
  let extra = [chunk(b"IHDR", &img.ihdr(false))];
  let png = png_file(&img.ihdr(false), &extra, &idat);
  assert_eq!(decode(&png, DecoderConfig::default()), Err(PngError::DuplicateIhdr));

  // an unknown critical chunk
  let extra = [chunk(b"ABCD", &[1, 2, 3])];
  let png = png_file(&img.ihdr(false), &extra, &idat);
  assert_eq!(
    decode(&png, DecoderConfig::default()),
    Err(PngError::UnhandledCriticalChunk(ChunkType(*b"ABCD")))
  );

  // indexed image with no palette
  let index = TestImage::random(3, 3, 8, 3);
  let png = png_file(&index.ihdr(false), &[], &compress_to_vec_zlib(&index.scanlines(false), 6));
  assert_eq!(decode(&png, DecoderConfig::default()), Err(PngError::MissingPalette));

  // a bad chunk type tag
  let extra = [chunk(b"gA1A", &[0])];
  let png = png_file(&img.ihdr(false), &extra, &idat);
  assert!(matches!(decode(&png, DecoderConfig::default()), Err(PngError::InvalidChunkType(_))));

  // a bad header field
  let mut header = img.ihdr(false);
  header[8] = 3; // 3 bit depth
  let png = png_file(&header, &[], &idat);
  assert!(matches!(decode(&png, DecoderConfig::default()), Err(PngError::InvalidBitDepth { .. })));
}

#[test]
fn test_misplaced_ancillary_chunks_are_skipped() {
  let img = TestImage::random(3, 3, 8, 2);
  let extra = [
    chunk(b"PLTE", &[1, 2, 3, 4, 5, 6]),
    chunk(b"gAMA", &[0, 0, 0xB1, 0x8F]),
    chunk(b"pHYs", &[0, 0, 0x0B, 0x13, 0, 0, 0x0B, 0x13, 1]),
    chunk(b"pHYs", &[0, 0, 0, 1, 0, 0, 0, 1, 0]),
  ];
  let png = png_file(&img.ihdr(false), &extra, &compress_to_vec_zlib(&img.scanlines(false), 6));
  let image = decode(&png, DecoderConfig::default()).unwrap();
  assert_eq!(image.pixels, img.pixels);
  assert_eq!(image.palette, [[1, 2, 3], [4, 5, 6]]);
  assert_eq!(image.ancillary.gamma, None);
  assert_eq!(image.ancillary.physical.map(|p| p.pixels_per_unit_x), Some(2835));
  assert_eq!(
    image.warnings,
    [
      Warning { chunk_type: Some(ChunkType::gAMA), kind: WarningKind::OutOfPlace },
      Warning { chunk_type: Some(ChunkType::pHYs), kind: WarningKind::Duplicate },
    ]
  );
}

#[test]
fn test_idat_sequence_must_be_contiguous() {
  let img = TestImage::random(4, 4, 8, 0);
  let idat = compress_to_vec_zlib(&img.scanlines(false), 6);
  let mut png = PNG_SIGNATURE.to_vec();
  png.extend(chunk(b"IHDR", &img.ihdr(false)));
  png.extend(chunk(b"IDAT", &idat));
  png.extend(chunk(b"tEXt", b"Note\0between"));
  png.extend(chunk(b"IDAT", &[1, 2, 3, 4]));
  png.extend(chunk(b"IEND", &[]));
  let image = decode(&png, DecoderConfig::default()).unwrap();
  assert_eq!(image.pixels, img.pixels);
  assert!(image.warnings.iter().any(|w| w.kind == WarningKind::TooManyIdats));
  assert_eq!(image.ancillary.text.len(), 1);
}

#[test]
fn test_crc_policies() {
  let img = TestImage::random(3, 2, 8, 0);
  let idat = compress_to_vec_zlib(&img.scanlines(false), 6);

  // critical: an error by default
  let mut png = png_file(&img.ihdr(false), &[], &idat);
  let ihdr_crc_end = 8 + 8 + 13 + 4;
  png[ihdr_crc_end - 1] ^= 1;
  assert!(matches!(
    decode(&png, DecoderConfig::default()),
    Err(PngError::CrcMismatch { chunk_type: ChunkType::IHDR, .. })
  ));
  // but it can be a warning
  let config = DecoderConfig { crc_critical: CrcAction::Warn, ..DecoderConfig::default() };
  let image = decode(&png, config).unwrap();
  assert_eq!(image.pixels, img.pixels);
  assert_eq!(image.warnings.len(), 1);
  // discard acts like warn for a critical chunk
  let config = DecoderConfig { crc_critical: CrcAction::Discard, ..DecoderConfig::default() };
  assert_eq!(decode(&png, config).unwrap().pixels, img.pixels);

  // ancillary: discarded by default
  let mut text = chunk(b"tEXt", b"Title\0Hello");
  *text.last_mut().unwrap() ^= 0x80;
  let png = png_file(&img.ihdr(false), &[text], &idat);
  let image = decode(&png, DecoderConfig::default()).unwrap();
  assert!(image.ancillary.text.is_empty());
  assert!(matches!(image.warnings[0].kind, WarningKind::CrcMismatch { .. }));
  // kept with a warning
  let config = DecoderConfig { crc_ancillary: CrcAction::Warn, ..DecoderConfig::default() };
  let image = decode(&png, config).unwrap();
  assert_eq!(image.ancillary.text[0].text, b"Hello");
  assert_eq!(image.warnings.len(), 1);
  // or fatal
  let config = DecoderConfig { crc_ancillary: CrcAction::Error, ..DecoderConfig::default() };
  assert!(matches!(
    decode(&png, config),
    Err(PngError::CrcMismatch { chunk_type: ChunkType::tEXt, .. })
  ));
}

#[test]
fn test_truncated_image_data() {
  let img = TestImage::random(16, 16, 8, 2);
  let idat = compress_to_vec_zlib(&img.scanlines(false), 6);
  let png = png_file(&img.ihdr(false), &[], &idat[..idat.len() / 2]);
  assert_eq!(decode(&png, DecoderConfig::default()), Err(PngError::NotEnoughImageData));

  // the file just stopping is a different problem
  let png = img.to_png(false);
  assert_eq!(decode(&png[..png.len() - 5], DecoderConfig::default()), Err(PngError::UnexpectedEof));
  let mut session = begin_decode(DecoderConfig::default());
  session.feed(&png[..png.len() / 2]).unwrap();
  assert_eq!(session.finish().unwrap_err(), PngError::UnexpectedEof);
}

#[test]
fn test_corrupt_image_data() {
  let img = TestImage::random(8, 8, 8, 0);
  let mut idat = compress_to_vec_zlib(&img.scanlines(false), 6);
  // break the adler32
  *idat.last_mut().unwrap() ^= 0xFF;
  let png = png_file(&img.ihdr(false), &[], &idat);
  assert!(matches!(decode(&png, DecoderConfig::default()), Err(PngError::Inflate(_))));
  let config = DecoderConfig { ignore_adler32: true, ..DecoderConfig::default() };
  assert_eq!(decode(&png, config).unwrap().pixels, img.pixels);

  // a bad filter type byte
  let mut raw = img.scanlines(false);
  raw[0] = 5;
  let png = png_file(&img.ihdr(false), &[], &compress_to_vec_zlib(&raw, 6));
  assert_eq!(decode(&png, DecoderConfig::default()), Err(PngError::InvalidFilterType(5)));
}

#[test]
fn test_extra_compressed_data() {
  let img = TestImage::random(4, 3, 8, 0);
  let mut idat = compress_to_vec_zlib(&img.scanlines(false), 6);
  idat.extend_from_slice(&[7, 7, 7]);
  let png = png_file(&img.ihdr(false), &[], &idat);
  let image = decode(&png, DecoderConfig::default()).unwrap();
  assert_eq!(image.pixels, img.pixels);
  assert_eq!(
    image.warnings,
    [Warning { chunk_type: Some(ChunkType::IDAT), kind: WarningKind::ExtraCompressedData }]
  );
}

#[test]
fn test_trailing_data() {
  let img = TestImage::random(2, 2, 8, 0);
  let mut png = img.to_png(false);
  png.extend_from_slice(b"junk");
  let image = decode(&png, DecoderConfig::default()).unwrap();
  assert_eq!(image.warnings, [Warning { chunk_type: None, kind: WarningKind::TrailingData(4) }]);

  let config = DecoderConfig { benign_errors_fatal: true, ..DecoderConfig::default() };
  assert_eq!(
    decode(&png, config),
    Err(PngError::Benign(Warning { chunk_type: None, kind: WarningKind::TrailingData(4) }))
  );
}

#[test]
fn test_fatal_trailing_data_sticks() {
  let img = TestImage::random(2, 2, 8, 0);
  let mut png = img.to_png(false);
  png.extend_from_slice(b"junk");
  let config = DecoderConfig { benign_errors_fatal: true, ..DecoderConfig::default() };
  let expected =
    PngError::Benign(Warning { chunk_type: None, kind: WarningKind::TrailingData(4) });

  let mut session = begin_decode(config);
  assert_eq!(session.feed(&png), Err(expected));
  assert_eq!(session.error(), Some(expected));
  assert!(!session.is_done());
  assert_eq!(session.feed(&[]), Err(expected));
  assert_eq!(session.finish().unwrap_err(), expected);

  // the pull reader sees the same thing
  let mut reader = RowReader::new(&png[..], config);
  assert!(matches!(reader.next_row(), Ok(PullRow::Row(_))));
  assert!(matches!(reader.next_row(), Ok(PullRow::Row(_))));
  assert_eq!(reader.next_row(), Err(expected));
  assert_eq!(reader.next_row(), Err(expected));
  assert_eq!(reader.session().error(), Some(expected));
}

#[test]
fn test_flipped_data_bits_fail_the_crc() {
  let img = TestImage::random(1, 1, 8, 0);
  let idat = compress_to_vec_zlib(&img.scanlines(false), 6);
  let png = png_file(&img.ihdr(false), &[], &idat);
  let ihdr_data = 8 + 8;
  let idat_data = 8 + 25 + 8;
  for (at, ty) in [(ihdr_data, ChunkType::IHDR), (idat_data, ChunkType::IDAT)] {
    for bit in [0x01, 0x10, 0x80] {
      let mut bad = png.clone();
      bad[at] ^= bit;
      let result = decode(&bad, DecoderConfig::default());
      assert!(
        matches!(result, Err(PngError::CrcMismatch { chunk_type, .. }) if chunk_type == ty),
        "{ty} bit {bit:#X}: {result:?}"
      );
      // one byte at a time gives the same error
      let mut session = begin_decode(DecoderConfig::default());
      let first_err = bad.iter().find_map(|b| session.feed(core::slice::from_ref(b)).err());
      assert_eq!(first_err, result.err());
    }
  }

  // with critical CRC errors only a warning, the data problem shows up
  let mut bad = png.clone();
  bad[idat_data] ^= 0x01;
  let config = DecoderConfig { crc_critical: CrcAction::Warn, ..DecoderConfig::default() };
  assert!(matches!(decode(&bad, config), Err(PngError::Inflate(_))));

  // ancillary data: the chunk is dropped with a warning
  let text = chunk(b"tEXt", b"Title\0Hello");
  let mut bad_text = text.clone();
  bad_text[8 + 2] ^= 0x20;
  let png = png_file(&img.ihdr(false), &[bad_text], &idat);
  let image = decode(&png, DecoderConfig::default()).unwrap();
  assert!(image.ancillary.text.is_empty());
  assert_eq!(image.warnings.len(), 1);
  assert_eq!(image.warnings[0].chunk_type, Some(ChunkType::tEXt));
  assert!(matches!(image.warnings[0].kind, WarningKind::CrcMismatch { .. }));
  assert_eq!(image.pixels, img.pixels);
}

#[test]
fn test_iend_with_data() {
  let img = TestImage::random(2, 2, 8, 0);
  let mut png = PNG_SIGNATURE.to_vec();
  png.extend(chunk(b"IHDR", &img.ihdr(false)));
  png.extend(chunk(b"IDAT", &compress_to_vec_zlib(&img.scanlines(false), 6)));
  png.extend(chunk(b"IEND", &[1, 2]));
  let image = decode(&png, DecoderConfig::default()).unwrap();
  assert_eq!(image.warnings[0].kind, WarningKind::IendNotEmpty(2));
}

#[test]
fn test_dimension_limits() {
  let img = TestImage::random(20, 2, 8, 0);
  let config = DecoderConfig { max_width: 16, ..DecoderConfig::default() };
  assert_eq!(
    decode(&img.to_png(false), config),
    Err(PngError::DimensionsExceedLimits { width: 20, height: 2 })
  );
  let mut header = img.ihdr(false);
  header[..4].copy_from_slice(&0_u32.to_be_bytes());
  let png = png_file(&header, &[], &[]);
  assert_eq!(
    decode(&png, DecoderConfig::default()),
    Err(PngError::InvalidDimensions { width: 0, height: 2 })
  );
}

#[test]
fn test_interlaced_matches_plain() {
  for (color_type, depth) in [(0, 1), (0, 2), (3, 4), (0, 8), (2, 8), (4, 16), (6, 16)] {
    for (w, h) in [(1, 1), (2, 3), (5, 5), (8, 8), (11, 9), (33, 17)] {
      let img = TestImage::random(w, h, depth, color_type);
      let png = img.to_png(true);
      for display in [InterlaceDisplay::Block, InterlaceDisplay::Sparkle] {
        let config = DecoderConfig { interlace_display: display, ..DecoderConfig::default() };
        let mut session = begin_decode(config);
        let mut passes = Vec::new();
        session
          .feed_with(&png, |row| {
            assert!(row.pass.is_some());
            passes.push(row.pass);
          })
          .unwrap();
        assert!(passes.windows(2).all(|p| p[0] <= p[1]));
        let image = session.finish().unwrap();
        assert!(image.header.is_interlaced());
        assert_eq!(image.pixels, img.pixels, "{color_type}/{depth} {w}x{h} {display:?}");
      }
    }
  }
}

#[test]
fn test_block_display_fills_early() {
  // after only the first pass, block mode has already covered the whole
  // first row of each 8x8 block
  let img = TestImage::random(16, 1, 8, 0);
  let png = img.to_png(true);
  let mut session = begin_decode(DecoderConfig::default());
  let mut first_pass_row = None;
  session
    .feed_with(&png, |row| {
      if row.pass == Some(0) {
        first_pass_row = Some(row.data.to_vec());
      }
    })
    .unwrap();
  let row = first_pass_row.unwrap();
  assert!(row[..4].iter().all(|&p| p == img.pixels[0]));
  assert!(row[8..12].iter().all(|&p| p == img.pixels[8]));
}

#[test]
fn test_interlace_handling_off_gives_pass_rows() {
  let img = TestImage::random(11, 9, 8, 2);
  let config = DecoderConfig { enable_interlace: false, ..DecoderConfig::default() };
  let mut session = begin_decode(config);
  let mut rows = Vec::new();
  session
    .feed_with(&img.to_png(true), |row| rows.push((row.pass.unwrap(), row.y, row.data.to_vec())))
    .unwrap();
  assert!(session.image().is_none());

  let mut expected = Vec::new();
  for pass in 0..PASS_COUNT {
    let (pw, ph) = pass_dimensions(pass, 11, 9);
    if pw == 0 || ph == 0 {
      continue;
    }
    for py in 0..ph {
      let (_, y) = pass_pos_to_full(pass, 0, py);
      expected.push((pass, y, img.pass_row(pass, py)));
    }
  }
  assert_eq!(rows, expected);
}

#[test]
fn test_no_kept_image() {
  let img = TestImage::random(6, 4, 8, 0);
  let config = DecoderConfig { keep_image: false, ..DecoderConfig::default() };
  let mut rows = Vec::new();
  let mut session = begin_decode(config);
  session.feed_with(&img.to_png(false), |row| rows.extend_from_slice(row.data)).unwrap();
  assert_eq!(rows, img.pixels);
  assert!(session.image().is_none());
  assert!(session.finish().unwrap().pixels.is_empty());
}

#[test]
fn test_palette_and_transparency() {
  let img = TestImage::random(7, 3, 2, 3);
  let extra = [
    chunk(b"PLTE", &[0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255]),
    chunk(b"tRNS", &[0, 128]),
    chunk(b"bKGD", &[2]),
    chunk(b"hIST", &[0, 1, 0, 2, 0, 3, 0, 4]),
  ];
  let png = png_file(&img.ihdr(false), &extra, &compress_to_vec_zlib(&img.scanlines(false), 6));
  let image = decode(&png, DecoderConfig::default()).unwrap();
  assert_eq!(image.pixels, img.pixels);
  assert_eq!(image.palette.len(), 4);
  assert_eq!(image.palette[1], [255, 0, 0]);
  assert_eq!(image.transparency, Some(Transparency::Index(vec![0, 128])));
  assert_eq!(image.ancillary.background, Some(Background::Index(2)));
  assert_eq!(image.ancillary.histogram, Some(vec![1, 2, 3, 4]));
  assert!(image.warnings.is_empty());

  // too many entries for the bit depth get cut off
  let big: Vec<u8> = (0..18).collect();
  let idat = compress_to_vec_zlib(&img.scanlines(false), 6);
  let png = png_file(&img.ihdr(false), &[chunk(b"PLTE", &big)], &idat);
  let image = decode(&png, DecoderConfig::default()).unwrap();
  assert_eq!(image.palette.len(), 4);
  assert_eq!(image.warnings[0].kind, WarningKind::PaletteTruncated { entries: 6, max: 4 });

  // a bad palette length is fatal for indexed images
  let png = png_file(&img.ihdr(false), &[chunk(b"PLTE", &[1, 2, 3, 4])], &[]);
  assert_eq!(decode(&png, DecoderConfig::default()), Err(PngError::InvalidPalette(4)));
}

#[test]
fn test_color_key_transparency() {
  let img = TestImage::random(2, 2, 16, 2);
  let extra = [chunk(b"tRNS", &[0, 1, 0, 2, 0, 3])];
  let png = png_file(&img.ihdr(false), &extra, &compress_to_vec_zlib(&img.scanlines(false), 6));
  let image = decode(&png, DecoderConfig::default()).unwrap();
  assert_eq!(image.transparency, Some(Transparency::RGB([1, 2, 3])));
}

#[test]
fn test_color_information() {
  let img = TestImage::random(2, 2, 8, 6);
  let profile = crate::rand_bytes(300);
  let mut iccp = b"Some Profile\0\0".to_vec();
  iccp.extend(compress_to_vec_zlib(&profile, 6));
  let extra = [
    chunk(b"gAMA", &[0, 0, 0xB1, 0x8F]),
    chunk(b"sRGB", &[0]),
    chunk(b"iCCP", &iccp),
    chunk(b"sBIT", &[8, 8, 8, 1]),
    chunk(b"tIME", &[0x07, 0xE9, 6, 30, 12, 0, 0]),
  ];
  let png = png_file(&img.ihdr(false), &extra, &compress_to_vec_zlib(&img.scanlines(false), 6));
  let image = decode(&png, DecoderConfig::default()).unwrap();
  let info = &image.ancillary;
  assert_eq!(info.gamma, Some(45455));
  assert_eq!(info.srgb, Some(pngpush::SrgbIntent::Perceptual));
  let icc = info.icc_profile.as_ref().unwrap();
  assert_eq!(icc.name, b"Some Profile");
  assert_eq!(icc.profile, profile);
  assert_eq!(info.significant_bits, Some(vec![8, 8, 8, 1]));
  assert_eq!(info.modified.map(|t| t.year), Some(2025));
  assert!(image.warnings.is_empty());

  // turned off, they're all skipped
  let config = DecoderConfig { enable_gamma: false, ..DecoderConfig::default() };
  let image = decode(&png, config).unwrap();
  assert_eq!(image.ancillary.gamma, None);
  assert_eq!(image.ancillary.icc_profile, None);
  assert_eq!(image.ancillary.modified.map(|t| t.month), Some(6));
}

#[test]
fn test_text_chunks() {
  let img = TestImage::random(2, 2, 8, 0);
  let mut ztxt = b"Comment\0\0".to_vec();
  ztxt.extend(compress_to_vec_zlib(b"squeezed words", 6));
  let mut itxt = b"Author\0\x01\0fr\0Auteur\0".to_vec();
  itxt.extend(compress_to_vec_zlib("Éloïse".as_bytes(), 6));
  let extra = [chunk(b"tEXt", b"Title\0Hello"), chunk(b"zTXt", &ztxt)];
  let mut png = PNG_SIGNATURE.to_vec();
  png.extend(chunk(b"IHDR", &img.ihdr(false)));
  for c in &extra {
    png.extend_from_slice(c);
  }
  png.extend(chunk(b"IDAT", &compress_to_vec_zlib(&img.scanlines(false), 6)));
  // text can come after the image data too
  png.extend(chunk(b"iTXt", &itxt));
  png.extend(chunk(b"IEND", &[]));

  let image = decode(&png, DecoderConfig::default()).unwrap();
  let text = &image.ancillary.text;
  assert_eq!(text.len(), 3);
  assert_eq!(text[0].keyword_string(), "Title");
  assert_eq!(text[0].text_string(), "Hello");
  assert_eq!(text[1].chunk_type, ChunkType::zTXt);
  assert_eq!(text[1].text, b"squeezed words");
  assert_eq!(text[2].language, b"fr");
  assert_eq!(text[2].translated_keyword, b"Auteur");
  assert_eq!(text[2].text_string(), "Éloïse");
  assert!(image.warnings.is_empty());

  let config = DecoderConfig { keep_text: false, ..DecoderConfig::default() };
  assert!(decode(&png, config).unwrap().ancillary.text.is_empty());
}

#[test]
fn test_bad_compressed_text() {
  let img = TestImage::random(2, 2, 8, 0);
  let compressed = compress_to_vec_zlib(&crate::rand_bytes(500), 6);
  let mut ztxt = b"Cut\0\0".to_vec();
  ztxt.extend_from_slice(&compressed[..compressed.len() / 2]);
  let mut big = b"Big\0\0".to_vec();
  big.extend(compress_to_vec_zlib(&[b'a'; 5000], 6));
  let extra = [chunk(b"zTXt", &ztxt), chunk(b"zTXt", &big), chunk(b"tEXt", b"\0empty keyword")];
  let png = png_file(&img.ihdr(false), &extra, &compress_to_vec_zlib(&img.scanlines(false), 6));
  let config = DecoderConfig { max_inflated_len: 1000, ..DecoderConfig::default() };
  let image = decode(&png, config).unwrap();
  // the image itself is still fine
  assert_eq!(image.pixels, img.pixels);
  assert!(image.ancillary.text.is_empty());
  let kinds: Vec<WarningKind> = image.warnings.iter().map(|w| w.kind).collect();
  assert_eq!(
    kinds,
    [
      WarningKind::TruncatedCompressedData,
      WarningKind::DecompressedTooLarge(1000),
      WarningKind::BadKeyword,
    ]
  );
}

#[test]
fn test_unknown_chunks() {
  let img = TestImage::random(2, 2, 8, 0);
  let extra = [chunk(b"prVt", &[9, 8, 7])];
  let png = png_file(&img.ihdr(false), &extra, &compress_to_vec_zlib(&img.scanlines(false), 6));
  let image = decode(&png, DecoderConfig::default()).unwrap();
  assert!(image.ancillary.unknown.is_empty());
  let config = DecoderConfig { keep_unknown_chunks: true, ..DecoderConfig::default() };
  let image = decode(&png, config).unwrap();
  assert_eq!(
    image.ancillary.unknown,
    [UnknownChunk { chunk_type: ChunkType(*b"prVt"), data: vec![9, 8, 7] }]
  );
}

#[test]
fn test_row_reader() {
  let img = TestImage::random(19, 11, 8, 2);
  let png = img.to_png(false);
  let mut reader = RowReader::with_buffer_size(&png[..], DecoderConfig::default(), 7);
  let mut rows = Vec::new();
  loop {
    match reader.next_row().unwrap() {
      PullRow::Row(row) => rows.push((row.y, row.data.to_vec())),
      PullRow::Done => break,
    }
  }
  // asking again is fine
  assert_eq!(reader.next_row(), Ok(PullRow::Done));
  assert_eq!(rows.len(), 11);
  let flat: Vec<u8> = rows.into_iter().flat_map(|(_, data)| data).collect();
  assert_eq!(flat, img.pixels);
  let (session, rest) = reader.into_parts();
  assert!(rest.is_empty());
  assert_eq!(session.finish().unwrap().pixels, img.pixels);
}

#[test]
fn test_row_reader_from_io() {
  let img = TestImage::random(9, 9, 1, 0);
  let png = img.to_png(true);
  let reader =
    RowReader::new(IoSource(std::io::Cursor::new(png.clone())), DecoderConfig::default());
  let session = reader.read_to_end().unwrap();
  assert_eq!(session.image(), Some(&img.pixels[..]));

  let reader = RowReader::new(&png[..png.len() - 20], DecoderConfig::default());
  assert_eq!(reader.read_to_end().unwrap_err(), PngError::UnexpectedEof);
}

#[test]
fn test_random_data_never_panics() {
  for _ in 0..20 {
    let v = crate::rand_bytes(1024);
    let _ = decode(&v, DecoderConfig::default());
  }
  // valid start, junk after
  for _ in 0..20 {
    let mut v = PNG_SIGNATURE.to_vec();
    v.extend(chunk(b"IHDR", &ihdr(16, 16, 8, 2, 1)));
    v.extend(chunk(b"IDAT", &crate::rand_bytes(300)));
    v.extend(crate::rand_bytes(100));
    assert!(decode(&v, DecoderConfig::default()).is_err());
  }
}
