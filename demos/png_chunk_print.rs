use pngpush::png::{begin_decode, Action, DecoderConfig};

/// How many bytes get pushed into the decoder at once.
const PIECE: usize = 1024;

fn main() {
  let args: Vec<String> = std::env::args().collect();
  println!("ARGS: {args:?}");
  for file_arg in args[1..].iter() {
    let path = std::path::Path::new(file_arg);
    print!("Reading `{}`... ", path.display());
    let bytes = match std::fs::read(path) {
      Ok(bytes) => {
        println!("got {} bytes.", bytes.len());
        bytes
      }
      Err(e) => {
        println!("{e:?}");
        continue;
      }
    };
    let mut session = begin_decode(DecoderConfig::default());
    let mut rows = 0_usize;
    for (n, piece) in bytes.chunks(PIECE).enumerate() {
      match session.feed_with(piece, |_| rows += 1) {
        Ok(Action::ChunkHandled(ty)) => println!("{n}: {ty} done, {rows} rows so far"),
        Ok(Action::ImageComplete) => {
          println!("{n}: image complete");
          break;
        }
        Ok(_) => (),
        Err(e) => {
          println!("{n}: {e}");
          break;
        }
      }
    }
    if let Some(header) = session.header() {
      println!("{header:?}");
    }
    for text in &session.ancillary().text {
      println!("{}: {}", text.keyword_string(), text.text_string());
    }
    for warning in session.warnings() {
      println!("warning: {warning}");
    }
    println!("{rows} rows decoded.");
  }
}
