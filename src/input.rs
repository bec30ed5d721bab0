use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use flate2::bufread::MultiGzDecoder;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Opens the input, `-` means stdin.
pub fn open(path: &Path) -> io::Result<Box<dyn Read>> {
    if path == Path::new("-") {
        return detect(io::stdin().lock());
    }

    let file = File::open(path)?;
    detect(BufReader::new(file))
}

/// Wraps the reader with a gzip decoder if the data starts with the gzip
/// magic, otherwise bytes are handed out as they are.
pub fn detect<R: BufRead + 'static>(mut reader: R) -> io::Result<Box<dyn Read>> {
    let compressed = reader.fill_buf()?.starts_with(&GZIP_MAGIC);

    if compressed {
        Ok(Box::new(MultiGzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}
