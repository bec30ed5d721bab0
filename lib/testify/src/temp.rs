use std::io::Write;
use std::path::PathBuf;

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::random_string;

pub fn temp_file() -> PathBuf {
    let path = std::env::temp_dir();
    let file_name = random_string(16);
    path.join(file_name)
}

/// Writes `data` to a new temp file and returns its path.
pub fn write_temp_file(data: &[u8]) -> PathBuf {
    let path = temp_file();
    std::fs::write(&path, data).expect("write temp file");
    path
}

/// Gzip compresses `data` into a single member.
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("compress");
    encoder.finish().expect("finish gzip member")
}
