//! Opening static artifacts with transparent decompression.
//!
//! The compression codec is picked from the file extension: `.xz` uses xz2,
//! `.zst`/`.zstd` uses zstd, anything else is read as plain bytes.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use xz2::read::XzDecoder;

use crate::error::CorpusError;

/// Compression codec of an on-disk artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Xz,
    Zstd,
}

impl Compression {
    /// Infer the codec from a path's extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("xz") => Compression::Xz,
            Some("zst") | Some("zstd") => Compression::Zstd,
            _ => Compression::None,
        }
    }
}

/// Open `path` for buffered reading, decompressing on the fly.
pub fn open_artifact(path: &Path) -> Result<Box<dyn BufRead + Send>, CorpusError> {
    let file = File::open(path).map_err(|e| CorpusError::io(path, e))?;
    let reader: Box<dyn BufRead + Send> = match Compression::from_path(path) {
        Compression::None => Box::new(BufReader::new(file)),
        Compression::Xz => Box::new(BufReader::new(XzDecoder::new(file))),
        Compression::Zstd => {
            let decoder = zstd::stream::read::Decoder::new(file).map_err(|e| CorpusError::io(path, e))?;
            Box::new(BufReader::new(decoder))
        }
    };
    Ok(reader)
}
