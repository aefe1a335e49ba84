use std::fs::File;
use std::io::{BufReader, Read};

use camino::Utf8Path;
use flate2::read::MultiGzDecoder;

use crate::error::HarmonizeError;

/// Open a count file for reading, decompressing `.gz` files on the fly.
pub fn open_count_file(path: &Utf8Path) -> Result<Box<dyn Read>, HarmonizeError> {
    let file = File::open(path.as_std_path()).map_err(|err| HarmonizeError::CountFileRead {
        path: path.to_string(),
        message: err.to_string(),
    })?;
    let reader = BufReader::new(file);
    let is_gzip = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);
    if is_gzip {
        Ok(Box::new(MultiGzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}
