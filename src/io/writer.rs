//! Line-oriented JSON writer.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;

use crate::error::Error;

/// Writes one JSON document per line, gzip-compressing when the destination
/// path ends in `.gz`.
pub struct JsonlWriter {
    inner: Box<dyn Write + Send>,
}

impl JsonlWriter {
    pub fn to_path(path: &Path) -> Result<Self, Error> {
        let file = File::create(path)?;
        let inner: Box<dyn Write + Send> = if path.extension().map_or(false, |e| e == "gz") {
            Box::new(GzEncoder::new(file, Compression::default()))
        } else {
            Box::new(BufWriter::new(file))
        };
        Ok(Self { inner })
    }

    pub fn write<T: Serialize>(&mut self, value: &T) -> Result<(), Error> {
        serde_json::to_writer(&mut self.inner, value)?;
        self.inner.write_all(b"\n")?;
        Ok(())
    }

    /// Flush buffers and finish the gzip stream if there is one.
    pub fn finish(mut self) -> Result<(), Error> {
        self.inner.flush()?;
        Ok(())
    }
}
