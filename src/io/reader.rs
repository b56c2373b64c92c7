//! Line-oriented JSON reader.
use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Read};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use serde::de::DeserializeOwned;

use crate::error::Error;

/// Reads one JSON document per line, skipping empty lines.
///
/// Iterates over `Result<T, Error>`; a malformed line yields an error
/// carrying the path and line number, and callers are expected to abort the
/// stream on it (malformed stage files mean schema drift, not noise).
pub struct JsonlReader<T> {
    lines: Lines<BufReader<Box<dyn Read + Send>>>,
    path: PathBuf,
    line_number: usize,
    _phantom: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        let raw: Box<dyn Read + Send> = if path.extension().map_or(false, |e| e == "gz") {
            Box::new(MultiGzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(Self {
            lines: BufReader::new(raw).lines(),
            path: path.to_path_buf(),
            line_number: 0,
            _phantom: PhantomData,
        })
    }
}

impl<T: DeserializeOwned> Iterator for JsonlReader<T> {
    type Item = Result<T, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line_number += 1;
            match self.lines.next()? {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    return Some(serde_json::from_str::<T>(&line).map_err(|e| {
                        Error::Custom(format!(
                            "{}:{}: malformed input line: {}",
                            self.path.display(),
                            self.line_number,
                            e
                        ))
                    }));
                }
                Err(e) => return Some(Err(Error::Io(e))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::Value;

    use super::*;

    #[test]
    fn test_reads_lines_and_skips_blanks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id":"a"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"id":"b"}}"#).unwrap();

        let reader: JsonlReader<Value> = JsonlReader::from_path(file.path()).unwrap();
        let values: Result<Vec<Value>, Error> = reader.collect();
        assert_eq!(values.unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id":"a"}}"#).unwrap();
        writeln!(file, "{{not json").unwrap();

        let mut reader: JsonlReader<Value> = JsonlReader::from_path(file.path()).unwrap();
        assert!(reader.next().unwrap().is_ok());
        let err = reader.next().unwrap().unwrap_err();
        match err {
            Error::Custom(msg) => assert!(msg.contains(":2:")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
