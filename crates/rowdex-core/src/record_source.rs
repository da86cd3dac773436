use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::RawRecord;

/// Lazily yields one [`RawRecord`] per CSV data row, in file order.
///
/// Field names come from the header row. Rows shorter than the header are
/// padded with empty values.
pub struct CsvRecordSource<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    row: csv::StringRecord,
}

impl CsvRecordSource<File> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::Source(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "opened csv source");
        Self::from_reader(file)
    }
}

impl<R: Read> CsvRecordSource<R> {
    pub fn from_reader(rdr: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
        let headers = reader
            .headers()
            .map_err(|e| Error::Source(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();
        Ok(Self { reader, headers, row: csv::StringRecord::new() })
    }

    pub fn headers(&self) -> &[String] { &self.headers }
}

impl<R: Read> Iterator for CsvRecordSource<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.row) {
            Ok(false) => None,
            Ok(true) => {
                let fields = self
                    .headers
                    .iter()
                    .enumerate()
                    .map(|(i, name)| (name.clone(), self.row.get(i).unwrap_or("").to_string()))
                    .collect();
                Some(Ok(RawRecord::new(fields)))
            }
            Err(e) => Some(Err(Error::Source(e.to_string()))),
        }
    }
}

/// A file is returned as-is; a directory is walked for `*.csv` files, sorted.
pub fn list_csv_files(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    let mut csv_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| p.extension().and_then(|s| s.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case("csv")))
        .collect();
    csv_files.sort();
    csv_files
}
