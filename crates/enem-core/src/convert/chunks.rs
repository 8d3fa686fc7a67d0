//! Row-chunked CSV reading and per-column accumulation.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use super::ConvertError;
use crate::dataset::{ColumnBuilder, Table};
use crate::sniff::decode_latin1;

/// Counts lines in `path` (a trailing line without a newline counts).
pub fn count_lines(path: &Path) -> io::Result<u64> {
    let mut reader = BufReader::with_capacity(1 << 16, File::open(path)?);
    let mut buf = vec![0u8; 1 << 16];
    let mut lines = 0u64;
    let mut last = b'\n';
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        lines += buf[..n].iter().filter(|&&b| b == b'\n').count() as u64;
        last = buf[n - 1];
    }
    if last != b'\n' {
        lines += 1;
    }
    Ok(lines)
}

/// Decoded rows of one chunk; `None` marks an empty cell.
pub type Chunk = Vec<Vec<Option<String>>>;

pub struct ChunkReader {
    reader: csv::Reader<File>,
    record: csv::ByteRecord,
}

impl ChunkReader {
    pub fn open(path: &Path, delimiter: u8) -> Result<Self, ConvertError> {
        let reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        Ok(Self {
            reader,
            record: csv::ByteRecord::new(),
        })
    }

    /// Reads the first record as column names.
    pub fn read_header(&mut self) -> Result<Option<Vec<String>>, ConvertError> {
        if !self.reader.read_byte_record(&mut self.record)? {
            return Ok(None);
        }
        Ok(Some(
            self.record
                .iter()
                .map(|f| decode_latin1(f).trim().to_string())
                .collect(),
        ))
    }

    /// Up to `max_rows` rows; an empty chunk means end of input.
    pub fn next_chunk(&mut self, max_rows: usize) -> Result<Chunk, ConvertError> {
        let mut rows = Vec::with_capacity(max_rows.min(1 << 16));
        while rows.len() < max_rows {
            if !self.reader.read_byte_record(&mut self.record)? {
                break;
            }
            rows.push(
                self.record
                    .iter()
                    .map(|f| {
                        if f.is_empty() {
                            None
                        } else {
                            Some(decode_latin1(f))
                        }
                    })
                    .collect(),
            );
        }
        Ok(rows)
    }
}

/// Per-column typed buffers grown chunk by chunk. Each chunk's text is
/// dropped as soon as its cells are parsed.
#[derive(Debug, Default)]
pub struct Accumulator {
    columns: Vec<ColumnBuilder>,
    rows: usize,
}

impl Accumulator {
    pub fn with_header(names: Vec<String>) -> Self {
        Self {
            columns: names.into_iter().map(ColumnBuilder::new).collect(),
            rows: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Appends a chunk. Without a header the first row fixes the width and the
    /// columns are named `column_<i>`. `first_line` is the line of the first row.
    pub fn push_chunk(&mut self, chunk: Chunk, first_line: u64) -> Result<(), ConvertError> {
        for (i, row) in chunk.into_iter().enumerate() {
            if self.columns.is_empty() && self.rows == 0 {
                self.columns = (0..row.len())
                    .map(|c| ColumnBuilder::new(format!("column_{c}")))
                    .collect();
            }
            let expected = self.columns.len();
            if row.len() > expected {
                return Err(ConvertError::Malformed {
                    line: first_line + i as u64,
                    found: row.len(),
                    expected,
                });
            }
            let found = row.len();
            for (col, cell) in self.columns.iter_mut().zip(row) {
                col.push(cell);
            }
            for col in &mut self.columns[found..] {
                col.push(None);
            }
            self.rows += 1;
        }
        Ok(())
    }

    pub fn into_table(self) -> Result<Table, ConvertError> {
        let columns = self.columns.into_iter().map(ColumnBuilder::finish).collect();
        Ok(Table::new(columns)?)
    }
}
