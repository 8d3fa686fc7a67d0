//! Chunked CSV → Parquet conversion with engine fallback and read-back check.
//!
//! The source is streamed in fixed-size row chunks (cancellation is checked
//! between chunks), typed per column as each chunk arrives, and written to
//! `<dest>.part` through the codec chain. The part file is reopened and its
//! shape compared with what was written before it is renamed over `dest`.
//! Anything short of that leaves no file at `dest`.

mod chunks;
pub mod codec;
mod error;

pub use chunks::{count_lines, Accumulator, Chunk, ChunkReader};
pub use error::ConvertError;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::control::CancelToken;
use crate::layout;
use crate::sniff::Sniffed;
use codec::{read_with_fallback, remove_if_exists, write_with_fallback, ColumnarCodec};

/// Progress is logged every this many chunks.
const LOG_EVERY_CHUNKS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub chunk_rows: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self { chunk_rows: 50_000 }
    }
}

/// What ended up on disk.
#[derive(Debug, Clone)]
pub struct ConvertReport {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
    pub codec: &'static str,
    pub elapsed: Duration,
}

/// Converts `source` into a Parquet file at `dest` using the default codecs.
pub fn convert(
    source: &Path,
    format: &Sniffed,
    dest: &Path,
    opts: &ConvertOptions,
    cancel: &CancelToken,
) -> Result<ConvertReport, ConvertError> {
    convert_with(&codec::default_codecs(), source, format, dest, opts, cancel)
}

pub fn convert_with(
    codecs: &[Box<dyn ColumnarCodec>],
    source: &Path,
    format: &Sniffed,
    dest: &Path,
    opts: &ConvertOptions,
    cancel: &CancelToken,
) -> Result<ConvertReport, ConvertError> {
    let started = Instant::now();
    if format.ambiguous {
        tracing::warn!(
            source = %source.display(),
            delimiter = %char::from(format.delimiter),
            has_header = format.has_header,
            "format sniffing was inconclusive, using fallback settings"
        );
    }

    let part = layout::temp_path(dest);
    remove_if_exists(&part);
    remove_if_exists(dest);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let total_lines = count_lines(source)?;
    let data_lines = total_lines.saturating_sub(u64::from(format.has_header));
    tracing::info!(source = %source.display(), lines = data_lines, "converting");

    let chunk_rows = opts.chunk_rows.max(1);
    let mut reader = ChunkReader::open(source, format.delimiter)?;
    let mut acc = if format.has_header {
        match reader.read_header()? {
            Some(names) => Accumulator::with_header(names),
            None => Accumulator::default(),
        }
    } else {
        Accumulator::default()
    };
    let header_lines = u64::from(format.has_header);

    let mut chunks = 0u64;
    loop {
        cancel.check().map_err(|_| ConvertError::Cancelled)?;
        let chunk = reader.next_chunk(chunk_rows)?;
        if chunk.is_empty() {
            break;
        }
        let first_line = header_lines + acc.rows() as u64 + 1;
        acc.push_chunk(chunk, first_line)?;
        chunks += 1;
        if chunks % LOG_EVERY_CHUNKS == 0 {
            let pct = if data_lines > 0 {
                acc.rows() as f64 * 100.0 / data_lines as f64
            } else {
                0.0
            };
            tracing::info!(rows = acc.rows(), total = data_lines, pct = %format!("{pct:.1}"), "conversion progress");
        }
    }

    let table = acc.into_table()?;
    let (rows, columns) = (table.num_rows(), table.num_columns());
    if rows == 0 || columns == 0 {
        return Err(ConvertError::VerificationFailed(format!(
            "source has {rows} data rows and {columns} columns"
        )));
    }

    let used = write_with_fallback(codecs, &table, &part)
        .map_err(|attempts| ConvertError::WriteFailed { attempts })?;
    drop(table);

    if let Err(e) = verify(codecs, &part, rows, columns) {
        remove_if_exists(&part);
        return Err(e);
    }
    fs::rename(&part, dest)?;

    let elapsed = started.elapsed();
    tracing::info!(
        dest = %dest.display(),
        rows,
        columns,
        codec = used,
        secs = elapsed.as_secs_f64(),
        "conversion finished"
    );
    Ok(ConvertReport {
        path: dest.to_path_buf(),
        rows,
        columns,
        codec: used,
        elapsed,
    })
}

fn verify(
    codecs: &[Box<dyn ColumnarCodec>],
    path: &Path,
    rows: usize,
    columns: usize,
) -> Result<(), ConvertError> {
    let (table, reader) = read_with_fallback(codecs, path)
        .map_err(|e| ConvertError::VerificationFailed(format!("{e:#}")))?;
    let (got_rows, got_cols) = (table.num_rows(), table.num_columns());
    if got_rows == 0 || got_cols == 0 || got_rows != rows || got_cols != columns {
        return Err(ConvertError::VerificationFailed(format!(
            "wrote {rows}x{columns}, read back {got_rows}x{got_cols} via {reader}"
        )));
    }
    tracing::debug!(path = %path.display(), codec = reader, "read-back verified");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ColumnValues, Table};
    use anyhow::anyhow;

    fn sniffed(delimiter: u8, has_header: bool) -> Sniffed {
        Sniffed {
            delimiter,
            has_header,
            ambiguous: false,
        }
    }

    fn small_opts() -> ConvertOptions {
        ConvertOptions { chunk_rows: 2 }
    }

    #[test]
    fn converts_latin1_semicolon_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.csv");
        fs::write(
            &src,
            b"NU_INSCRICAO;SG_UF_PROVA;NU_NOTA_MT\n1;PB;500.5\n2;SP;\n3;S\xe3o;612\n4;PB;700\n5;RJ;1\n",
        )
        .unwrap();
        let dest = dir.path().join("out").join("microdados_enem_2020.parquet");

        let report = convert(&src, &sniffed(b';', true), &dest, &small_opts(), &CancelToken::new()).unwrap();
        assert_eq!((report.rows, report.columns), (5, 3));
        assert_eq!(report.codec, "arrow-parquet");
        assert!(dest.exists());
        assert!(!layout::temp_path(&dest).exists());

        let (table, _) = read_with_fallback(&codec::default_codecs(), &dest).unwrap();
        assert_eq!(table.num_rows(), 5);
        assert_eq!(
            table.column("NU_NOTA_MT").unwrap().values,
            ColumnValues::Float64(vec![Some(500.5), None, Some(612.0), Some(700.0), Some(1.0)])
        );
        assert_eq!(table.column("SG_UF_PROVA").unwrap().values.get_text(2).as_deref(), Some("São"));
    }

    #[test]
    fn headerless_file_keeps_first_row() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.csv");
        fs::write(&src, "1,2\n3,4\n5,6\n").unwrap();
        let dest = dir.path().join("out.parquet");
        let report = convert(&src, &sniffed(b',', false), &dest, &small_opts(), &CancelToken::new()).unwrap();
        assert_eq!((report.rows, report.columns), (3, 2));
        let (table, _) = read_with_fallback(&codec::default_codecs(), &dest).unwrap();
        assert_eq!(
            table.column("column_0").unwrap().values,
            ColumnValues::Int64(vec![Some(1), Some(3), Some(5)])
        );
    }

    #[test]
    fn empty_input_fails_verification_and_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.csv");
        fs::write(&src, "NU_INSCRICAO;TP_SEXO\n").unwrap();
        let dest = dir.path().join("out.parquet");
        fs::write(&dest, b"old").unwrap();
        let err = convert(&src, &sniffed(b';', true), &dest, &small_opts(), &CancelToken::new()).unwrap_err();
        assert!(matches!(err, ConvertError::VerificationFailed(_)));
        assert!(!dest.exists());
    }

    #[test]
    fn replaces_existing_output_and_stale_part() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.csv");
        fs::write(&src, "A,B\n1,x\n").unwrap();
        let dest = dir.path().join("out.parquet");
        fs::write(&dest, b"not parquet").unwrap();
        fs::write(layout::temp_path(&dest), b"stale").unwrap();
        convert(&src, &sniffed(b',', true), &dest, &small_opts(), &CancelToken::new()).unwrap();
        let (table, _) = read_with_fallback(&codec::default_codecs(), &dest).unwrap();
        assert_eq!(table.num_rows(), 1);
        assert!(!layout::temp_path(&dest).exists());
    }

    #[test]
    fn long_row_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.csv");
        fs::write(&src, "A,B\n1,2\n3,4\n5,6,7\n").unwrap();
        let dest = dir.path().join("out.parquet");
        let err = convert(&src, &sniffed(b',', true), &dest, &small_opts(), &CancelToken::new()).unwrap_err();
        assert!(matches!(err, ConvertError::Malformed { line: 4, found: 3, expected: 2 }));
        assert!(!dest.exists());
    }

    #[test]
    fn cancelled_before_first_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.csv");
        fs::write(&src, "A\n1\n").unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = convert(&src, &sniffed(b',', true), &dir.path().join("o.parquet"), &small_opts(), &cancel).unwrap_err();
        assert!(matches!(err, ConvertError::Cancelled));
    }

    struct Lossy;

    impl ColumnarCodec for Lossy {
        fn name(&self) -> &'static str {
            "lossy"
        }
        fn write(&self, _table: &Table, path: &Path) -> anyhow::Result<()> {
            fs::write(path, b"x")?;
            Ok(())
        }
        fn read(&self, _path: &Path) -> anyhow::Result<Table> {
            Err(anyhow!("cannot decode"))
        }
    }

    #[test]
    fn unreadable_output_is_verification_failure() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.csv");
        fs::write(&src, "A\n1\n").unwrap();
        let dest = dir.path().join("o.parquet");
        let codecs: Vec<Box<dyn ColumnarCodec>> = vec![Box::new(Lossy)];
        let err = convert_with(&codecs, &src, &sniffed(b',', true), &dest, &small_opts(), &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, ConvertError::VerificationFailed(_)));
        assert!(!dest.exists());
        assert!(!layout::temp_path(&dest).exists());
    }
}
