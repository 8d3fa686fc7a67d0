//! Interchangeable Parquet engines tried in priority order.

mod arrow;
mod rows;

pub use self::arrow::ArrowParquet;
pub use self::rows::RowParquet;

use anyhow::{anyhow, Context, Result};
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::fs::{self, File};
use std::io;
use std::path::Path;

use crate::dataset::Table;

/// One columnar backend able to persist and reload a `Table`.
pub trait ColumnarCodec: Send + Sync {
    fn name(&self) -> &'static str;
    fn write(&self, table: &Table, path: &Path) -> Result<()>;
    fn read(&self, path: &Path) -> Result<Table>;
}

/// A codec that gave up, with its rendered error.
#[derive(Debug, Clone)]
pub struct CodecFailure {
    pub codec: &'static str,
    pub error: String,
}

/// Arrow-backed writer first, low-level row writer second.
pub fn default_codecs() -> Vec<Box<dyn ColumnarCodec>> {
    vec![Box::new(ArrowParquet), Box::new(RowParquet)]
}

/// Writes with the first codec that succeeds. Leftovers of a failed attempt
/// are removed before the next codec runs.
pub fn write_with_fallback(
    codecs: &[Box<dyn ColumnarCodec>],
    table: &Table,
    path: &Path,
) -> Result<&'static str, Vec<CodecFailure>> {
    let mut failures = Vec::new();
    for codec in codecs {
        match codec.write(table, path) {
            Ok(()) => return Ok(codec.name()),
            Err(e) => {
                tracing::warn!(codec = codec.name(), error = %e, "columnar write failed");
                remove_if_exists(path);
                failures.push(CodecFailure {
                    codec: codec.name(),
                    error: format!("{e:#}"),
                });
            }
        }
    }
    Err(failures)
}

/// Reads with the first codec that succeeds.
pub fn read_with_fallback(
    codecs: &[Box<dyn ColumnarCodec>],
    path: &Path,
) -> Result<(Table, &'static str)> {
    let mut errors = Vec::new();
    for codec in codecs {
        match codec.read(path) {
            Ok(table) => return Ok((table, codec.name())),
            Err(e) => {
                tracing::debug!(codec = codec.name(), error = %e, "columnar read failed");
                errors.push(format!("{}: {e:#}", codec.name()));
            }
        }
    }
    Err(anyhow!("no engine could read {}: {}", path.display(), errors.join("; ")))
}

/// Row and column counts from the Parquet footer; no page is decoded.
pub fn footer_shape(path: &Path) -> Result<(usize, usize)> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = SerializedFileReader::new(file)
        .with_context(|| format!("read footer of {}", path.display()))?;
    let meta = reader.metadata().file_metadata();
    let rows = usize::try_from(meta.num_rows())
        .map_err(|_| anyhow!("negative row count in {}", path.display()))?;
    Ok((rows, meta.schema_descr().num_columns()))
}

pub(crate) fn remove_if_exists(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not remove file"),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dataset::{Column, ColumnValues};

    pub(crate) fn sample_table() -> Table {
        Table::new(vec![
            Column::new(
                "NU_INSCRICAO",
                ColumnValues::Int64(vec![Some(200001), Some(200002), None, Some(200004)]),
            ),
            Column::float("NU_NOTA_MT", vec![Some(512.3), None, Some(700.0), Some(-1.5)]),
            Column::new(
                "SG_UF_PROVA",
                ColumnValues::Utf8(vec![
                    Some("PB".into()),
                    Some("São Paulo".into()),
                    None,
                    Some("".into()),
                ]),
            ),
        ])
        .unwrap()
    }

    struct Broken;

    impl ColumnarCodec for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn write(&self, _table: &Table, path: &Path) -> Result<()> {
            fs::write(path, b"partial")?;
            Err(anyhow!("disk on fire"))
        }
        fn read(&self, _path: &Path) -> Result<Table> {
            Err(anyhow!("unreadable"))
        }
    }

    #[test]
    fn each_default_codec_reproduces_the_table() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample_table();
        for codec in default_codecs() {
            let path = dir.path().join(format!("{}.parquet", codec.name()));
            codec.write(&table, &path).unwrap();
            assert_eq!(codec.read(&path).unwrap(), table, "codec {}", codec.name());
        }
    }

    #[test]
    fn footer_shape_matches_written_table() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample_table();
        for codec in default_codecs() {
            let path = dir.path().join(format!("{}.parquet", codec.name()));
            codec.write(&table, &path).unwrap();
            assert_eq!(footer_shape(&path).unwrap(), (4, 3), "codec {}", codec.name());
        }
        let junk = dir.path().join("junk.parquet");
        fs::write(&junk, b"not parquet").unwrap();
        assert!(footer_shape(&junk).is_err());
    }

    #[test]
    fn codecs_read_each_others_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.parquet");
        let table = sample_table();
        ArrowParquet.write(&table, &path).unwrap();
        assert_eq!(RowParquet.read(&path).unwrap(), table);
    }

    #[test]
    fn falls_back_to_second_codec_and_cleans_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.parquet");
        let codecs: Vec<Box<dyn ColumnarCodec>> = vec![Box::new(Broken), Box::new(RowParquet)];
        let used = write_with_fallback(&codecs, &sample_table(), &path).unwrap();
        assert_eq!(used, "row-parquet");
        let (table, reader) = read_with_fallback(&codecs, &path).unwrap();
        assert_eq!(reader, "row-parquet");
        assert_eq!(table.num_rows(), 4);
    }

    #[test]
    fn all_codecs_failing_reports_each_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.parquet");
        let codecs: Vec<Box<dyn ColumnarCodec>> = vec![Box::new(Broken), Box::new(Broken)];
        let failures = write_with_fallback(&codecs, &sample_table(), &path).unwrap_err();
        assert_eq!(failures.len(), 2);
        assert!(failures[0].error.contains("disk on fire"));
        assert!(!path.exists());
        assert!(read_with_fallback(&codecs, &path).is_err());
    }
}
