//! In-memory columnar table and the per-year persisted dataset.
//!
//! `Table` is what the converter builds from CSV chunks and what the Parquet
//! codecs write and read back. A `ColumnarDataset` is a table loaded from
//! `<data_dir>/microdados_enem_<year>.parquet`; it is never modified in place.

mod infer;

pub use infer::{infer_column, parse_float, parse_int, ColumnBuilder};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::convert::codec;
use crate::layout;

/// Physical type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int64,
    Float64,
    Utf8,
}

/// Column cells; `None` is a null.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Utf8(Vec<Option<String>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Int64(v) => v.len(),
            ColumnValues::Float64(v) => v.len(),
            ColumnValues::Utf8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnValues::Int64(_) => ColumnKind::Int64,
            ColumnValues::Float64(_) => ColumnKind::Float64,
            ColumnValues::Utf8(_) => ColumnKind::Utf8,
        }
    }

    /// Cell `i` as a number. Text cells are parsed leniently (decimal comma accepted).
    pub fn get_f64(&self, i: usize) -> Option<f64> {
        match self {
            ColumnValues::Int64(v) => v.get(i).copied().flatten().map(|x| x as f64),
            ColumnValues::Float64(v) => v.get(i).copied().flatten().filter(|x| !x.is_nan()),
            ColumnValues::Utf8(v) => v
                .get(i)
                .and_then(|s| s.as_deref())
                .and_then(|s| parse_float(&s.replace(',', "."))),
        }
    }

    /// Cell `i` rendered as text (numbers use their canonical formatting).
    pub fn get_text(&self, i: usize) -> Option<String> {
        match self {
            ColumnValues::Int64(v) => v.get(i).copied().flatten().map(|x| x.to_string()),
            ColumnValues::Float64(v) => v.get(i).copied().flatten().map(|x| x.to_string()),
            ColumnValues::Utf8(v) => v.get(i).cloned().flatten(),
        }
    }

    /// Keeps the cells whose index is set in `mask`.
    fn filter(&self, mask: &[bool]) -> ColumnValues {
        fn keep<T: Clone>(v: &[T], mask: &[bool]) -> Vec<T> {
            v.iter()
                .zip(mask)
                .filter(|(_, m)| **m)
                .map(|(x, _)| x.clone())
                .collect()
        }
        match self {
            ColumnValues::Int64(v) => ColumnValues::Int64(keep(v, mask)),
            ColumnValues::Float64(v) => ColumnValues::Float64(keep(v, mask)),
            ColumnValues::Utf8(v) => ColumnValues::Utf8(keep(v, mask)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

impl Column {
    pub fn new(name: impl Into<String>, values: ColumnValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn float(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnValues::Float64(values))
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("column {name} has {len} rows, expected {expected}")]
    RaggedColumn {
        name: String,
        len: usize,
        expected: usize,
    },
    #[error("duplicate column name {0}")]
    DuplicateColumn(String),
}

/// Equal-length named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self, ShapeError> {
        let rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        for (i, c) in columns.iter().enumerate() {
            if c.values.len() != rows {
                return Err(ShapeError::RaggedColumn {
                    name: c.name.clone(),
                    len: c.values.len(),
                    expected: rows,
                });
            }
            if columns[..i].iter().any(|o| o.name == c.name) {
                return Err(ShapeError::DuplicateColumn(c.name.clone()));
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// New table with only the rows whose `mask` entry is true.
    pub fn filter_rows(&self, mask: &[bool]) -> Table {
        let columns: Vec<Column> = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), c.values.filter(mask)))
            .collect();
        let rows = mask.iter().take(self.rows).filter(|m| **m).count();
        Table { columns, rows }
    }
}

/// A persisted per-year table loaded from disk.
#[derive(Debug, Clone)]
pub struct ColumnarDataset {
    pub year: u16,
    pub path: PathBuf,
    pub table: Table,
}

impl ColumnarDataset {
    /// Loads `<data_dir>/microdados_enem_<year>.parquet` through the codec chain.
    pub fn load(data_dir: &Path, year: u16) -> Result<Self> {
        let path = layout::dataset_path(data_dir, year);
        let (table, codec_name) = codec::read_with_fallback(&codec::default_codecs(), &path)
            .with_context(|| format!("load dataset {}", path.display()))?;
        tracing::info!(
            year,
            rows = table.num_rows(),
            columns = table.num_columns(),
            codec = codec_name,
            "dataset loaded"
        );
        Ok(Self { year, path, table })
    }

    /// Row and column counts of a year's file, read from its footer only.
    pub fn shape(data_dir: &Path, year: u16) -> Result<(usize, usize)> {
        codec::footer_shape(&layout::dataset_path(data_dir, year))
    }

    /// Years with a dataset file in `data_dir`, ascending.
    pub fn available_years(data_dir: &Path) -> Result<Vec<u16>> {
        let entries = match std::fs::read_dir(data_dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("read {}", data_dir.display())),
        };
        let mut years = Vec::new();
        for entry in entries {
            let entry = entry?;
            if let Some(year) = entry.file_name().to_str().and_then(layout::year_from_file_name) {
                years.push(year);
            }
        }
        years.sort_unstable();
        Ok(years)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            Column::new("ID", ColumnValues::Int64(vec![Some(1), Some(2), None])),
            Column::float("NOTA", vec![Some(500.5), None, Some(f64::NAN)]),
            Column::new(
                "UF",
                ColumnValues::Utf8(vec![Some("PB".into()), Some("SP".into()), Some("612,5".into())]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn shape_and_lookup() {
        let t = sample();
        assert_eq!(t.num_rows(), 3);
        assert_eq!(t.num_columns(), 3);
        assert_eq!(t.column_names().collect::<Vec<_>>(), vec!["ID", "NOTA", "UF"]);
        assert!(t.column("MISSING").is_none());
    }

    #[test]
    fn numeric_access_skips_nulls_and_nan() {
        let t = sample();
        let id = &t.column("ID").unwrap().values;
        assert_eq!(id.get_f64(0), Some(1.0));
        assert_eq!(id.get_f64(2), None);
        let nota = &t.column("NOTA").unwrap().values;
        assert_eq!(nota.get_f64(2), None);
        let uf = &t.column("UF").unwrap().values;
        assert_eq!(uf.get_f64(0), None);
        assert_eq!(uf.get_f64(2), Some(612.5));
        assert_eq!(uf.get_text(1).as_deref(), Some("SP"));
    }

    #[test]
    fn filter_rows_keeps_masked() {
        let t = sample().filter_rows(&[true, false, true]);
        assert_eq!(t.num_rows(), 2);
        assert_eq!(
            t.column("ID").unwrap().values,
            ColumnValues::Int64(vec![Some(1), None])
        );
    }

    #[test]
    fn ragged_and_duplicate_columns_rejected() {
        let ragged = Table::new(vec![
            Column::float("A", vec![Some(1.0)]),
            Column::float("B", vec![]),
        ]);
        assert!(matches!(ragged, Err(ShapeError::RaggedColumn { .. })));
        let dup = Table::new(vec![
            Column::float("A", vec![Some(1.0)]),
            Column::float("A", vec![Some(2.0)]),
        ]);
        assert_eq!(dup, Err(ShapeError::DuplicateColumn("A".to_string())));
    }

    #[test]
    fn available_years_lists_dataset_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("microdados_enem_2021.parquet"), b"x").unwrap();
        std::fs::write(dir.path().join("microdados_enem_2019.parquet"), b"x").unwrap();
        std::fs::write(dir.path().join("microdados_enem_2020.parquet.part"), b"x").unwrap();
        assert_eq!(
            ColumnarDataset::available_years(dir.path()).unwrap(),
            vec![2019, 2021]
        );
        assert!(ColumnarDataset::available_years(&dir.path().join("nope"))
            .unwrap()
            .is_empty());
    }
}
