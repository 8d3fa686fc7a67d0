//! Low-level engine: typed column writers on the way out, the record
//! iterator on the way back.

use anyhow::{anyhow, bail, Context, Result};
use parquet::basic::{Compression, LogicalType, Repetition, Type as PhysicalType};
use parquet::data_type::{ByteArray, ByteArrayType, DoubleType, Int64Type};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::file::writer::SerializedFileWriter;
use parquet::record::Field;
use parquet::schema::types::{Type, TypePtr};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use super::ColumnarCodec;
use crate::dataset::{Column, ColumnValues, Table};

const ROW_GROUP_ROWS: usize = 65_536;

pub struct RowParquet;

impl ColumnarCodec for RowParquet {
    fn name(&self) -> &'static str {
        "row-parquet"
    }

    fn write(&self, table: &Table, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let props = Arc::new(
            WriterProperties::builder()
                .set_compression(Compression::SNAPPY)
                .build(),
        );
        let mut writer = SerializedFileWriter::new(file, schema_of(table)?, props)?;

        let mut start = 0;
        while start < table.num_rows() {
            let range = start..(start + ROW_GROUP_ROWS).min(table.num_rows());
            let mut group = writer.next_row_group()?;
            for column in table.columns() {
                let mut out = group
                    .next_column()?
                    .ok_or_else(|| anyhow!("no writer for column {}", column.name))?;
                match &column.values {
                    ColumnValues::Int64(v) => {
                        let (values, defs) = split(&v[range.clone()]);
                        out.typed::<Int64Type>().write_batch(&values, Some(&defs), None)?;
                    }
                    ColumnValues::Float64(v) => {
                        let (values, defs) = split(&v[range.clone()]);
                        out.typed::<DoubleType>().write_batch(&values, Some(&defs), None)?;
                    }
                    ColumnValues::Utf8(v) => {
                        let (values, defs) = split_text(&v[range.clone()]);
                        out.typed::<ByteArrayType>()
                            .write_batch(&values, Some(&defs), None)?;
                    }
                }
                out.close()?;
            }
            group.close()?;
            start = range.end;
        }
        writer.close()?;
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<Table> {
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let reader = SerializedFileReader::new(file)?;
        let descr = reader.metadata().file_metadata().schema_descr_ptr();
        let mut columns = Vec::with_capacity(descr.num_columns());
        for i in 0..descr.num_columns() {
            let col = descr.column(i);
            let values = match col.physical_type() {
                PhysicalType::INT32 | PhysicalType::INT64 => ColumnValues::Int64(Vec::new()),
                PhysicalType::FLOAT | PhysicalType::DOUBLE => ColumnValues::Float64(Vec::new()),
                PhysicalType::BYTE_ARRAY => ColumnValues::Utf8(Vec::new()),
                other => bail!("column {}: unsupported physical type {other}", col.name()),
            };
            columns.push(Column::new(col.name().to_string(), values));
        }

        for row in reader.get_row_iter(None)? {
            let row = row?;
            for (column, (_, field)) in columns.iter_mut().zip(row.get_column_iter()) {
                push_field(&mut column.values, field)
                    .with_context(|| format!("column {}", column.name))?;
            }
        }
        Ok(Table::new(columns)?)
    }
}

fn schema_of(table: &Table) -> Result<TypePtr> {
    let fields = table
        .columns()
        .iter()
        .map(|c| {
            let (physical, logical) = match c.values {
                ColumnValues::Int64(_) => (PhysicalType::INT64, None),
                ColumnValues::Float64(_) => (PhysicalType::DOUBLE, None),
                ColumnValues::Utf8(_) => (PhysicalType::BYTE_ARRAY, Some(LogicalType::String)),
            };
            Type::primitive_type_builder(&c.name, physical)
                .with_repetition(Repetition::OPTIONAL)
                .with_logical_type(logical)
                .build()
                .map(Arc::new)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Arc::new(
        Type::group_type_builder("schema").with_fields(fields).build()?,
    ))
}

/// Non-null values plus definition levels (1 = present, 0 = null).
fn split<T: Copy>(cells: &[Option<T>]) -> (Vec<T>, Vec<i16>) {
    let mut values = Vec::with_capacity(cells.len());
    let defs = cells
        .iter()
        .map(|c| match c {
            Some(v) => {
                values.push(*v);
                1
            }
            None => 0,
        })
        .collect();
    (values, defs)
}

fn split_text(cells: &[Option<String>]) -> (Vec<ByteArray>, Vec<i16>) {
    let mut values = Vec::with_capacity(cells.len());
    let defs = cells
        .iter()
        .map(|c| match c {
            Some(s) => {
                values.push(ByteArray::from(s.as_str()));
                1
            }
            None => 0,
        })
        .collect();
    (values, defs)
}

fn push_field(values: &mut ColumnValues, field: &Field) -> Result<()> {
    match (values, field) {
        (ColumnValues::Int64(v), Field::Null) => v.push(None),
        (ColumnValues::Int64(v), Field::Long(x)) => v.push(Some(*x)),
        (ColumnValues::Int64(v), Field::Int(x)) => v.push(Some(i64::from(*x))),
        (ColumnValues::Int64(v), Field::Short(x)) => v.push(Some(i64::from(*x))),
        (ColumnValues::Int64(v), Field::Byte(x)) => v.push(Some(i64::from(*x))),
        (ColumnValues::Float64(v), Field::Null) => v.push(None),
        (ColumnValues::Float64(v), Field::Double(x)) => v.push(Some(*x)),
        (ColumnValues::Float64(v), Field::Float(x)) => v.push(Some(f64::from(*x))),
        (ColumnValues::Utf8(v), Field::Null) => v.push(None),
        (ColumnValues::Utf8(v), Field::Str(s)) => v.push(Some(s.clone())),
        (ColumnValues::Utf8(v), Field::Bytes(b)) => v.push(Some(b.as_utf8()?.to_string())),
        (_, other) => bail!("unexpected value {other}"),
    }
    Ok(())
}
