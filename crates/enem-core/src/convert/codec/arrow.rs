//! Arrow `RecordBatch` based engine.

use anyhow::{bail, Context, Result};
use arrow_array::{
    Array, ArrayRef, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    RecordBatch, RecordBatchOptions, StringArray, StringViewArray,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use super::ColumnarCodec;
use crate::dataset::{Column, ColumnValues, Table};

/// Rows per written batch (and per row group).
const BATCH_ROWS: usize = 65_536;

pub struct ArrowParquet;

impl ColumnarCodec for ArrowParquet {
    fn name(&self) -> &'static str {
        "arrow-parquet"
    }

    fn write(&self, table: &Table, path: &Path) -> Result<()> {
        let schema = schema_of(table);
        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let mut writer = ArrowWriter::try_new(file, Arc::clone(&schema), Some(props))?;
        let mut offset = 0;
        while offset < table.num_rows() {
            let end = (offset + BATCH_ROWS).min(table.num_rows());
            writer.write(&batch_of(table, &schema, offset..end)?)?;
            writer.flush()?;
            offset = end;
        }
        writer.close()?;
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<Table> {
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let schema = builder.schema().clone();
        let mut columns: Vec<Column> = schema
            .fields()
            .iter()
            .map(|f| Ok(Column::new(f.name().clone(), empty_values(f.data_type())?)))
            .collect::<Result<_>>()?;

        for batch in builder.build()? {
            let batch = batch?;
            for (column, array) in columns.iter_mut().zip(batch.columns()) {
                append(&mut column.values, array.as_ref())
                    .with_context(|| format!("column {}", column.name))?;
            }
        }
        Ok(Table::new(columns)?)
    }
}

fn schema_of(table: &Table) -> SchemaRef {
    let fields: Vec<Field> = table
        .columns()
        .iter()
        .map(|c| {
            let data_type = match c.values {
                ColumnValues::Int64(_) => DataType::Int64,
                ColumnValues::Float64(_) => DataType::Float64,
                ColumnValues::Utf8(_) => DataType::Utf8,
            };
            Field::new(c.name.clone(), data_type, true)
        })
        .collect();
    Arc::new(Schema::new(fields))
}

/// Arrays for `rows` only; the table's own buffers are borrowed, never cloned whole.
fn batch_of(table: &Table, schema: &SchemaRef, rows: Range<usize>) -> Result<RecordBatch> {
    let arrays: Vec<ArrayRef> = table
        .columns()
        .iter()
        .map(|c| -> ArrayRef {
            match &c.values {
                ColumnValues::Int64(v) => Arc::new(Int64Array::from(v[rows.clone()].to_vec())),
                ColumnValues::Float64(v) => {
                    Arc::new(Float64Array::from(v[rows.clone()].to_vec()))
                }
                ColumnValues::Utf8(v) => Arc::new(
                    v[rows.clone()]
                        .iter()
                        .map(|s| s.as_deref())
                        .collect::<StringArray>(),
                ),
            }
        })
        .collect();
    let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
    Ok(RecordBatch::try_new_with_options(
        Arc::clone(schema),
        arrays,
        &options,
    )?)
}

fn empty_values(data_type: &DataType) -> Result<ColumnValues> {
    Ok(match data_type {
        DataType::Int64 | DataType::Int32 => ColumnValues::Int64(Vec::new()),
        DataType::Float64 | DataType::Float32 => ColumnValues::Float64(Vec::new()),
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => ColumnValues::Utf8(Vec::new()),
        other => bail!("unsupported column type {other}"),
    })
}

fn downcast<'a, T: 'static>(array: &'a dyn Array) -> Result<&'a T> {
    match array.as_any().downcast_ref::<T>() {
        Some(a) => Ok(a),
        None => bail!("unexpected array type {}", array.data_type()),
    }
}

fn append(values: &mut ColumnValues, array: &dyn Array) -> Result<()> {
    match (values, array.data_type()) {
        (ColumnValues::Int64(v), DataType::Int64) => {
            v.extend(downcast::<Int64Array>(array)?.iter())
        }
        (ColumnValues::Int64(v), DataType::Int32) => v.extend(
            downcast::<Int32Array>(array)?
                .iter()
                .map(|x| x.map(i64::from)),
        ),
        (ColumnValues::Float64(v), DataType::Float64) => {
            v.extend(downcast::<Float64Array>(array)?.iter())
        }
        (ColumnValues::Float64(v), DataType::Float32) => v.extend(
            downcast::<Float32Array>(array)?
                .iter()
                .map(|x| x.map(f64::from)),
        ),
        (ColumnValues::Utf8(v), DataType::Utf8) => v.extend(
            downcast::<StringArray>(array)?
                .iter()
                .map(|s| s.map(str::to_string)),
        ),
        (ColumnValues::Utf8(v), DataType::LargeUtf8) => v.extend(
            downcast::<LargeStringArray>(array)?
                .iter()
                .map(|s| s.map(str::to_string)),
        ),
        (ColumnValues::Utf8(v), DataType::Utf8View) => v.extend(
            downcast::<StringViewArray>(array)?
                .iter()
                .map(|s| s.map(str::to_string)),
        ),
        (_, other) => bail!("batch type {other} does not match the schema"),
    }
    Ok(())
}
