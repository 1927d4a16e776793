use crate::error::Result;
use crate::structs::Dataset;
use arrow_array::{ArrayRef, Float64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use csv::Writer;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use std::{fs::File, path::Path, sync::Arc};

/// Matches the loader's first accepted timestamp format, so exported files
/// round-trip.
const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes a cleaned dataset back out as CSV with the same column layout the
/// loader expects.
pub fn write_clean_csv(dataset: &Dataset, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);

    let mut header = vec!["Timestamp".to_string()];
    header.extend(dataset.factors.iter().cloned());
    writer.write_record(&header)?;

    for record in &dataset.records {
        let mut row = vec![record
            .timestamp
            .format(EXPORT_TIMESTAMP_FORMAT)
            .to_string()];
        row.extend(record.values.iter().map(|v| v.to_string()));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes a cleaned dataset to a columnar Parquet file.
///
/// Timestamps are kept as formatted strings; factor columns are Float64.
pub fn write_clean_parquet(dataset: &Dataset, output_path: &Path) -> Result<()> {
    let mut fields = vec![Field::new("Timestamp", DataType::Utf8, false)];
    for factor in &dataset.factors {
        fields.push(Field::new(factor, DataType::Float64, false));
    }
    let schema = Arc::new(Schema::new(fields));

    let timestamps: StringArray = StringArray::from_iter_values(
        dataset
            .records
            .iter()
            .map(|r| r.timestamp.format(EXPORT_TIMESTAMP_FORMAT).to_string()),
    );
    let mut columns: Vec<ArrayRef> = vec![Arc::new(timestamps)];
    for index in 0..dataset.factors.len() {
        let column: Float64Array = dataset.records.iter().map(|r| r.values[index]).collect();
        columns.push(Arc::new(column));
    }

    let batch = RecordBatch::try_new(schema.clone(), columns)?;

    let file = File::create(output_path)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}
