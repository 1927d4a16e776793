use crate::structs::{CleanConfig, CleanReport, Dataset, MeasurementRecord, RawDataset, RawRecord};
use log::debug;

/// Validates and normalizes a raw dataset.
///
/// A row is dropped when its timestamp failed to parse, any measurement is
/// non-finite, or any measurement falls outside its factor's configured
/// plausible range. Rows are dropped, never imputed, so identical input
/// always yields identical output. Surviving rows are stably sorted by
/// timestamp, which makes timestamps monotonically non-decreasing.
pub fn clean(raw: RawDataset, config: &CleanConfig) -> (Dataset, CleanReport) {
    let mut report = CleanReport {
        input_rows: raw.records.len(),
        ..CleanReport::default()
    };

    let ranges: Vec<_> = raw
        .factors
        .iter()
        .map(|f| config.bounds.get(f).copied())
        .collect();

    let mut records = Vec::with_capacity(raw.records.len());
    for row in raw.records {
        let timestamp = match row.timestamp {
            Some(ts) => ts,
            None => {
                report.bad_timestamp += 1;
                report.dropped_rows += 1;
                continue;
            }
        };
        if row.values.iter().any(|v| !v.is_finite()) {
            report.non_numeric += 1;
            report.dropped_rows += 1;
            continue;
        }
        let out_of_range = row
            .values
            .iter()
            .zip(&ranges)
            .any(|(v, range)| matches!(range, Some(r) if !r.contains(*v)));
        if out_of_range {
            report.out_of_range += 1;
            report.dropped_rows += 1;
            continue;
        }
        records.push(MeasurementRecord {
            timestamp,
            values: row.values,
        });
    }

    records.sort_by_key(|r| r.timestamp);
    report.kept_rows = records.len();

    debug!(
        "Cleaned {}: kept {}/{} rows ({} bad timestamp, {} non-numeric, {} out of range)",
        raw.region,
        report.kept_rows,
        report.input_rows,
        report.bad_timestamp,
        report.non_numeric,
        report.out_of_range
    );

    (
        Dataset {
            region: raw.region,
            factors: raw.factors,
            records,
        },
        report,
    )
}

/// Lossless down-conversion; lets a cleaned dataset be re-cleaned.
impl From<Dataset> for RawDataset {
    fn from(dataset: Dataset) -> Self {
        RawDataset {
            region: dataset.region,
            factors: dataset.factors,
            records: dataset
                .records
                .into_iter()
                .map(|r| RawRecord {
                    timestamp: Some(r.timestamp),
                    values: r.values,
                })
                .collect(),
        }
    }
}
