use crate::error::{AnalysisError, Result};
use crate::structs::{RawDataset, RawRecord};
use chrono::NaiveDateTime;
use log::debug;
use std::fs::File;
use std::path::Path;

/// Accepted timestamp formats, tried in order. The measurement loggers emit
/// second resolution, older exports only minute resolution.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Loads one region's measurement CSV into a `RawDataset`.
///
/// The file must carry a header of the form `Timestamp,<factor>,...` with at
/// least one factor column and no repeated factor names. A missing or
/// unreadable file, a wrong column set, or a ragged row is a `Load` error.
/// An unparseable timestamp or measurement cell is not a `Load` error; those
/// survive as `None`/`NaN` for the cleaner to drop.
pub fn load_dataset(path: &Path, region: &str) -> Result<RawDataset> {
    debug!("Loading {} from {}", region, path.display());
    let file = File::open(path).map_err(|e| AnalysisError::Load {
        region: region.to_string(),
        reason: format!("cannot open {}: {}", path.display(), e),
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers().map_err(|e| AnalysisError::Load {
        region: region.to_string(),
        reason: format!("cannot read header: {}", e),
    })?;
    if headers.len() < 2 || !headers[0].eq_ignore_ascii_case("timestamp") {
        return Err(AnalysisError::Load {
            region: region.to_string(),
            reason: format!(
                "expected header `Timestamp,<factor>,...`, got `{}`",
                headers.iter().collect::<Vec<_>>().join(",")
            ),
        });
    }
    let factors: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
    for (i, factor) in factors.iter().enumerate() {
        if factors[..i].contains(factor) {
            return Err(AnalysisError::Load {
                region: region.to_string(),
                reason: format!("duplicate factor column `{}`", factor),
            });
        }
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| AnalysisError::Load {
            region: region.to_string(),
            reason: format!("malformed row: {}", e),
        })?;
        if row.len() != factors.len() + 1 {
            return Err(AnalysisError::Load {
                region: region.to_string(),
                reason: format!(
                    "row {} has {} fields, expected {}",
                    records.len() + 2,
                    row.len(),
                    factors.len() + 1
                ),
            });
        }
        let timestamp = parse_timestamp(&row[0]);
        let values = row
            .iter()
            .skip(1)
            .map(|cell| cell.parse::<f64>().unwrap_or(f64::NAN))
            .collect();
        records.push(RawRecord { timestamp, values });
    }

    debug!(
        "Loaded {} rows x {} factors for {}",
        records.len(),
        factors.len(),
        region
    );
    Ok(RawDataset {
        region: region.to_string(),
        factors,
        records,
    })
}

fn parse_timestamp(cell: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cell, fmt).ok())
}
