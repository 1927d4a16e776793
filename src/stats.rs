use crate::error::{AnalysisError, Result};
use crate::structs::{CorrelationMatrix, Dataset, FactorSummary, SummaryStatistics};
use log::debug;
use std::collections::BTreeMap;

/// Computes per-factor summary statistics for a cleaned dataset.
///
/// Standard deviation is the sample standard deviation (N-1 denominator).
/// Percentiles use linear interpolation between ranks, so results are
/// reproducible bit-for-bit on identical input.
pub fn summarize(dataset: &Dataset) -> Result<SummaryStatistics> {
    if dataset.is_empty() {
        return Err(AnalysisError::InsufficientData {
            region: dataset.region.clone(),
            detail: "no valid rows to summarize".to_string(),
        });
    }

    let mut factors = BTreeMap::new();
    for (index, name) in dataset.factors.iter().enumerate() {
        let values = dataset.factor_values(index);
        factors.insert(name.clone(), summarize_values(&values));
    }
    debug!(
        "Summarized {} factors over {} rows for {}",
        factors.len(),
        dataset.len(),
        dataset.region
    );
    Ok(SummaryStatistics {
        region: dataset.region.clone(),
        factors,
    })
}

fn summarize_values(values: &[f64]) -> FactorSummary {
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let min = values.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max = values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let std_dev = if count > 1 {
        let variance =
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        variance.sqrt()
    } else {
        0.0
    };

    FactorSummary {
        count,
        mean,
        median: median(values),
        std_dev,
        min,
        max,
        percentile_25: percentile(values, 25.0),
        percentile_75: percentile(values, 75.0),
        percentile_90: percentile(values, 90.0),
        percentile_95: percentile(values, 95.0),
    }
}

/// Median of a non-empty slice; average of the two middle values for even
/// lengths.
pub fn median(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let len = sorted.len();
    if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    } else {
        sorted[len / 2]
    }
}

/// Percentile (0..=100) with linear interpolation between adjacent ranks.
pub fn percentile(data: &[f64], percentile: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let index = (percentile / 100.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted[lower]
    } else {
        let weight = index - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

/// Computes the pairwise Pearson correlation matrix over all factors.
///
/// The matrix is symmetric with the diagonal fixed at 1.0. A zero-variance
/// factor has no defined correlation with anything; its off-diagonal entries
/// are NaN. Fewer than two rows is an `InsufficientData` error.
pub fn correlation_matrix(dataset: &Dataset) -> Result<CorrelationMatrix> {
    if dataset.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            region: dataset.region.clone(),
            detail: format!("{} row(s), correlation needs at least 2", dataset.len()),
        });
    }

    let columns: Vec<Vec<f64>> = (0..dataset.factors.len())
        .map(|i| dataset.factor_values(i))
        .collect();

    let n = columns.len();
    let mut coefficients = vec![vec![0.0; n]; n];
    for i in 0..n {
        coefficients[i][i] = 1.0;
        for j in (i + 1)..n {
            let r = pearson(&columns[i], &columns[j]);
            coefficients[i][j] = r;
            coefficients[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        region: dataset.region.clone(),
        factors: dataset.factors.clone(),
        coefficients,
    })
}

/// Pearson coefficient of two equal-length columns. NaN when either column
/// has zero variance.
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        f64::NAN
    } else {
        cov / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::MeasurementRecord;
    use chrono::NaiveDate;

    fn dataset(factors: &[&str], rows: &[&[f64]]) -> Dataset {
        let base = NaiveDate::from_ymd_opt(2021, 8, 9)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Dataset {
            region: "benin".to_string(),
            factors: factors.iter().map(|f| f.to_string()).collect(),
            records: rows
                .iter()
                .enumerate()
                .map(|(i, values)| MeasurementRecord {
                    timestamp: base + chrono::Duration::minutes(i as i64),
                    values: values.to_vec(),
                })
                .collect(),
        }
    }

    #[test]
    fn constant_column_mean_is_the_constant() {
        let ds = dataset(&["GHI"], &[&[42.0], &[42.0], &[42.0]]);
        let stats = summarize(&ds).unwrap();
        let ghi = &stats.factors["GHI"];
        assert_eq!(ghi.mean, 42.0);
        assert_eq!(ghi.median, 42.0);
        assert_eq!(ghi.std_dev, 0.0);
        assert_eq!(ghi.min, 42.0);
        assert_eq!(ghi.max, 42.0);
    }

    #[test]
    fn percentile_linear_interpolation() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&data, 0.0), 1.0);
        assert_eq!(percentile(&data, 100.0), 4.0);
        assert_eq!(percentile(&data, 50.0), 2.5);
        assert_eq!(percentile(&data, 25.0), 1.75);
        assert_eq!(median(&data), 2.5);
    }

    #[test]
    fn empty_dataset_is_insufficient() {
        let ds = dataset(&["GHI"], &[]);
        assert!(matches!(
            summarize(&ds).unwrap_err(),
            AnalysisError::InsufficientData { .. }
        ));
    }

    #[test]
    fn correlation_symmetric_with_unit_diagonal() {
        let ds = dataset(
            &["GHI", "Tamb", "RH"],
            &[
                &[100.0, 20.0, 80.0],
                &[250.0, 24.0, 65.0],
                &[400.0, 29.0, 50.0],
                &[320.0, 27.0, 55.0],
            ],
        );
        let matrix = correlation_matrix(&ds).unwrap();
        for i in 0..3 {
            assert_eq!(matrix.get(i, i), 1.0);
            for j in 0..3 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
                if i != j {
                    assert!(matrix.get(i, j).abs() <= 1.0 + 1e-12);
                }
            }
        }
    }

    #[test]
    fn perfectly_linear_factors_correlate_fully() {
        let ds = dataset(
            &["GHI", "Doubled", "Negated"],
            &[
                &[1.0, 2.0, -1.0],
                &[2.0, 4.0, -2.0],
                &[3.0, 6.0, -3.0],
            ],
        );
        let matrix = correlation_matrix(&ds).unwrap();
        assert!((matrix.get(0, 1) - 1.0).abs() < 1e-12);
        assert!((matrix.get(0, 2) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_variance_factor_yields_nan_off_diagonal() {
        let ds = dataset(&["GHI", "Const"], &[&[1.0, 5.0], &[2.0, 5.0]]);
        let matrix = correlation_matrix(&ds).unwrap();
        assert!(matrix.get(0, 1).is_nan());
        assert_eq!(matrix.get(1, 1), 1.0);
    }

    #[test]
    fn single_row_correlation_is_insufficient() {
        let ds = dataset(&["GHI", "Tamb"], &[&[1.0, 2.0]]);
        assert!(matches!(
            correlation_matrix(&ds).unwrap_err(),
            AnalysisError::InsufficientData { .. }
        ));
    }
}
