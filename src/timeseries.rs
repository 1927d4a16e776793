use crate::error::{AnalysisError, Result};
use crate::structs::{
    Dataset, ResampleInterval, ResampledBucket, ResampledSeries, TrendDirection, TrendSummary,
};
use chrono::{NaiveDateTime, Timelike};
use log::debug;
use std::collections::BTreeMap;

/// Slopes this close to zero count as no trend.
const FLAT_SLOPE_EPSILON: f64 = 1e-9;

impl ResampleInterval {
    /// Start of the bucket the timestamp falls into.
    pub fn truncate(&self, ts: NaiveDateTime) -> NaiveDateTime {
        match self {
            ResampleInterval::Hourly => ts
                .date()
                .and_hms_opt(ts.hour(), 0, 0)
                .expect("hour taken from a valid timestamp"),
            ResampleInterval::Daily => ts
                .date()
                .and_hms_opt(0, 0, 0)
                .expect("midnight is always valid"),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResampleInterval::Hourly => "hourly",
            ResampleInterval::Daily => "daily",
        }
    }
}

/// Aggregates a cleaned dataset into fixed-width buckets of per-factor means.
///
/// Buckets come out in ascending time order. A dataset with no rows forms no
/// buckets, which is an `InsufficientData` error.
pub fn resample(dataset: &Dataset, interval: ResampleInterval) -> Result<ResampledSeries> {
    if dataset.is_empty() {
        return Err(AnalysisError::InsufficientData {
            region: dataset.region.clone(),
            detail: format!("no rows to form {} buckets from", interval.label()),
        });
    }

    let width = dataset.factors.len();
    let mut accumulator: BTreeMap<NaiveDateTime, (Vec<f64>, usize)> = BTreeMap::new();
    for record in &dataset.records {
        let bucket = interval.truncate(record.timestamp);
        let (sums, count) = accumulator
            .entry(bucket)
            .or_insert_with(|| (vec![0.0; width], 0));
        for (sum, value) in sums.iter_mut().zip(&record.values) {
            *sum += value;
        }
        *count += 1;
    }

    let buckets: Vec<ResampledBucket> = accumulator
        .into_iter()
        .map(|(start, (sums, count))| ResampledBucket {
            start,
            means: sums.iter().map(|s| s / count as f64).collect(),
            count,
        })
        .collect();

    debug!(
        "Resampled {} into {} {} buckets",
        dataset.region,
        buckets.len(),
        interval.label()
    );
    Ok(ResampledSeries {
        region: dataset.region.clone(),
        interval,
        factors: dataset.factors.clone(),
        buckets,
    })
}

/// Per-factor linear trend over the resampled series.
///
/// The slope is the least-squares fit of bucket mean against bucket index,
/// i.e. change per interval. Series with fewer than two buckets have no
/// defined trend and are skipped.
pub fn trends(series: &ResampledSeries) -> Vec<TrendSummary> {
    if series.buckets.len() < 2 {
        return Vec::new();
    }

    series
        .factors
        .iter()
        .enumerate()
        .map(|(index, factor)| {
            let values: Vec<f64> = series.buckets.iter().map(|b| b.means[index]).collect();
            let slope = linear_slope(&values);
            let direction = if slope > FLAT_SLOPE_EPSILON {
                TrendDirection::Rising
            } else if slope < -FLAT_SLOPE_EPSILON {
                TrendDirection::Falling
            } else {
                TrendDirection::Flat
            };
            TrendSummary {
                factor: factor.clone(),
                slope,
                direction,
            }
        })
        .collect()
}

/// Least-squares slope of `values` against their indices 0..n.
fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }
    num / den
}
