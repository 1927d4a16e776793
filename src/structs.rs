use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dataset as produced by the loader, before any cleaning.
///
/// `factors` lists the measurement channels in header order; every record's
/// `values` vector is parallel to it. Unparseable cells survive loading as
/// `None` timestamps or `NaN` values and are the cleaner's job to drop.
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub region: String,
    pub factors: Vec<String>,
    pub records: Vec<RawRecord>,
}

/// One raw measurement row.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub timestamp: Option<NaiveDateTime>,
    pub values: Vec<f64>,
}

/// Cleaned, timestamp-sorted dataset. Read-only for all downstream stages.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub region: String,
    pub factors: Vec<String>,
    pub records: Vec<MeasurementRecord>,
}

/// One validated measurement row; `values` is parallel to `Dataset::factors`.
#[derive(Debug, Clone)]
pub struct MeasurementRecord {
    pub timestamp: NaiveDateTime,
    pub values: Vec<f64>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn factor_index(&self, name: &str) -> Option<usize> {
        self.factors.iter().position(|f| f == name)
    }

    /// Column vector for one factor, in record order.
    pub fn factor_values(&self, index: usize) -> Vec<f64> {
        self.records.iter().map(|r| r.values[index]).collect()
    }
}

/// Inclusive plausibility range for one measurement channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlausibleRange {
    pub min: f64,
    pub max: f64,
}

impl PlausibleRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Configuration for row validation.
///
/// Factors without an entry only get the finite-value check. The defaults
/// cover the channels of the solar measurement campaign (irradiance in W/m²,
/// ambient temperature in °C, relative humidity in %, wind speed in m/s,
/// barometric pressure in hPa).
#[derive(Debug, Clone)]
pub struct CleanConfig {
    pub bounds: BTreeMap<String, PlausibleRange>,
}

impl Default for CleanConfig {
    fn default() -> Self {
        let mut bounds = BTreeMap::new();
        for irradiance in ["GHI", "DNI", "DHI"] {
            bounds.insert(irradiance.to_string(), PlausibleRange { min: 0.0, max: 1600.0 });
        }
        bounds.insert("Tamb".to_string(), PlausibleRange { min: -40.0, max: 60.0 });
        bounds.insert("RH".to_string(), PlausibleRange { min: 0.0, max: 100.0 });
        bounds.insert("WS".to_string(), PlausibleRange { min: 0.0, max: 75.0 });
        bounds.insert("BP".to_string(), PlausibleRange { min: 800.0, max: 1100.0 });
        Self { bounds }
    }
}

/// Diagnostic side channel of a cleaning pass. Never an error.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CleanReport {
    pub input_rows: usize,
    pub kept_rows: usize,
    pub dropped_rows: usize,
    pub bad_timestamp: usize,
    pub non_numeric: usize,
    pub out_of_range: usize,
}

/// Per-factor summary; immutable once computed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FactorSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub percentile_25: f64,
    pub percentile_75: f64,
    pub percentile_90: f64,
    pub percentile_95: f64,
}

/// Summary statistics for one region, keyed by factor name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub region: String,
    pub factors: BTreeMap<String, FactorSummary>,
}

/// Dense symmetric Pearson coefficient matrix with unit diagonal.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub region: String,
    pub factors: Vec<String>,
    pub coefficients: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.coefficients[row][col]
    }
}

/// Fixed-width resampling buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ResampleInterval {
    Hourly,
    Daily,
}

/// One resampling bucket: per-factor means over `count` observations.
#[derive(Debug, Clone)]
pub struct ResampledBucket {
    pub start: NaiveDateTime,
    pub means: Vec<f64>,
    pub count: usize,
}

/// Resampled series for one region, buckets in ascending time order.
#[derive(Debug, Clone)]
pub struct ResampledSeries {
    pub region: String,
    pub interval: ResampleInterval,
    pub factors: Vec<String>,
    pub buckets: Vec<ResampledBucket>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDirection {
    Rising,
    Falling,
    Flat,
}

/// Sign and magnitude of a linear fit over a resampled factor series.
#[derive(Debug, Clone, Serialize)]
pub struct TrendSummary {
    pub factor: String,
    pub slope: f64,
    pub direction: TrendDirection,
}

/// Statistic a ranking criterion reads from a factor summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
pub enum RankStatistic {
    Mean,
    Median,
    P95,
}

impl RankStatistic {
    pub fn extract(&self, summary: &FactorSummary) -> f64 {
        match self {
            RankStatistic::Mean => summary.mean,
            RankStatistic::Median => summary.median,
            RankStatistic::P95 => summary.percentile_95,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RankStatistic::Mean => "mean",
            RankStatistic::Median => "median",
            RankStatistic::P95 => "p95",
        }
    }
}

/// What to rank regions by. Higher values rank first.
#[derive(Debug, Clone, Serialize)]
pub struct RankingCriterion {
    pub factor: String,
    pub statistic: RankStatistic,
}

/// One ranked region in a comparison report.
#[derive(Debug, Clone, Serialize)]
pub struct RankedRegion {
    pub region: String,
    pub rank: usize,
    pub value: f64,
    pub justification: String,
}

/// Cross-region ranking; read-only once produced.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub criterion: RankingCriterion,
    pub entries: Vec<RankedRegion>,
    /// Regions left out of the ranking, with the reason.
    pub excluded: Vec<(String, String)>,
}
