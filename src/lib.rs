pub mod clean;
pub mod compare;
pub mod error;
pub mod export;
pub mod load;
pub mod report;
pub mod stats;
pub mod structs;
pub mod timeseries;

// Re-export public API
pub use clean::clean;
pub use compare::rank;
pub use error::{AnalysisError, Result};
pub use export::{write_clean_csv, write_clean_parquet};
pub use load::load_dataset;
pub use report::{
    correlation_heatmap, distribution_chart, render_comparison, render_correlation,
    render_summary, time_series_chart, write_report_json, write_summary_csv, AnalysisReport,
};
pub use stats::{correlation_matrix, summarize};
pub use structs::{
    CleanConfig, CleanReport, ComparisonReport, CorrelationMatrix, Dataset, FactorSummary,
    MeasurementRecord, PlausibleRange, RankStatistic, RankedRegion, RankingCriterion, RawDataset,
    RawRecord, ResampleInterval, ResampledBucket, ResampledSeries, SummaryStatistics,
    TrendDirection, TrendSummary,
};
pub use timeseries::{resample, trends};
