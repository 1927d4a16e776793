use clap::Parser;
use log::{debug, error, warn};
use rayon::prelude::*;
use solar_survey::{
    clean, correlation_heatmap, correlation_matrix, distribution_chart, load_dataset, rank,
    render_comparison, render_correlation, render_summary, resample, summarize,
    time_series_chart, trends, write_clean_csv, write_clean_parquet, write_report_json,
    write_summary_csv, AnalysisError, AnalysisReport, CleanConfig, CleanReport, CorrelationMatrix,
    Dataset, PlausibleRange, RankStatistic, RankingCriterion, ResampleInterval, ResampledSeries,
    SummaryStatistics, TrendDirection, TrendSummary,
};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Region to analyze, as NAME=PATH to its measurement CSV. Repeatable.
    #[arg(short, long = "region", value_parser = parse_region, required = true)]
    regions: Vec<(String, PathBuf)>,

    /// Directory the reports and charts are written to
    #[arg(short, long, default_value = "output")]
    out_dir: PathBuf,

    /// Resampling interval for the time-series analysis
    #[arg(long, value_enum, default_value_t = ResampleInterval::Daily)]
    interval: ResampleInterval,

    /// Factor the region ranking is based on
    #[arg(long, default_value = "GHI")]
    rank_by: String,

    /// Statistic the region ranking reads from the factor summary
    #[arg(long, value_enum, default_value_t = RankStatistic::Mean)]
    rank_stat: RankStatistic,

    /// Plausible range override, as FACTOR=MIN..MAX. Repeatable.
    #[arg(long = "bounds", value_parser = parse_bounds)]
    bounds: Vec<(String, PlausibleRange)>,

    /// Also write the cleaned datasets as CSV and Parquet
    #[arg(long, default_value_t = false)]
    export_clean: bool,

    /// Skip PNG chart rendering
    #[arg(long, default_value_t = false)]
    no_charts: bool,

    /// Log level for output
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn parse_region(spec: &str) -> Result<(String, PathBuf), String> {
    match spec.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=PATH, got `{}`", spec)),
    }
}

fn parse_bounds(spec: &str) -> Result<(String, PlausibleRange), String> {
    let (factor, range) = spec
        .split_once('=')
        .ok_or_else(|| format!("expected FACTOR=MIN..MAX, got `{}`", spec))?;
    let (min, max) = range
        .split_once("..")
        .ok_or_else(|| format!("expected FACTOR=MIN..MAX, got `{}`", spec))?;
    let min: f64 = min.parse().map_err(|_| format!("bad minimum `{}`", min))?;
    let max: f64 = max.parse().map_err(|_| format!("bad maximum `{}`", max))?;
    if min > max {
        return Err(format!("empty range {}..{}", min, max));
    }
    Ok((factor.to_string(), PlausibleRange { min, max }))
}

/// Per-region results of the parallel phase.
struct RegionAnalysis {
    dataset: Dataset,
    clean_report: CleanReport,
    summary: SummaryStatistics,
    correlations: CorrelationMatrix,
    series: ResampledSeries,
    trends: Vec<TrendSummary>,
}

fn analyze_region(
    name: &str,
    path: &PathBuf,
    config: &CleanConfig,
    interval: ResampleInterval,
) -> Result<RegionAnalysis, AnalysisError> {
    let raw = load_dataset(path, name)?;
    let (dataset, clean_report) = clean(raw, config);
    let summary = summarize(&dataset)?;
    let correlations = correlation_matrix(&dataset)?;
    let series = resample(&dataset, interval)?;
    let trends = trends(&series);
    Ok(RegionAnalysis {
        dataset,
        clean_report,
        summary,
        correlations,
        series,
        trends,
    })
}

fn direction_label(direction: TrendDirection) -> &'static str {
    match direction {
        TrendDirection::Rising => "rising",
        TrendDirection::Falling => "falling",
        TrendDirection::Flat => "flat",
    }
}

fn main() -> Result<(), AnalysisError> {
    let total_start = Instant::now();
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        if args.debug { "debug" } else { "info" },
    ))
    .init();

    let mut config = CleanConfig::default();
    for (factor, range) in &args.bounds {
        config.bounds.insert(factor.clone(), *range);
    }
    let criterion = RankingCriterion {
        factor: args.rank_by.clone(),
        statistic: args.rank_stat,
    };

    // Deterministic processing and reporting order, whatever the CLI order.
    let mut regions = args.regions.clone();
    regions.sort_by(|a, b| a.0.cmp(&b.0));

    println!(
        "solar-survey: analyzing {} region(s), ranking by {} {}",
        regions.len(),
        criterion.statistic.label(),
        criterion.factor
    );
    debug!(
        "Interval: {} | Output: {}",
        args.interval.label(),
        args.out_dir.display()
    );

    // Per-region phase; regions are independent, one failure must not stop
    // the others.
    let analysis_start = Instant::now();
    let outcomes: Vec<(String, Result<RegionAnalysis, AnalysisError>)> = regions
        .par_iter()
        .map(|(name, path)| {
            (
                name.clone(),
                analyze_region(name, path, &config, args.interval),
            )
        })
        .collect();
    println!(
        "Per-region analysis completed in {:.2?}",
        analysis_start.elapsed()
    );

    let mut analyses: Vec<RegionAnalysis> = Vec::new();
    let mut failed_regions: BTreeMap<String, String> = BTreeMap::new();
    for (name, outcome) in outcomes {
        match outcome {
            Ok(analysis) => analyses.push(analysis),
            Err(e) => {
                error!("Region {} failed: {}", name, e);
                failed_regions.insert(name, e.to_string());
            }
        }
    }

    let mut stdout = io::stdout().lock();
    for analysis in &analyses {
        println!();
        render_summary(&analysis.summary, &mut stdout)?;
        render_correlation(&analysis.correlations, &mut stdout)?;
        println!(
            "Cleaning: kept {}/{} rows ({} dropped)",
            analysis.clean_report.kept_rows,
            analysis.clean_report.input_rows,
            analysis.clean_report.dropped_rows
        );
        if analysis.trends.is_empty() {
            println!("Trends: not available (fewer than 2 buckets)");
        } else {
            for trend in &analysis.trends {
                println!(
                    "Trend {:<12} {} ({:+.4} per {} bucket)",
                    trend.factor,
                    direction_label(trend.direction),
                    trend.slope,
                    analysis.series.interval.label()
                );
            }
        }
    }

    let summaries: Vec<SummaryStatistics> =
        analyses.iter().map(|a| a.summary.clone()).collect();
    let comparison = rank(&summaries, &criterion);
    println!();
    render_comparison(&comparison, &mut stdout)?;
    drop(stdout);

    fs::create_dir_all(&args.out_dir)?;
    let io_start = Instant::now();
    write_summary_csv(&summaries, &args.out_dir.join("summary.csv"))?;
    let report = AnalysisReport {
        comparison,
        statistics: summaries,
        cleaning: analyses
            .iter()
            .map(|a| (a.dataset.region.clone(), a.clean_report))
            .collect(),
        trends: analyses
            .iter()
            .map(|a| (a.dataset.region.clone(), a.trends.clone()))
            .collect(),
        failed_regions: failed_regions.clone(),
    };
    write_report_json(&report, &args.out_dir.join("report.json"))?;

    if args.export_clean {
        for analysis in &analyses {
            let stem = analysis.dataset.region.to_lowercase().replace(' ', "_");
            write_clean_csv(
                &analysis.dataset,
                &args.out_dir.join(format!("{}_clean.csv", stem)),
            )?;
            write_clean_parquet(
                &analysis.dataset,
                &args.out_dir.join(format!("{}_clean.parquet", stem)),
            )?;
        }
    }

    let mut render_failures = 0usize;
    if !args.no_charts && !analyses.is_empty() {
        let series: Vec<&ResampledSeries> = analyses.iter().map(|a| &a.series).collect();
        let chart_path = args
            .out_dir
            .join(format!("timeseries_{}.png", args.rank_by.to_lowercase()));
        if let Err(e) = time_series_chart(&series, &args.rank_by, &chart_path) {
            error!("Time-series chart failed: {}", e);
            render_failures += 1;
        }
        for analysis in &analyses {
            let stem = analysis.dataset.region.to_lowercase().replace(' ', "_");
            if let Err(e) = correlation_heatmap(
                &analysis.correlations,
                &args.out_dir.join(format!("{}_correlation.png", stem)),
            ) {
                error!("Heatmap for {} failed: {}", analysis.dataset.region, e);
                render_failures += 1;
            }
            if analysis.dataset.factor_index(&args.rank_by).is_none() {
                warn!(
                    "Skipping distribution chart for {}: no factor {}",
                    analysis.dataset.region, args.rank_by
                );
                continue;
            }
            if let Err(e) = distribution_chart(
                &analysis.dataset,
                &args.rank_by,
                &args
                    .out_dir
                    .join(format!("{}_{}_distribution.png", stem, args.rank_by.to_lowercase())),
            ) {
                error!("Distribution chart for {} failed: {}", analysis.dataset.region, e);
                render_failures += 1;
            }
        }
    }
    println!(
        "\nWrote reports to {} in {:.2?}",
        args.out_dir.display(),
        io_start.elapsed()
    );
    println!("Pipeline completed in {:.2?}", total_start.elapsed());

    if !failed_regions.is_empty() {
        return Err(AnalysisError::Batch {
            failed: failed_regions.len(),
            regions: failed_regions
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
        });
    }
    if render_failures > 0 {
        return Err(AnalysisError::Render(format!(
            "{} chart(s) failed to render",
            render_failures
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_spec_splits_on_first_equals() {
        let (name, path) = parse_region("Sierra Leone=data/sl.csv").unwrap();
        assert_eq!(name, "Sierra Leone");
        assert_eq!(path, PathBuf::from("data/sl.csv"));
    }

    #[test]
    fn region_spec_requires_name_and_path() {
        assert!(parse_region("benin").is_err());
        assert!(parse_region("=data/benin.csv").is_err());
        assert!(parse_region("benin=").is_err());
    }

    #[test]
    fn bounds_spec_parses_range() {
        let (factor, range) = parse_bounds("GHI=0..1500").unwrap();
        assert_eq!(factor, "GHI");
        assert_eq!(range, PlausibleRange { min: 0.0, max: 1500.0 });
    }

    #[test]
    fn bounds_spec_accepts_negative_minimum() {
        let (_, range) = parse_bounds("Tamb=-40..60").unwrap();
        assert_eq!(range.min, -40.0);
        assert_eq!(range.max, 60.0);
    }

    #[test]
    fn bounds_spec_rejects_garbage_and_empty_ranges() {
        assert!(parse_bounds("GHI").is_err());
        assert!(parse_bounds("GHI=0").is_err());
        assert!(parse_bounds("GHI=low..high").is_err());
        assert!(parse_bounds("GHI=10..5").is_err());
    }
}
