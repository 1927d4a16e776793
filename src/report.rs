use crate::error::{AnalysisError, Result};
use crate::structs::{
    CleanReport, ComparisonReport, CorrelationMatrix, Dataset, ResampledSeries,
    SummaryStatistics, TrendSummary,
};
use log::debug;
use plotters::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Everything one batch run produced, for the machine-readable report.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub comparison: ComparisonReport,
    pub statistics: Vec<SummaryStatistics>,
    pub cleaning: BTreeMap<String, CleanReport>,
    pub trends: BTreeMap<String, Vec<TrendSummary>>,
    pub failed_regions: BTreeMap<String, String>,
}

fn render_err(e: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::Render(e.to_string())
}

/// Renders one region's summary statistics as a fixed-width text table.
pub fn render_summary<W: Write>(stats: &SummaryStatistics, out: &mut W) -> Result<()> {
    writeln!(out, "Summary statistics: {}", stats.region).map_err(render_err)?;
    writeln!(
        out,
        "{:<12} {:>8} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Factor", "Count", "Mean", "Median", "StdDev", "Min", "Max", "P25", "P95"
    )
    .map_err(render_err)?;
    for (factor, s) in &stats.factors {
        writeln!(
            out,
            "{:<12} {:>8} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
            factor,
            s.count,
            s.mean,
            s.median,
            s.std_dev,
            s.min,
            s.max,
            s.percentile_25,
            s.percentile_95
        )
        .map_err(render_err)?;
    }
    Ok(())
}

/// Renders a correlation matrix as a text table, NaN cells as `n/a`.
pub fn render_correlation<W: Write>(matrix: &CorrelationMatrix, out: &mut W) -> Result<()> {
    writeln!(out, "Pearson correlations: {}", matrix.region).map_err(render_err)?;
    write!(out, "{:<12}", "").map_err(render_err)?;
    for factor in &matrix.factors {
        write!(out, " {:>8}", factor).map_err(render_err)?;
    }
    writeln!(out).map_err(render_err)?;
    for (i, factor) in matrix.factors.iter().enumerate() {
        write!(out, "{:<12}", factor).map_err(render_err)?;
        for j in 0..matrix.factors.len() {
            let r = matrix.get(i, j);
            if r.is_nan() {
                write!(out, " {:>8}", "n/a").map_err(render_err)?;
            } else {
                write!(out, " {:>8.3}", r).map_err(render_err)?;
            }
        }
        writeln!(out).map_err(render_err)?;
    }
    Ok(())
}

/// Renders the cross-region ranking, including excluded regions.
pub fn render_comparison<W: Write>(report: &ComparisonReport, out: &mut W) -> Result<()> {
    writeln!(
        out,
        "Region ranking by {} {} (highest first)",
        report.criterion.statistic.label(),
        report.criterion.factor
    )
    .map_err(render_err)?;
    for entry in &report.entries {
        writeln!(
            out,
            "  {}. {:<16} {}",
            entry.rank, entry.region, entry.justification
        )
        .map_err(render_err)?;
    }
    for (region, reason) in &report.excluded {
        writeln!(out, "  -- {:<16} excluded: {}", region, reason).map_err(render_err)?;
    }
    Ok(())
}

/// Writes all regions' summary statistics to a single CSV, one row per
/// region-factor pair, numeric fields rounded to two decimals.
pub fn write_summary_csv(stats: &[SummaryStatistics], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record([
        "Region",
        "Factor",
        "Count",
        "Mean",
        "Median",
        "Std_Dev",
        "Min",
        "Max",
        "Percentile_25",
        "Percentile_75",
        "Percentile_90",
        "Percentile_95",
    ])?;

    for regional in stats {
        for (factor, s) in &regional.factors {
            writer.write_record(&[
                regional.region.clone(),
                factor.clone(),
                s.count.to_string(),
                format!("{:.2}", s.mean),
                format!("{:.2}", s.median),
                format!("{:.2}", s.std_dev),
                format!("{:.2}", s.min),
                format!("{:.2}", s.max),
                format!("{:.2}", s.percentile_25),
                format!("{:.2}", s.percentile_75),
                format!("{:.2}", s.percentile_90),
                format!("{:.2}", s.percentile_95),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Writes the full analysis report as pretty-printed JSON.
pub fn write_report_json(report: &AnalysisReport, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}

/// Line chart of one factor's resampled means across regions.
///
/// The x axis is elapsed time since the earliest bucket of any series, in
/// hours, so regions with offset measurement campaigns still share a frame.
pub fn time_series_chart(
    series: &[&ResampledSeries],
    factor: &str,
    output_path: &Path,
) -> Result<()> {
    let mut lines: Vec<(&str, Vec<(f64, f64)>)> = Vec::new();
    let origin = series
        .iter()
        .flat_map(|s| s.buckets.first())
        .map(|b| b.start)
        .min()
        .ok_or_else(|| render_err("no buckets to chart"))?;

    for s in series {
        let Some(index) = s.factors.iter().position(|f| f == factor) else {
            continue;
        };
        let points: Vec<(f64, f64)> = s
            .buckets
            .iter()
            .map(|b| {
                let hours = (b.start - origin).num_minutes() as f64 / 60.0;
                (hours, b.means[index])
            })
            .collect();
        lines.push((&s.region, points));
    }
    if lines.is_empty() {
        return Err(render_err(format!("factor {} absent from all series", factor)));
    }

    let x_max = lines
        .iter()
        .flat_map(|(_, pts)| pts.iter().map(|p| p.0))
        .fold(f64::NEG_INFINITY, f64::max);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for (_, pts) in &lines {
        for (_, y) in pts {
            y_min = y_min.min(*y);
            y_max = y_max.max(*y);
        }
    }
    if y_min == y_max {
        y_min -= 1.0;
        y_max += 1.0;
    }

    let area = BitMapBackend::new(output_path, (1024, 576)).into_drawing_area();
    area.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&area)
        .caption(format!("{} over time", factor), ("sans-serif", 24))
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .margin(10)
        .build_cartesian_2d(0.0..x_max.max(1.0), y_min..y_max)
        .map_err(render_err)?;
    chart
        .configure_mesh()
        .x_desc("Hours since start")
        .y_desc(factor)
        .draw()
        .map_err(render_err)?;

    for (k, (region, points)) in lines.iter().enumerate() {
        let color = Palette99::pick(k).to_rgba();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), &color))
            .map_err(render_err)?
            .label(region.to_string())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }
    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .position(SeriesLabelPosition::UpperRight)
        .draw()
        .map_err(render_err)?;
    area.present().map_err(render_err)?;
    debug!("Wrote time-series chart to {}", output_path.display());
    Ok(())
}

/// Red-white-blue cell color for a correlation coefficient in [-1, 1].
fn heat_color(r: f64) -> RGBColor {
    if r.is_nan() {
        return RGBColor(180, 180, 180);
    }
    let t = r.clamp(-1.0, 1.0);
    if t >= 0.0 {
        // white -> red
        let c = (255.0 * (1.0 - t)) as u8;
        RGBColor(255, c, c)
    } else {
        // white -> blue
        let c = (255.0 * (1.0 + t)) as u8;
        RGBColor(c, c, 255)
    }
}

/// Heatmap of one region's correlation matrix.
pub fn correlation_heatmap(matrix: &CorrelationMatrix, output_path: &Path) -> Result<()> {
    let n = matrix.factors.len();
    let area = BitMapBackend::new(output_path, (768, 768)).into_drawing_area();
    area.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&area)
        .caption(
            format!("Correlation matrix: {}", matrix.region),
            ("sans-serif", 24),
        )
        .set_label_area_size(LabelAreaPosition::Left, 80)
        .set_label_area_size(LabelAreaPosition::Bottom, 60)
        .margin(10)
        .build_cartesian_2d(0.0..n as f64, 0.0..n as f64)
        .map_err(render_err)?;

    let x_factors = matrix.factors.clone();
    let y_factors = matrix.factors.clone();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&move |x| {
            x_factors
                .get(x.floor() as usize)
                .cloned()
                .unwrap_or_default()
        })
        .y_label_formatter(&move |y| {
            y_factors
                .get(y.floor() as usize)
                .cloned()
                .unwrap_or_default()
        })
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series((0..n).flat_map(|i| {
            (0..n).map(move |j| {
                let color = heat_color(matrix.get(i, j));
                Rectangle::new(
                    [(j as f64, i as f64), (j as f64 + 1.0, i as f64 + 1.0)],
                    color.filled(),
                )
            })
        }))
        .map_err(render_err)?;
    area.present().map_err(render_err)?;
    debug!("Wrote correlation heatmap to {}", output_path.display());
    Ok(())
}

/// Histogram of one factor's distribution in a cleaned dataset.
pub fn distribution_chart(dataset: &Dataset, factor: &str, output_path: &Path) -> Result<()> {
    let index = dataset
        .factor_index(factor)
        .ok_or_else(|| render_err(format!("no factor {} in {}", factor, dataset.region)))?;
    let values = dataset.factor_values(index);
    if values.is_empty() {
        return Err(render_err("no values to chart"));
    }

    let min = values.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max = values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let bins = 40usize;
    let width = if max > min { (max - min) / bins as f64 } else { 1.0 };
    let mut counts = vec![0usize; bins];
    for v in &values {
        let b = (((v - min) / width) as usize).min(bins - 1);
        counts[b] += 1;
    }
    let tallest = *counts.iter().max().unwrap_or(&1) as f64;

    let area = BitMapBackend::new(output_path, (1024, 576)).into_drawing_area();
    area.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&area)
        .caption(
            format!("{} distribution: {}", factor, dataset.region),
            ("sans-serif", 24),
        )
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .margin(10)
        .build_cartesian_2d(min..(min + width * bins as f64), 0.0..tallest * 1.05)
        .map_err(render_err)?;
    chart
        .configure_mesh()
        .x_desc(factor)
        .y_desc("Observations")
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(counts.iter().enumerate().map(|(b, &count)| {
            let x0 = min + b as f64 * width;
            Rectangle::new([(x0, 0.0), (x0 + width, count as f64)], BLUE.mix(0.6).filled())
        }))
        .map_err(render_err)?;
    area.present().map_err(render_err)?;
    debug!("Wrote distribution chart to {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::{FactorSummary, RankStatistic, RankedRegion, RankingCriterion};

    fn stats() -> SummaryStatistics {
        let mut factors = BTreeMap::new();
        factors.insert(
            "GHI".to_string(),
            FactorSummary {
                count: 3,
                mean: 200.0,
                median: 210.0,
                std_dev: 12.5,
                min: 180.0,
                max: 220.0,
                percentile_25: 190.0,
                percentile_75: 215.0,
                percentile_90: 218.0,
                percentile_95: 219.0,
            },
        );
        SummaryStatistics {
            region: "benin".to_string(),
            factors,
        }
    }

    #[test]
    fn summary_table_lists_each_factor() {
        let mut out = Vec::new();
        render_summary(&stats(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("benin"));
        assert!(text.contains("GHI"));
        assert!(text.contains("200.00"));
    }

    #[test]
    fn correlation_table_shows_nan_as_na() {
        let matrix = CorrelationMatrix {
            region: "togo".to_string(),
            factors: vec!["GHI".to_string(), "Const".to_string()],
            coefficients: vec![vec![1.0, f64::NAN], vec![f64::NAN, 1.0]],
        };
        let mut out = Vec::new();
        render_correlation(&matrix, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("n/a"));
        assert!(text.contains("1.000"));
    }

    #[test]
    fn comparison_table_keeps_rank_order() {
        let report = ComparisonReport {
            criterion: RankingCriterion {
                factor: "GHI".to_string(),
                statistic: RankStatistic::Mean,
            },
            entries: vec![RankedRegion {
                region: "benin".to_string(),
                rank: 1,
                value: 250.0,
                justification: "mean GHI = 250.00".to_string(),
            }],
            excluded: vec![("togo".to_string(), "factor GHI not present".to_string())],
        };
        let mut out = Vec::new();
        render_comparison(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1. benin"));
        assert!(text.contains("excluded"));
    }

    #[test]
    fn summary_csv_has_one_row_per_region_factor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        write_summary_csv(&[stats()], &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("Region,Factor,Count"));
        assert!(lines.next().unwrap().starts_with("benin,GHI,3,200.00"));
    }

    #[test]
    fn heat_color_endpoints() {
        assert_eq!(heat_color(1.0), RGBColor(255, 0, 0));
        assert_eq!(heat_color(-1.0), RGBColor(0, 0, 255));
        assert_eq!(heat_color(0.0), RGBColor(255, 255, 255));
        assert_eq!(heat_color(f64::NAN), RGBColor(180, 180, 180));
    }
}
