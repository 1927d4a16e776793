use crate::structs::{ComparisonReport, RankedRegion, RankingCriterion, SummaryStatistics};
use log::{debug, warn};
use std::cmp::Ordering;

/// Ranks regions by the criterion, highest value first.
///
/// The ordering is total: ties on the criterion value are broken by region
/// name, ascending. Regions without the criterion factor, or whose value is
/// NaN, are excluded with a reason instead of aborting the comparison, so a
/// partial batch still ranks whatever survived.
pub fn rank(stats: &[SummaryStatistics], criterion: &RankingCriterion) -> ComparisonReport {
    let mut excluded = Vec::new();
    let mut candidates: Vec<(&str, f64)> = Vec::new();

    for regional in stats {
        match regional.factors.get(&criterion.factor) {
            None => {
                warn!(
                    "Excluding {} from ranking: no factor {}",
                    regional.region, criterion.factor
                );
                excluded.push((
                    regional.region.clone(),
                    format!("factor {} not present", criterion.factor),
                ));
            }
            Some(summary) => {
                let value = criterion.statistic.extract(summary);
                if value.is_nan() {
                    excluded.push((
                        regional.region.clone(),
                        format!(
                            "{} {} is not a number",
                            criterion.statistic.label(),
                            criterion.factor
                        ),
                    ));
                } else {
                    candidates.push((&regional.region, value));
                }
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });

    let entries = candidates
        .into_iter()
        .enumerate()
        .map(|(i, (region, value))| RankedRegion {
            region: region.to_string(),
            rank: i + 1,
            value,
            justification: format!(
                "{} {} = {:.2}",
                criterion.statistic.label(),
                criterion.factor,
                value
            ),
        })
        .collect::<Vec<_>>();

    debug!(
        "Ranked {} region(s) by {} {}, {} excluded",
        entries.len(),
        criterion.statistic.label(),
        criterion.factor,
        excluded.len()
    );
    ComparisonReport {
        criterion: criterion.clone(),
        entries,
        excluded,
    }
}
