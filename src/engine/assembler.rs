//! Metrics assembly
//! Turns raw `productKeysWithFilters` results into coloured, bucketed series
//! that all share one period plan and one set of axis labels.

use super::bucketer::{bucket_counts, OutOfRange};
use super::classifier::classify;
use super::labels::axis_labels;
use super::palette::Palette;
use super::seen::SeenSeries;
use crate::error::AnalyticsError;
use crate::types::{
    Asset, AssetSeries, CallRecord, ChartPayload, DateRange, Granularity, PeriodPlan, Product,
    ProductKeyMetrics, SeriesPayload,
};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Raw records for one (asset, product) pair before bucketing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedSeries {
    pub id: String,
    pub label: String,
    pub product_id: String,
    pub calls: Vec<CallRecord>,
}

/// Everything the chart needs for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartData {
    pub granularity: Granularity,
    pub axis_labels: Vec<String>,
    pub series: Vec<AssetSeries>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Encode counts and labels as JSON text arrays for the charting layer
    pub fn to_payload(&self) -> Result<ChartPayload, AnalyticsError> {
        let series = self
            .series
            .iter()
            .map(|s| {
                Ok(SeriesPayload {
                    id: s.id.clone(),
                    label: s.label.clone(),
                    calls: serde_json::to_string(&s.bucketed_counts)?,
                    product_id: s.product_id.clone(),
                    colour: s.colour.clone(),
                })
            })
            .collect::<Result<Vec<_>, AnalyticsError>>()?;

        Ok(ChartPayload {
            period: self.granularity.period_name().to_string(),
            axis_labels: serde_json::to_string(&self.axis_labels)?,
            series,
        })
    }
}

/// Keep results that have a product and at least one asset with calls
pub fn filter_relevant(results: &[ProductKeyMetrics]) -> Vec<&ProductKeyMetrics> {
    results
        .iter()
        .filter(|r| {
            !r.product_metrics.is_empty()
                && r.asset_metrics.iter().any(|m| m.total_call_count > 0)
        })
        .collect()
}

/// Each product key carries a single product; take the first complete one
fn product_of(result: &ProductKeyMetrics) -> Option<(&str, &str)> {
    result.product_metrics.iter().find_map(|pm| match &pm.product {
        Some(Product { id: Some(id), name }) => {
            Some((id.as_str(), name.as_deref().unwrap_or(id.as_str())))
        }
        _ => None,
    })
}

/// Group asset metrics into one series per asset id + product id, in the
/// order each pair is first seen
pub fn merge_series(results: &[&ProductKeyMetrics]) -> Vec<MergedSeries> {
    let mut merged: Vec<MergedSeries> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut skipped = 0usize;

    for result in results {
        let Some((product_id, product_name)) = product_of(result) else {
            skipped += result.asset_metrics.len();
            continue;
        };

        for metric in &result.asset_metrics {
            let (asset_id, asset_name, date) = match (&metric.asset, metric.date) {
                (Some(Asset { id: Some(id), name }), Some(date)) => (id.as_str(), name, date),
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            let id = format!("{}{}", asset_id, product_id);
            let call = CallRecord {
                date,
                count: metric.total_call_count,
            };

            match positions.get(&id) {
                Some(&pos) => merged[pos].calls.push(call),
                None => {
                    let asset_name = asset_name.as_deref().unwrap_or(asset_id);
                    positions.insert(id.clone(), merged.len());
                    merged.push(MergedSeries {
                        id,
                        label: format!("{} ({})", asset_name, product_name),
                        product_id: product_id.to_string(),
                        calls: vec![call],
                    });
                }
            }
        }
    }

    if skipped > 0 {
        debug!(skipped, "dropped incomplete asset metrics");
    }
    merged
}

pub struct MetricsAssembler {
    palette: Palette,
}

impl MetricsAssembler {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn assemble(&self, range: &DateRange, results: &[ProductKeyMetrics]) -> ChartData {
        self.assemble_plan(&classify(range), results)
    }

    /// Build the chart for a plan that was already classified for this request
    pub fn assemble_plan(&self, plan: &PeriodPlan, results: &[ProductKeyMetrics]) -> ChartData {
        let relevant = filter_relevant(results);
        let merged = merge_series(&relevant);
        debug!(
            granularity = %plan.granularity(),
            periods = plan.count(),
            results = results.len(),
            relevant = relevant.len(),
            series = merged.len(),
            "assembling chart"
        );

        let series = merged
            .into_iter()
            .enumerate()
            .map(|(i, m)| AssetSeries {
                bucketed_counts: self.bucket(plan, &m),
                colour: self.palette.colour_for(i).to_string(),
                id: m.id,
                label: m.label,
                product_id: m.product_id,
            })
            .collect();

        ChartData {
            granularity: plan.granularity(),
            axis_labels: axis_labels(plan),
            series,
        }
    }

    /// Like `assemble_plan`, but leaves out series already in `seen` and
    /// records the ones it returns. Colours follow merge order, so a series
    /// keeps its colour across incremental updates.
    pub fn assemble_incremental(
        &self,
        plan: &PeriodPlan,
        results: &[ProductKeyMetrics],
        seen: &mut SeenSeries,
    ) -> ChartData {
        let mut chart = self.assemble_plan(plan, results);
        let before = chart.series.len();
        chart.series = seen.retain_unseen(chart.series);
        debug!(
            kept = chart.series.len(),
            already_seen = before - chart.series.len(),
            seen = seen.len(),
            "filtered seen series"
        );
        chart
    }

    fn bucket(&self, plan: &PeriodPlan, series: &MergedSeries) -> Vec<u64> {
        // Clamp never fails; it only reports how many records were folded
        match bucket_counts(plan, &series.calls, OutOfRange::Clamp) {
            Ok(bucketed) => {
                if bucketed.clamped > 0 {
                    warn!(
                        series = %series.id,
                        clamped = bucketed.clamped,
                        periods = plan.count(),
                        "records outside the requested range were clamped"
                    );
                }
                bucketed.counts
            }
            Err(e) => {
                warn!(series = %series.id, error = %e, "bucketing failed");
                vec![0; plan.count()]
            }
        }
    }
}

impl Default for MetricsAssembler {
    fn default() -> Self {
        Self::new(Palette::default())
    }
}
