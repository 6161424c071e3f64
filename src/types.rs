//! Core types for apiusage

use crate::error::AnalyticsError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Inclusive calendar date range selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, AnalyticsError> {
        if from > to {
            return Err(AnalyticsError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.from, self.to)
    }
}

/// Aggregation bucket size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    /// Interval name understood by the metrics backend
    pub fn interval(&self) -> &'static str {
        match self {
            Granularity::Daily => "days",
            Granularity::Weekly => "weeks",
            Granularity::Monthly => "months",
        }
    }

    /// Capitalized period name shown above the chart
    pub fn period_name(&self) -> &'static str {
        match self {
            Granularity::Daily => "Days",
            Granularity::Weekly => "Weeks",
            Granularity::Monthly => "Months",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Daily => write!(f, "Daily"),
            Granularity::Weekly => write!(f, "Weekly"),
            Granularity::Monthly => write!(f, "Monthly"),
        }
    }
}

/// Granularity decision for a request, carrying the epoch-ms anchor of
/// bucket 0 and the number of buckets covering the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodPlan {
    Daily { anchor: i64, count: usize },
    Weekly { anchor: i64, count: usize },
    Monthly { anchor: i64, count: usize },
}

impl PeriodPlan {
    pub fn granularity(&self) -> Granularity {
        match self {
            PeriodPlan::Daily { .. } => Granularity::Daily,
            PeriodPlan::Weekly { .. } => Granularity::Weekly,
            PeriodPlan::Monthly { .. } => Granularity::Monthly,
        }
    }

    pub fn anchor(&self) -> i64 {
        match *self {
            PeriodPlan::Daily { anchor, .. }
            | PeriodPlan::Weekly { anchor, .. }
            | PeriodPlan::Monthly { anchor, .. } => anchor,
        }
    }

    pub fn count(&self) -> usize {
        match *self {
            PeriodPlan::Daily { count, .. }
            | PeriodPlan::Weekly { count, .. }
            | PeriodPlan::Monthly { count, .. } => count,
        }
    }
}

/// One raw observation for one asset on one day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallRecord {
    /// Epoch milliseconds (UTC midnight of the observed day)
    pub date: i64,
    pub count: u64,
}

/// Bucketed usage for one (asset, product) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSeries {
    /// Asset id followed by product id
    pub id: String,
    pub label: String,
    pub bucketed_counts: Vec<u64>,
    pub product_id: String,
    pub colour: String,
}

impl AssetSeries {
    pub fn total(&self) -> u64 {
        self.bucketed_counts.iter().sum()
    }
}

// Raw backend shapes. Everything is optional and lists skip items they can't
// read, so malformed data is filtered out instead of failing the response.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Product {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Asset {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductMetric {
    pub product: Option<Product>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMetric {
    pub asset: Option<Asset>,
    #[serde(default, deserialize_with = "epoch_ms")]
    pub date: Option<i64>,
    #[serde(default, deserialize_with = "call_count")]
    pub total_call_count: u64,
}

/// One item of `productKeysWithFilters`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductKeyMetrics {
    #[serde(default, deserialize_with = "lenient_list")]
    pub product_metrics: Vec<ProductMetric>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub asset_metrics: Vec<AssetMetric>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsData {
    #[serde(default, deserialize_with = "lenient_list")]
    pub product_keys_with_filters: Vec<ProductKeyMetrics>,
}

/// A `null` list reads as empty; items that are `null` or the wrong shape
/// are skipped
pub fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Item<T> {
        Valid(T),
        Skipped(IgnoredAny),
    }

    let items = Option::<Vec<Item<T>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Item::Valid(value) => Some(value),
            Item::Skipped(_) => None,
        })
        .collect())
}

/// Call counts that are missing, negative or not a number count as zero
fn call_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCount {
        Unsigned(u64),
        Float(f64),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<RawCount>::deserialize(deserializer)? {
        Some(RawCount::Unsigned(n)) => n,
        Some(RawCount::Float(n)) if n.is_finite() && n > 0.0 => n as u64,
        Some(RawCount::Text(s)) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    })
}

/// The backend sends dates either as numbers or as numeric strings
fn epoch_ms<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDate {
        Number(i64),
        Float(f64),
        Text(String),
        Other(IgnoredAny),
    }

    let ms = match Option::<RawDate>::deserialize(deserializer)? {
        Some(RawDate::Number(ms)) => Some(ms),
        Some(RawDate::Float(ms)) if ms.is_finite() => Some(ms as i64),
        Some(RawDate::Text(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    // Timestamps outside chrono's calendar can't be bucketed or labelled
    Ok(ms.filter(|&ms| DateTime::<Utc>::from_timestamp_millis(ms).is_some()))
}

/// Per-series payload handed to the charting layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPayload {
    pub id: String,
    pub label: String,
    /// JSON text array of bucketed counts
    pub calls: String,
    pub product_id: String,
    pub colour: String,
}

/// Complete chart payload for one request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChartPayload {
    pub period: String,
    /// JSON text array of axis labels
    pub axis_labels: String,
    pub series: Vec<SeriesPayload>,
}

/// CLI output format
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}
