//! Local JSON export
//! Accepts a saved GraphQL response, the bare `productKeysWithFilters`
//! object, or just the array.

use super::{MetricsQuery, MetricsSource};
use crate::types::{lenient_list, MetricsData, ProductKeyMetrics};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Export {
    // Tried in order; a struct variant would also accept a JSON array
    List(#[serde(deserialize_with = "lenient_list")] Vec<ProductKeyMetrics>),
    Envelope { data: MetricsData },
    Data(MetricsData),
}

impl Export {
    fn into_results(self) -> Vec<ProductKeyMetrics> {
        match self {
            Export::Envelope { data } | Export::Data(data) => data.product_keys_with_filters,
            Export::List(results) => results,
        }
    }
}

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn parse(content: &str) -> Result<Vec<ProductKeyMetrics>> {
        let export: Export =
            serde_json::from_str(content).context("unrecognised metrics export format")?;
        Ok(export.into_results())
    }
}

#[async_trait]
impl MetricsSource for FileSource {
    fn name(&self) -> &'static str {
        "file"
    }

    fn display_name(&self) -> String {
        format!("Export file {}", self.path.display())
    }

    fn needs_identity(&self) -> bool {
        false
    }

    async fn fetch(&self, _query: &MetricsQuery) -> Result<Vec<ProductKeyMetrics>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let results = Self::parse(&content)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), results = results.len(), "loaded export");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DateRange, Granularity};
    use chrono::NaiveDate;
    use std::io::Write;

    const ITEM: &str = r#"{
        "productMetrics": [{"product": {"id": "P1", "name": "Gold"}}],
        "assetMetrics": [{"asset": {"id": "A1", "name": "Orders"}, "date": "1704067200000", "totalCallCount": 3}]
    }"#;

    fn query() -> MetricsQuery {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        MetricsQuery::new(DateRange::new(day, day).unwrap(), Granularity::Daily)
    }

    #[test]
    fn test_parse_all_export_shapes() {
        let envelope = format!(r#"{{"data": {{"productKeysWithFilters": [{}]}}}}"#, ITEM);
        let data = format!(r#"{{"productKeysWithFilters": [{}, {}]}}"#, ITEM, ITEM);
        let list = format!("[{}]", ITEM);

        assert_eq!(FileSource::parse(&envelope).unwrap().len(), 1);
        assert_eq!(FileSource::parse(&data).unwrap().len(), 2);
        let results = FileSource::parse(&list).unwrap();
        assert_eq!(results[0].asset_metrics[0].date, Some(1_704_067_200_000));
    }

    #[test]
    fn test_parse_skips_null_items_in_bare_array() {
        let list = format!("[null, {}, 42]", ITEM);
        let results = FileSource::parse(&list).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].asset_metrics[0].total_call_count, 3);
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(FileSource::parse("not json").is_err());
    }

    #[tokio::test]
    async fn test_fetch_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[{}]", ITEM).unwrap();

        let source = FileSource::new(file.path().to_path_buf());
        let results = source.fetch(&query()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].asset_metrics[0].total_call_count, 3);
    }

    #[tokio::test]
    async fn test_fetch_missing_file_names_path() {
        let source = FileSource::new(PathBuf::from("/nonexistent/apiusage/metrics.json"));
        let err = source.fetch(&query()).await.unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/apiusage/metrics.json"));
    }
}
