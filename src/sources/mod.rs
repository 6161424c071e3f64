//! Where raw per-asset call counts come from

mod file;
mod graphql;
pub mod identity;

pub use file::FileSource;
pub use graphql::GraphqlSource;

use crate::config::Settings;
use crate::types::{DateRange, Granularity, ProductKeyMetrics};
use crate::utils::paths;
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Parameters of one metrics fetch
#[derive(Debug, Clone)]
pub struct MetricsQuery {
    pub email: Option<String>,
    pub range: DateRange,
    pub granularity: Granularity,
}

impl MetricsQuery {
    pub fn new(range: DateRange, granularity: Granularity) -> Self {
        Self {
            email: None,
            range,
            granularity,
        }
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }
}

/// Base trait for all metrics sources
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Get the source's unique name
    fn name(&self) -> &'static str;

    /// Get the source's display name
    fn display_name(&self) -> String;

    /// Whether the query must carry the current user's email
    fn needs_identity(&self) -> bool;

    /// Fetch raw `productKeysWithFilters` results for the query
    async fn fetch(&self, query: &MetricsQuery) -> Result<Vec<ProductKeyMetrics>>;
}

/// An explicit input file wins, then the configured endpoint, then the
/// default export location
pub fn select_source(input: Option<PathBuf>, settings: &Settings) -> Box<dyn MetricsSource> {
    if let Some(path) = input {
        return Box::new(FileSource::new(path));
    }
    if let Some(ref endpoint) = settings.endpoint {
        return Box::new(GraphqlSource::new(endpoint.clone(), settings.token.clone()));
    }
    Box::new(FileSource::new(
        paths::default_metrics_file().unwrap_or_else(|| PathBuf::from("metrics.json")),
    ))
}
