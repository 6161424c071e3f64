//! GraphQL metrics backend
//! Posts the `productKeysWithFilters` query for the signed-in user

use super::{MetricsQuery, MetricsSource};
use crate::types::{MetricsData, ProductKeyMetrics};
use crate::utils::time::{date_to_epoch_ms, DAY_MS};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const METRICS_QUERY: &str = r#"query ProductKeyMetrics($email: String!, $from: Float!, $to: Float!, $interval: String!) {
  productKeysWithFilters(email: $email) {
    productMetrics(from: $from, to: $to, interval: $interval) {
      product { id name }
    }
    assetMetrics(from: $from, to: $to, interval: $interval) {
      asset { id name }
      date
      totalCallCount
    }
  }
}"#;

#[derive(Debug, Serialize)]
struct Variables<'a> {
    email: &'a str,
    from: i64,
    /// Exclusive: midnight after the last selected day
    to: i64,
    interval: &'static str,
}

#[derive(Debug, Serialize)]
struct Request<'a> {
    query: &'static str,
    variables: Variables<'a>,
}

#[derive(Debug, Deserialize)]
struct Response {
    data: Option<MetricsData>,
    #[serde(default)]
    errors: Vec<ResponseError>,
}

#[derive(Debug, Deserialize)]
struct ResponseError {
    message: String,
}

pub struct GraphqlSource {
    endpoint: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl GraphqlSource {
    pub fn new(endpoint: String, token: Option<String>) -> Self {
        Self {
            endpoint,
            token,
            client: reqwest::Client::new(),
        }
    }

    fn request<'a>(query: &'a MetricsQuery, email: &'a str) -> Request<'a> {
        Request {
            query: METRICS_QUERY,
            variables: Variables {
                email,
                from: date_to_epoch_ms(query.range.from()),
                to: date_to_epoch_ms(query.range.to()) + DAY_MS,
                interval: query.granularity.interval(),
            },
        }
    }

    fn into_results(response: Response) -> Result<Vec<ProductKeyMetrics>> {
        if !response.errors.is_empty() {
            let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
            bail!("metrics query failed: {}", messages.join("; "));
        }
        Ok(response
            .data
            .map(|d| d.product_keys_with_filters)
            .unwrap_or_default())
    }
}

#[async_trait]
impl MetricsSource for GraphqlSource {
    fn name(&self) -> &'static str {
        "graphql"
    }

    fn display_name(&self) -> String {
        format!("GraphQL endpoint {}", self.endpoint)
    }

    fn needs_identity(&self) -> bool {
        true
    }

    async fn fetch(&self, query: &MetricsQuery) -> Result<Vec<ProductKeyMetrics>> {
        let email = query
            .email
            .as_deref()
            .context("the metrics endpoint needs the current user's email")?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .header("User-Agent", concat!("apiusage/", env!("CARGO_PKG_VERSION")))
            .json(&Self::request(query, email));
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            bail!("{} answered {}", self.endpoint, status);
        }

        let body: Response = response
            .json()
            .await
            .context("unexpected metrics response")?;
        let results = Self::into_results(body)?;
        tracing::debug!(endpoint = %self.endpoint, results = results.len(), "fetched metrics");
        Ok(results)
    }
}
