use regionstats_common::{ErrorResponse, MetricsQuery, RegionMetrics, RegionStatsError, Result};

/// RegionStats client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address as `host:port`.
    pub address: String,
}

/// RegionStats Client
pub struct Client {
    pub config: ClientConfig,
    http_client: reqwest::Client,
}

impl Client {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// URL of the metrics endpoint.
    pub fn build_url(&self) -> String {
        format!("http://{}/", self.config.address)
    }

    /// Fetch per-region statistics for `query`.
    pub async fn compute_metrics(&self, query: &MetricsQuery) -> Result<RegionMetrics> {
        let response = self
            .http_client
            .post(self.build_url())
            .json(query)
            .send()
            .await
            .map_err(|e| RegionStatsError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(parse_error_response(status, response).await);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RegionStatsError::NetworkError(e.to_string()))?;

        serde_json::from_slice(&body)
            .map_err(|e| RegionStatsError::InvalidResponse(e.to_string()))
    }

    /// Shorthand for a query built from its parts. An empty `services` slice applies no filter.
    pub async fn metrics_for(
        &self,
        regions: &[&str],
        services: &[&str],
        threshold_ms: f64,
    ) -> Result<RegionMetrics> {
        let mut query = MetricsQuery::for_regions(regions.iter().copied())
            .with_threshold(threshold_ms);
        if !services.is_empty() {
            query = query.with_services(services.iter().copied());
        }
        self.compute_metrics(&query).await
    }
}

async fn parse_error_response(
    status: reqwest::StatusCode,
    response: reqwest::Response,
) -> RegionStatsError {
    let error_msg = response
        .json::<ErrorResponse>()
        .await
        .map(|r| r.error)
        .unwrap_or_else(|_| format!("Server returned status: {}", status));

    RegionStatsError::HttpError(status.as_u16(), error_msg)
}
