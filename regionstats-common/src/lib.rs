use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

/// Latency threshold applied when a query does not carry `threshold_ms`.
pub const DEFAULT_THRESHOLD_MS: f64 = 180.0;

fn default_threshold_ms() -> f64 {
    DEFAULT_THRESHOLD_MS
}

/// Body of a metrics request. Every field is optional on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsQuery {
    #[serde(default)]
    pub regions: Vec<String>,
    /// `None` (absent or `null`) and an empty list both mean "all services".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<String>>,
    #[serde(default = "default_threshold_ms")]
    pub threshold_ms: f64,
}

impl Default for MetricsQuery {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            services: None,
            threshold_ms: DEFAULT_THRESHOLD_MS,
        }
    }
}

impl MetricsQuery {
    /// Query for the given regions with no service filter and the default threshold.
    pub fn for_regions<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            regions: regions.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.services = Some(services.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_threshold(mut self, threshold_ms: f64) -> Self {
        self.threshold_ms = threshold_ms;
        self
    }

    /// Service filter as a slice; empty when no filter applies.
    pub fn service_filter(&self) -> &[String] {
        self.services.as_deref().unwrap_or(&[])
    }
}

/// Summary statistics for one region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticsResult {
    #[serde(serialize_with = "zero_as_integer")]
    pub avg_latency: f64,
    #[serde(serialize_with = "zero_as_integer")]
    pub p95_latency: f64,
    #[serde(serialize_with = "zero_as_integer")]
    pub avg_uptime: f64,
    pub breaches: u64,
}

impl StatisticsResult {
    /// Result reported for a group with no records.
    pub const EMPTY: StatisticsResult = StatisticsResult {
        avg_latency: 0.0,
        p95_latency: 0.0,
        avg_uptime: 0.0,
        breaches: 0,
    };
}

// The empty-group result goes out as `0`, not `0.0`.
fn zero_as_integer<S: Serializer>(
    value: &f64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    if *value == 0.0 {
        serializer.serialize_u64(0)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Response body: region name to its statistics.
pub type RegionMetrics = BTreeMap<String, StatisticsResult>;

/// Error types for RegionStats client operations
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionStatsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP {0}: {1}")]
    HttpError(u16, String),

    #[error("Invalid response body: {0}")]
    InvalidResponse(String),
}

/// JSON error envelope returned by the server for all error responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Result type for RegionStats client operations
pub type Result<T> = std::result::Result<T, RegionStatsError>;
