/// Quantile reported as `p95_latency`.
pub const P95_QUANTILE: f64 = 0.95;

/// Decimal places kept for `avg_latency` and `p95_latency`.
pub const LATENCY_DECIMALS: usize = 2;

/// Decimal places kept for `avg_uptime`.
pub const UPTIME_DECIMALS: usize = 3;

/// Largest request body accepted by the metrics endpoint.
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8000";

pub const DEFAULT_TELEMETRY_PATH: &str = "data/telemetry.json";
