use crate::config::{LATENCY_DECIMALS, P95_QUANTILE, UPTIME_DECIMALS};
use crate::error::InvalidDataError;
use crate::store::{TelemetryRecord, TelemetryStore};
use regionstats_common::{MetricsQuery, RegionMetrics, StatisticsResult};

/// Compute statistics for every region in `query`, each against its own filtered group.
pub fn compute_metrics(
    store: &TelemetryStore,
    query: &MetricsQuery,
) -> Result<RegionMetrics, InvalidDataError> {
    let services = query.service_filter();
    let mut result = RegionMetrics::new();
    for region in &query.regions {
        let group = store.filter(region, services);
        let stats = summarize(&group, query.threshold_ms)?;
        tracing::debug!(region = %region, records = group.len(), ?stats, "region summarized");
        result.insert(region.clone(), stats);
    }
    Ok(result)
}

/// Summary statistics for one group. An empty group yields [`StatisticsResult::EMPTY`].
pub fn summarize(
    records: &[&TelemetryRecord],
    threshold: f64,
) -> Result<StatisticsResult, InvalidDataError> {
    if records.is_empty() {
        return Ok(StatisticsResult::EMPTY);
    }

    let mut latencies = Vec::with_capacity(records.len());
    let mut uptime_total = 0.0;
    for record in records {
        if !record.latency_ms.is_finite() {
            return Err(InvalidDataError::NonFinite {
                field: "latency_ms",
                value: record.latency_ms,
            });
        }
        if !record.uptime_fraction.is_finite() {
            return Err(InvalidDataError::NonFinite {
                field: "uptime_fraction",
                value: record.uptime_fraction,
            });
        }
        latencies.push(record.latency_ms);
        uptime_total += record.uptime_fraction;
    }

    let n = records.len() as f64;
    let avg_latency = latencies.iter().sum::<f64>() / n;
    let breaches = latencies.iter().filter(|&&l| l > threshold).count() as u64;

    latencies.sort_unstable_by(f64::total_cmp);
    // Interpolation needs two samples; a lone sample reports itself as the maximum.
    let p95 = quantile(&latencies, P95_QUANTILE)
        .unwrap_or(latencies[latencies.len() - 1]);

    Ok(StatisticsResult {
        avg_latency: round_to(avg_latency, LATENCY_DECIMALS),
        p95_latency: round_to(p95, LATENCY_DECIMALS),
        avg_uptime: round_to(uptime_total / n, UPTIME_DECIMALS),
        breaches,
    })
}

/// Linear interpolation between order statistics at zero-indexed rank `q * (n - 1)`.
/// `sorted` must be ascending. Returns `None` for fewer than two samples.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.len() < 2 {
        return None;
    }
    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Round to `decimals` places using the exact binary value, with exact ties going to even
/// (`100.125` becomes `100.12`).
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}
