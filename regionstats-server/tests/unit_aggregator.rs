use regionstats_common::{MetricsQuery, StatisticsResult};
use regionstats_server::aggregator::{compute_metrics, quantile, round_to, summarize};
use regionstats_server::error::InvalidDataError;
use regionstats_server::store::{TelemetryRecord, TelemetryStore};
use std::path::Path;

// --- Test helpers ---

fn record(latency_ms: f64, uptime_fraction: f64) -> TelemetryRecord {
    TelemetryRecord {
        region: "amer".to_string(),
        service: "checkout".to_string(),
        latency_ms,
        uptime_fraction,
    }
}

fn shipped_store() -> TelemetryStore {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/telemetry.json");
    TelemetryStore::from_path(Path::new(path)).unwrap()
}

fn stats(avg_latency: f64, p95_latency: f64, avg_uptime: f64, breaches: u64) -> StatisticsResult {
    StatisticsResult {
        avg_latency,
        p95_latency,
        avg_uptime,
        breaches,
    }
}

// --- quantile / round_to ---

#[test]
fn test_quantile_interpolates_between_order_statistics() {
    // rank 0.95 * 4 = 3.8 → 40 + 0.8 * (50 - 40)
    let q = quantile(&[10.0, 20.0, 30.0, 40.0, 50.0], 0.95).unwrap();
    assert!((q - 48.0).abs() < 1e-9);
}

#[test]
fn test_quantile_endpoints() {
    let data = [1.0, 2.0, 3.0];
    assert_eq!(quantile(&data, 0.0), Some(1.0));
    assert_eq!(quantile(&data, 1.0), Some(3.0));
    assert_eq!(quantile(&data, 0.5), Some(2.0));
}

#[test]
fn test_quantile_needs_two_samples() {
    assert_eq!(quantile(&[], 0.95), None);
    assert_eq!(quantile(&[42.0], 0.95), None);
}

#[test]
fn test_round_to() {
    assert_eq!(round_to(197.149_999_999_999_98, 2), 197.15);
    assert_eq!(round_to(0.98349, 3), 0.983);
    assert_eq!(round_to(219.0495, 2), 219.05);
    assert_eq!(round_to(0.0, 3), 0.0);
}

#[test]
fn test_round_to_exact_ties_go_to_even() {
    // 100.125 and 0.125 are exact in binary, so these are true ties.
    assert_eq!(round_to(100.125, 2), 100.12);
    assert_eq!(round_to(0.125, 2), 0.12);
    assert_eq!(round_to(0.375, 2), 0.38);
}

#[test]
fn test_round_to_uses_the_stored_binary_value() {
    // 2.675 and 1.005 are stored slightly below the written decimal, 0.9825 slightly above.
    assert_eq!(round_to(2.675, 2), 2.67);
    assert_eq!(round_to(1.005, 2), 1.0);
    assert_eq!(round_to(0.9825, 3), 0.983);
}

// --- summarize ---

#[test]
fn test_summarize_empty_group_is_sentinel() {
    assert_eq!(summarize(&[], 180.0).unwrap(), StatisticsResult::EMPTY);
}

#[test]
fn test_summarize_single_record_falls_back_to_max() {
    let r = record(150.25, 0.991);
    let result = summarize(&[&r], 180.0).unwrap();
    assert_eq!(result, stats(150.25, 150.25, 0.991, 0));
}

#[test]
fn test_summarize_tie_latency_rounds_to_even() {
    let r = record(100.125, 1.0);
    let result = summarize(&[&r], 180.0).unwrap();
    assert_eq!(result.avg_latency, 100.12);
    assert_eq!(result.p95_latency, 100.12);
}

#[test]
fn test_summarize_tie_mean_rounds_to_even() {
    // (100 + 100.25) / 2 = 100.125 exactly.
    let a = record(100.0, 1.0);
    let b = record(100.25, 1.0);
    let result = summarize(&[&a, &b], 180.0).unwrap();
    assert_eq!(result.avg_latency, 100.12);
}

#[test]
fn test_summarize_is_order_independent() {
    let a = record(300.0, 0.9);
    let b = record(100.0, 1.0);
    let c = record(200.0, 0.95);
    let forward = summarize(&[&a, &b, &c], 180.0).unwrap();
    let reversed = summarize(&[&c, &b, &a], 180.0).unwrap();
    assert_eq!(forward, reversed);
    // rank 0.95 * 2 = 1.9 → 200 + 0.9 * 100
    assert_eq!(forward, stats(200.0, 290.0, 0.95, 2));
}

#[test]
fn test_summarize_latency_equal_to_threshold_is_not_a_breach() {
    let at = record(180.0, 1.0);
    let above = record(180.01, 1.0);
    let below = record(179.99, 1.0);
    let result = summarize(&[&at, &above, &below], 180.0).unwrap();
    assert_eq!(result.breaches, 1);
}

#[test]
fn test_summarize_custom_threshold() {
    let records = [record(50.0, 1.0), record(150.0, 1.0), record(250.0, 1.0)];
    let refs: Vec<&TelemetryRecord> = records.iter().collect();
    assert_eq!(summarize(&refs, 0.0).unwrap().breaches, 3);
    assert_eq!(summarize(&refs, 100.0).unwrap().breaches, 2);
    assert_eq!(summarize(&refs, 1000.0).unwrap().breaches, 0);
}

#[test]
fn test_summarize_computed_zero_latency() {
    let r = record(0.0, 0.0);
    let result = summarize(&[&r, &r], 180.0).unwrap();
    assert_eq!(result.avg_latency, 0.0);
    assert_eq!(result.breaches, 0);
}

#[test]
fn test_summarize_rejects_non_finite_latency() {
    let ok = record(100.0, 1.0);
    let bad = record(f64::NAN, 1.0);
    let err = summarize(&[&ok, &bad], 180.0).unwrap_err();
    assert!(matches!(
        err,
        InvalidDataError::NonFinite {
            field: "latency_ms",
            ..
        }
    ));
}

#[test]
fn test_summarize_rejects_non_finite_uptime() {
    let bad = record(100.0, f64::INFINITY);
    let err = summarize(&[&bad], 180.0).unwrap_err();
    assert_eq!(
        err,
        InvalidDataError::NonFinite {
            field: "uptime_fraction",
            value: f64::INFINITY,
        }
    );
    assert_eq!(err.to_string(), "Record has non-finite uptime_fraction: inf");
}

#[test]
fn test_summarize_uptime_stays_within_unit_interval() {
    let store = shipped_store();
    for region in store.regions() {
        let result = summarize(&store.filter(region, &[]), 180.0).unwrap();
        assert!((0.0..=1.0).contains(&result.avg_uptime), "{region}: {}", result.avg_uptime);
    }
}

// --- compute_metrics against the shipped dataset ---

#[test]
fn test_compute_metrics_support_only() {
    let store = shipped_store();
    let query = MetricsQuery::for_regions(["amer"]).with_services(["support"]);
    let metrics = compute_metrics(&store, &query).unwrap();
    assert_eq!(metrics["amer"], stats(197.15, 219.19, 0.98, 1));
}

#[test]
fn test_compute_metrics_support_and_checkout() {
    let store = shipped_store();
    let query = MetricsQuery::for_regions(["amer"]).with_services(["support", "checkout"]);
    let metrics = compute_metrics(&store, &query).unwrap();
    assert_eq!(metrics["amer"], stats(182.88, 219.05, 0.983, 2));
}

#[test]
fn test_compute_metrics_unknown_region_is_sentinel() {
    let store = shipped_store();
    let query = MetricsQuery::for_regions(["antarctica"]);
    let metrics = compute_metrics(&store, &query).unwrap();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics["antarctica"], StatisticsResult::EMPTY);
}

#[test]
fn test_compute_metrics_no_regions_is_empty() {
    let store = shipped_store();
    let metrics = compute_metrics(&store, &MetricsQuery::default()).unwrap();
    assert!(metrics.is_empty());
}

#[test]
fn test_compute_metrics_empty_service_list_means_no_filter() {
    let store = shipped_store();
    let unfiltered_query = MetricsQuery::for_regions(["amer"]);
    let empty_list_query = MetricsQuery::for_regions(["amer"]).with_services(Vec::<String>::new());
    let unfiltered = compute_metrics(&store, &unfiltered_query).unwrap();
    let empty_list = compute_metrics(&store, &empty_list_query).unwrap();
    assert_eq!(unfiltered, empty_list);
    assert_eq!(unfiltered["amer"].breaches, 3);
}

#[test]
fn test_compute_metrics_is_idempotent() {
    let store = shipped_store();
    let query = MetricsQuery::for_regions(["amer", "emea", "apac"]).with_threshold(170.0);
    let first = compute_metrics(&store, &query).unwrap();
    let second = compute_metrics(&store, &query).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_compute_metrics_regions_are_independent() {
    let store = shipped_store();
    let all_query = MetricsQuery::for_regions(["amer", "emea", "apac"]);
    let partial_query = MetricsQuery::for_regions(["amer", "apac"]);
    let all = compute_metrics(&store, &all_query).unwrap();
    let without_emea = compute_metrics(&store, &partial_query).unwrap();
    assert_eq!(without_emea.len(), 2);
    assert_eq!(all["amer"], without_emea["amer"]);
    assert_eq!(all["apac"], without_emea["apac"]);
}

#[test]
fn test_compute_metrics_duplicate_regions_collapse_to_one_entry() {
    let store = shipped_store();
    let twice = MetricsQuery::for_regions(["emea", "emea"]);
    let once = MetricsQuery::for_regions(["emea"]);
    let metrics = compute_metrics(&store, &twice).unwrap();
    let single = compute_metrics(&store, &once).unwrap();
    assert_eq!(metrics, single);
}

#[test]
fn test_compute_metrics_threshold_applies_to_every_region() {
    let store = shipped_store();
    let query = MetricsQuery::for_regions(["amer", "emea", "apac"]).with_threshold(10_000.0);
    let metrics = compute_metrics(&store, &query).unwrap();
    assert!(metrics.values().all(|s| s.breaches == 0));
}
