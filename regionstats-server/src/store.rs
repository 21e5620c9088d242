use crate::error::LoadError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// One dataset row as stored in the telemetry file. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTelemetryRecord {
    pub region: String,
    pub service: String,
    pub latency_ms: f64,
    pub uptime_pct: f64,
}

/// One telemetry sample, normalized at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub region: String,
    pub service: String,
    pub latency_ms: f64,
    /// `uptime_pct / 100`, computed once when the record is loaded.
    pub uptime_fraction: f64,
}

impl TelemetryRecord {
    fn from_raw(index: usize, raw: RawTelemetryRecord) -> Result<Self, LoadError> {
        if raw.latency_ms < 0.0 {
            return Err(LoadError::OutOfRange {
                index,
                field: "latency_ms",
                value: raw.latency_ms,
            });
        }
        if !(0.0..=100.0).contains(&raw.uptime_pct) {
            return Err(LoadError::OutOfRange {
                index,
                field: "uptime_pct",
                value: raw.uptime_pct,
            });
        }

        Ok(Self {
            region: raw.region,
            service: raw.service,
            latency_ms: raw.latency_ms,
            uptime_fraction: raw.uptime_pct / 100.0,
        })
    }
}

/// Immutable in-memory dataset, indexed by region.
#[derive(Debug, Default)]
pub struct TelemetryStore {
    records: Vec<TelemetryRecord>,
    by_region: HashMap<String, Vec<usize>>,
}

impl TelemetryStore {
    /// Build the store from raw dataset rows. Each row must be an object with
    /// `region`, `service`, `latency_ms` and `uptime_pct`.
    pub fn load(raw: &[Value]) -> Result<Self, LoadError> {
        let mut records = Vec::with_capacity(raw.len());
        let mut by_region: HashMap<String, Vec<usize>> = HashMap::new();

        for (index, row) in raw.iter().enumerate() {
            if !row.is_object() {
                return Err(LoadError::NotAnObject { index });
            }
            let decoded = RawTelemetryRecord::deserialize(row).map_err(|e| {
                LoadError::InvalidRecord {
                    index,
                    message: e.to_string(),
                }
            })?;
            let record = TelemetryRecord::from_raw(index, decoded)?;
            by_region
                .entry(record.region.clone())
                .or_default()
                .push(records.len());
            records.push(record);
        }

        Ok(Self { records, by_region })
    }

    /// Parse a JSON array of raw rows and load it.
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        let raw: Vec<Value> =
            serde_json::from_str(json).map_err(|e| LoadError::Malformed(e.to_string()))?;
        Self::load(&raw)
    }

    /// Read and load the static dataset file.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let json = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let store = Self::from_json_str(&json)?;
        tracing::info!(
            path = %path.display(),
            records = store.len(),
            regions = store.by_region.len(),
            "telemetry store loaded"
        );
        Ok(store)
    }

    /// Records for `region`, in dataset order, restricted to `services` when it is non-empty.
    /// An unknown region yields an empty group.
    pub fn filter(&self, region: &str, services: &[String]) -> Vec<&TelemetryRecord> {
        let Some(rows) = self.by_region.get(region) else {
            return Vec::new();
        };
        rows.iter()
            .map(|&i| &self.records[i])
            .filter(|r| services.is_empty() || services.iter().any(|s| *s == r.service))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct region names, sorted.
    pub fn regions(&self) -> Vec<&str> {
        let mut regions: Vec<&str> = self.by_region.keys().map(String::as_str).collect();
        regions.sort_unstable();
        regions
    }
}
