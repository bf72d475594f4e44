// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Lightweight metrics infrastructure for R-tree observability.
//!
//! Mirrors the ambient metrics layer used elsewhere in this codebase: a
//! `Metric`/`MetricUnit` pair recorded into a process-global, thread-safe
//! collector. Unlike a full observability stack, this module has no
//! persistence backend — it exists so the tree's own operations
//! (`insert`, `search_range`, `search_knn`) can be instrumented without
//! threading a collector handle through every call.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// A single metric measurement.
#[derive(Debug, Clone)]
pub struct Metric {
    /// Metric name (e.g. "rtree.insert.duration").
    pub name: String,

    /// Numeric value of the measurement.
    pub value: f64,

    /// Unit of measurement.
    pub unit: MetricUnit,

    /// Optional tags for filtering/aggregation.
    pub tags: HashMap<String, String>,

    /// Unix timestamp in nanoseconds.
    pub timestamp: u64,
}

impl Metric {
    /// Creates a new metric with the current timestamp.
    pub fn new(name: impl Into<String>, value: f64, unit: MetricUnit) -> Self {
        Self {
            name: name.into(),
            value,
            unit,
            tags: HashMap::new(),
            timestamp: Self::now_nanos(),
        }
    }

    /// Adds a tag to the metric (builder pattern).
    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    fn now_nanos() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }
}

/// Unit of measurement for metric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricUnit {
    Microseconds,
    Count,
}

impl MetricUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Microseconds => "μs",
            Self::Count => "",
        }
    }
}

/// Global singleton instance.
static METRICS_COLLECTOR: Lazy<Arc<MetricsCollector>> =
    Lazy::new(|| Arc::new(MetricsCollector::new()));

/// Thread-safe, in-memory metrics collector.
///
/// ## Example
/// ```
/// use rtree_index::metrics::{Metric, MetricUnit, MetricsCollector};
///
/// let metric = Metric::new("rtree.insert.count", 1.0, MetricUnit::Count);
/// MetricsCollector::global().record(metric);
/// ```
pub struct MetricsCollector {
    buffer: RwLock<Vec<Metric>>,
    buffer_limit: usize,
}

impl MetricsCollector {
    fn new() -> Self {
        Self {
            buffer: RwLock::new(Vec::with_capacity(256)),
            buffer_limit: 1000,
        }
    }

    /// Returns the global singleton instance.
    pub fn global() -> Arc<Self> {
        Arc::clone(&METRICS_COLLECTOR)
    }

    /// Records a metric, dropping the oldest entries once `buffer_limit`
    /// is exceeded so long-running processes don't grow unbounded.
    pub fn record(&self, metric: Metric) {
        let mut buffer = self.buffer.write().expect("metrics lock poisoned");
        buffer.push(metric);
        if buffer.len() > self.buffer_limit {
            let overflow = buffer.len() - self.buffer_limit;
            buffer.drain(0..overflow);
        }
    }

    /// Snapshot of all currently buffered metrics, most recent last.
    pub fn snapshot(&self) -> Vec<Metric> {
        self.buffer.read().expect("metrics lock poisoned").clone()
    }

    /// Number of metrics recorded under `name` since the buffer last wrapped.
    pub fn count(&self, name: &str) -> usize {
        self.buffer
            .read()
            .expect("metrics lock poisoned")
            .iter()
            .filter(|m| m.name == name)
            .count()
    }
}

/// Records an operation's duration as a `Microseconds` metric tagged with
/// `op`, then returns the closure's result.
pub fn timed<T>(op: &'static str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = f();
    let micros = start.elapsed().as_secs_f64() * 1_000_000.0;
    MetricsCollector::global().record(
        Metric::new(format!("rtree.{op}.duration"), micros, MetricUnit::Microseconds)
            .with_tag("op", op),
    );
    MetricsCollector::global().record(Metric::new(
        format!("rtree.{op}.count"),
        1.0,
        MetricUnit::Count,
    ));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_formats_with_unit_suffix() {
        let m = Metric::new("test", 12.5, MetricUnit::Microseconds);
        assert_eq!(m.unit.suffix(), "μs");
    }

    #[test]
    fn timed_records_duration_and_count() {
        let before = MetricsCollector::global().count("rtree.unit_test.duration");
        let value = timed("unit_test", || 42);
        assert_eq!(value, 42);
        let after = MetricsCollector::global().count("rtree.unit_test.duration");
        assert_eq!(after, before + 1);
    }
}
