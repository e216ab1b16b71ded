//! Counters for split planning and reading.
//!
//! A [`MetricsCollector`] can be attached to a [`SplitPlanner`](crate::planner::SplitPlanner)
//! and to a [`TaskContext`](crate::reader::TaskContext). Both increment the built-in
//! counters below; users can register their own [`Metric`]s alongside them.
//!
//! | counter            | incremented by                                   |
//! |--------------------|--------------------------------------------------|
//! | `splits_planned`   | planner, once per composite split                |
//! | `header_reads`     | planner, once per header lookup attempt          |
//! | `files_opened`     | composite reader, once per constituent opened    |
//! | `records_read`     | composite reader, once per record returned       |
//!
//! # Example
//!
//! ```no_run
//! use ironsplit::metrics::MetricsCollector;
//!
//! let metrics = MetricsCollector::new();
//! metrics.increment_counter("records_read", 3);
//! assert_eq!(metrics.counter("records_read"), 3);
//! metrics.save_to_file("metrics.json")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use std::any::Any;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const SPLITS_PLANNED: &str = "splits_planned";
pub const HEADER_READS: &str = "header_reads";
pub const FILES_OPENED: &str = "files_opened";
pub const RECORDS_READ: &str = "records_read";

/// A user-defined metric.
pub trait Metric: Send + Sync + Any {
    fn name(&self) -> &str;

    /// Current value as JSON.
    fn value(&self) -> Value;

    fn description(&self) -> Option<&str> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// Thread-safe metric registry. Clones share state.
#[derive(Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsCollectorInner>>,
}

#[derive(Default)]
struct MetricsCollectorInner {
    counters: BTreeMap<String, u64>,
    metrics: BTreeMap<String, Box<dyn Metric>>,
    start_time: Option<Instant>,
    end_time: Option<Instant>,
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MetricsCollectorInner> {
        self.inner.lock().expect("metrics mutex poisoned")
    }

    /// Register a custom metric, replacing any metric of the same name.
    pub fn register(&self, metric: Box<dyn Metric>) {
        self.lock().metrics.insert(metric.name().to_string(), metric);
    }

    pub fn record_start(&self) {
        self.lock().start_time = Some(Instant::now());
    }

    pub fn record_end(&self) {
        self.lock().end_time = Some(Instant::now());
    }

    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        let inner = self.lock();
        match (inner.start_time, inner.end_time) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }

    /// Add `value` to a counter, creating it at zero first if needed.
    pub fn increment_counter(&self, name: &str, value: u64) {
        *self.lock().counters.entry(name.to_string()).or_insert(0) += value;
    }

    pub fn set_counter(&self, name: &str, value: u64) {
        self.lock().counters.insert(name.to_string(), value);
    }

    /// Current value of a counter; `0` if it was never touched.
    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        self.lock().counters.get(name).copied().unwrap_or(0)
    }

    /// All counters and metrics as one JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let inner = self.lock();
        let mut out = Map::new();
        for (name, count) in &inner.counters {
            out.insert(name.clone(), json!({ "value": count }));
        }
        for (name, metric) in &inner.metrics {
            let mut obj = Map::new();
            obj.insert("value".to_string(), metric.value());
            if let Some(desc) = metric.description() {
                obj.insert("description".to_string(), json!(desc));
            }
            out.insert(name.clone(), Value::Object(obj));
        }
        if let (Some(start), Some(end)) = (inner.start_time, inner.end_time) {
            out.insert(
                "elapsed_ms".to_string(),
                json!({ "value": end.duration_since(start).as_millis() as u64 }),
            );
        }
        Value::Object(out)
    }

    /// Write [`to_json`](Self::to_json) to `path`, pretty-printed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let formatted = serde_json::to_string_pretty(&self.to_json())?;
        let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        file.write_all(formatted.as_bytes())
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}

/// A fixed-value gauge, handy for publishing job-level facts such as the
/// configured split size.
pub struct GaugeMetric {
    name: String,
    value: f64,
    description: Option<String>,
}

impl GaugeMetric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Metric for GaugeMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        json!(self.value)
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
