//! Reading composite splits.
//!
//! Two layers:
//! - [`PathTrackingReader`] reads one constituent file range through the task's
//!   [`Decoder`] and tags each record with its source path;
//! - [`CompositeReader`] walks the constituents of a
//!   [`CompositeSplit`](crate::split::CompositeSplit) in order, opening one
//!   `PathTrackingReader` at a time, and exposes a single record stream.
//!
//! Everything a reader needs besides the split itself lives in a [`TaskContext`].

mod composite;
mod path_tracking;

pub use composite::{CompositeReader, create_record_reader};
pub use path_tracking::PathTrackingReader;

use crate::fs::FileSystem;
use crate::io::Decoder;
use crate::metrics::MetricsCollector;
use std::sync::Arc;

/// Worker-side settings shared by every reader of a task.
#[derive(Clone)]
pub struct TaskContext {
    fs: Arc<dyn FileSystem>,
    decoder: Arc<dyn Decoder>,
    path_field: Option<String>,
    filename_only: bool,
    metrics: Option<MetricsCollector>,
}

impl TaskContext {
    pub fn new(fs: Arc<dyn FileSystem>, decoder: Arc<dyn Decoder>) -> Self {
        Self {
            fs,
            decoder,
            path_field: None,
            filename_only: false,
            metrics: None,
        }
    }

    /// Add the source path to every record under `field`.
    #[must_use]
    pub fn with_path_field(mut self, field: impl Into<String>) -> Self {
        self.path_field = Some(field.into());
        self
    }

    /// Tag records with the file name only instead of the full path.
    #[must_use]
    pub fn with_filename_only(mut self, filename_only: bool) -> Self {
        self.filename_only = filename_only;
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    #[must_use]
    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    #[must_use]
    pub fn decoder(&self) -> &dyn Decoder {
        self.decoder.as_ref()
    }

    #[must_use]
    pub fn path_field(&self) -> Option<&str> {
        self.path_field.as_deref()
    }

    #[must_use]
    pub fn filename_only(&self) -> bool {
        self.filename_only
    }

    #[must_use]
    pub fn metrics(&self) -> Option<&MetricsCollector> {
        self.metrics.as_ref()
    }
}
