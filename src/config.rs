//! Job configuration.
//!
//! All fields have defaults, so a config file only needs to name what it changes:
//!
//! ```json
//! {
//!   "max_split_size": 67108864,
//!   "copy_header": true,
//!   "format": "csv",
//!   "delimiter": "|",
//!   "path_field": "file"
//! }
//! ```

use crate::error::{Result, SplitError};
use crate::fs::FileSystem;
use crate::io::{Decoder, Format};
use crate::planner::SplitPlanner;
use crate::reader::TaskContext;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_MAX_SPLIT_SIZE: u64 = 128 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CombineConfig {
    /// Target upper bound of a composite split in bytes; `0` means unbounded.
    pub max_split_size: u64,
    /// Smallest per-host remainder emitted as its own split; `0` disables.
    pub min_split_size_per_node: u64,
    /// Resolve a shared header per split and hand it to every file's decoder.
    pub copy_header: bool,
    pub format: Format,
    /// Field delimiter for `csv`; must be a single byte.
    pub delimiter: char,
    /// Record field receiving the source path; no tagging when unset.
    pub path_field: Option<String>,
    /// Tag with the file name instead of the full path.
    pub filename_only: bool,
    /// Reader schema (JSON) for `avro`.
    pub avro_schema: Option<String>,
    /// Regex a file name must match to be included in discovery.
    pub path_filter: Option<String>,
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            max_split_size: DEFAULT_MAX_SPLIT_SIZE,
            min_split_size_per_node: 0,
            copy_header: false,
            format: Format::default(),
            delimiter: ',',
            path_field: None,
            filename_only: false,
            avro_schema: None,
            path_filter: None,
        }
    }
}

impl CombineConfig {
    /// Parse and validate a JSON config.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::Config`] on malformed JSON, unknown keys, or a value
    /// rejected by [`validate`](Self::validate).
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(s).map_err(|e| SplitError::Config(format!("parse config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::Config`] if the file cannot be read or is invalid.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| SplitError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_json_str(&s)
    }

    /// Check values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if !self.delimiter.is_ascii() {
            return Err(SplitError::Config(format!(
                "delimiter {:?} is not a single-byte character",
                self.delimiter
            )));
        }
        if let Some(field) = &self.path_field
            && field.is_empty()
        {
            return Err(SplitError::Config("path_field must not be empty".into()));
        }
        self.path_filter_regex()?;
        if self.format == Format::Avro {
            self.build_decoder()?;
        }
        Ok(())
    }

    /// Compiled [`path_filter`](Self::path_filter).
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::Config`] if the regex does not compile.
    pub fn path_filter_regex(&self) -> Result<Option<Regex>> {
        self.path_filter
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| SplitError::Config(format!("path_filter: {e}")))
    }

    /// Decoder for the configured format.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::Config`] if the format's feature is disabled, the CSV
    /// delimiter is not a single byte, or the Avro reader schema does not parse.
    pub fn build_decoder(&self) -> Result<Arc<dyn Decoder>> {
        if self.format == Format::Csv && !self.delimiter.is_ascii() {
            return Err(SplitError::Config(format!(
                "delimiter {:?} is not a single-byte character",
                self.delimiter
            )));
        }
        match self.format {
            #[cfg(feature = "io-csv")]
            Format::Csv => Ok(Arc::new(crate::io::csv::CsvDecoder::with_delimiter(
                self.delimiter as u8,
            ))),
            #[cfg(feature = "io-avro")]
            Format::Avro => match &self.avro_schema {
                Some(schema) => crate::io::avro::AvroDecoder::with_reader_schema(schema)
                    .map(|d| Arc::new(d) as Arc<dyn Decoder>)
                    .map_err(|e| SplitError::Config(format!("avro_schema: {e:#}"))),
                None => Ok(Arc::new(crate::io::avro::AvroDecoder::default())),
            },
            other => other.default_decoder().ok_or_else(|| {
                SplitError::Config(format!("format `{other}` is not enabled in this build"))
            }),
        }
    }

    /// Planner honoring the size, header and splittability settings.
    ///
    /// # Errors
    ///
    /// See [`build_decoder`](Self::build_decoder).
    pub fn planner(&self, fs: Arc<dyn FileSystem>) -> Result<SplitPlanner> {
        let decoder = self.build_decoder()?;
        Ok(SplitPlanner::new(fs, self.max_split_size)
            .with_min_split_size_per_node(self.min_split_size_per_node)
            .with_copy_header(self.copy_header)
            .with_splittable(decoder.is_splittable()))
    }

    /// Worker-side context for readers of this job.
    ///
    /// # Errors
    ///
    /// See [`build_decoder`](Self::build_decoder).
    pub fn task_context(&self, fs: Arc<dyn FileSystem>) -> Result<TaskContext> {
        let mut task =
            TaskContext::new(fs, self.build_decoder()?).with_filename_only(self.filename_only);
        if let Some(field) = &self.path_field {
            task = task.with_path_field(field.clone());
        }
        Ok(task)
    }
}
