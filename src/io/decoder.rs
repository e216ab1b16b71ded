//! The pluggable decoder interface.

use crate::fs::SeekRead;
use crate::record::StructuredRecord;
use crate::split::PathTrackingSplit;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Per-file state handed to a decoder before it reads anything.
///
/// Built fresh for every constituent file of a composite split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeContext {
    /// Header shared by the composite split, if one was resolved at planning time.
    pub header: Option<String>,
    pub path: PathBuf,
    /// Byte offset the decoder starts at.
    pub position: u64,
    /// Bytes of the file range the decoder owns.
    pub length: u64,
}

impl DecodeContext {
    #[must_use]
    pub fn for_split(split: &PathTrackingSplit, header: Option<&str>) -> Self {
        Self {
            header: header.map(str::to_string),
            path: split.path.clone(),
            position: split.start,
            length: split.length,
        }
    }
}

/// A lazy sequence of records decoded from one file range.
pub trait RecordStream: Iterator<Item = anyhow::Result<StructuredRecord>> {
    /// Bytes of the range consumed so far. Never decreases and never exceeds the
    /// range length.
    fn bytes_consumed(&self) -> u64;
}

/// Turns one file's byte range into records.
pub trait Decoder: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether a file may be cut into several ranges. Decoders that can only read
    /// a file from its first byte return `false` so the planner keeps files whole.
    fn is_splittable(&self) -> bool {
        true
    }

    /// Start decoding `split` from the open handle `input`.
    ///
    /// # Errors
    ///
    /// Returns an error if the decoder cannot start (seek failure, corrupt
    /// container header). Errors for individual records come from the stream.
    fn decode(
        &self,
        input: Box<dyn SeekRead>,
        split: &PathTrackingSplit,
        ctx: &DecodeContext,
    ) -> anyhow::Result<Box<dyn RecordStream>>;
}

/// Supported record formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Text,
    Csv,
    Jsonl,
    Avro,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Csv => "csv",
            Self::Jsonl => "jsonl",
            Self::Avro => "avro",
        };
        f.write_str(name)
    }
}

impl Format {
    /// Decoder for this format with default settings (`,` delimiter, writer schema).
    ///
    /// Returns `None` when the format's feature is disabled.
    #[must_use]
    pub fn default_decoder(self) -> Option<Arc<dyn Decoder>> {
        match self {
            #[cfg(feature = "io-text")]
            Self::Text => Some(Arc::new(crate::io::text::TextDecoder)),
            #[cfg(feature = "io-csv")]
            Self::Csv => Some(Arc::new(crate::io::csv::CsvDecoder::default())),
            #[cfg(feature = "io-jsonl")]
            Self::Jsonl => Some(Arc::new(crate::io::jsonl::JsonlDecoder)),
            #[cfg(feature = "io-avro")]
            Self::Avro => Some(Arc::new(crate::io::avro::AvroDecoder::default())),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}
