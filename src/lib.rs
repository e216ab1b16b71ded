//! # Ironsplit
//!
//! **Combined input splits for batch jobs over many small files.**
//!
//! Scheduling one task per tiny file wastes most of a job's time on task
//! overhead. Ironsplit groups file byte ranges into *composite splits* bounded by
//! a maximum size, optionally resolves one shared header line per split, and reads
//! each composite split back as a single record stream, tagging every record with
//! the path of the file it came from.
//!
//! ## Key Features
//!
//! - **Split planning** - pack file ranges into size-bounded, locality-aware groups
//! - **Header propagation** - the first non-empty first line of a group reaches every decoder
//! - **Path tracking** - each record carries its source path (or file name)
//! - **Sequential composite reading** - at most one constituent file is open at a time
//! - **Pluggable decoders** - text, CSV, JSON Lines, Avro (feature-gated) or a custom [`Decoder`]
//! - **Pluggable storage** - local disk or the in-memory [`MemoryFs`](fs::MemoryFs), both behind
//!   [`FileSystem`](fs::FileSystem)
//!
//! ## Quick Start
//!
//! ```
//! use ironsplit::fs::MemoryFs;
//! use ironsplit::io::csv::CsvDecoder;
//! use ironsplit::testing::entries_for;
//! use ironsplit::{SplitPlanner, TaskContext, create_record_reader};
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let fs = MemoryFs::new();
//! fs.insert("/in/a.csv", "id,name\n1,ada\n");
//! fs.insert("/in/b.csv", "id,name\n2,grace\n");
//! let fs = Arc::new(fs);
//!
//! let files = entries_for(fs.as_ref(), &["/in/a.csv", "/in/b.csv"]);
//! let splits = SplitPlanner::new(fs.clone(), 1024).with_copy_header(true).plan(&files);
//! assert_eq!(splits.len(), 1);
//! assert_eq!(splits[0].header(), Some("id,name"));
//!
//! let task = TaskContext::new(fs, Arc::new(CsvDecoder::default())).with_path_field("file");
//! let mut names = Vec::new();
//! for record in create_record_reader(splits[0].clone(), task) {
//!     let record = record?;
//!     let name = record.get_str("name").unwrap();
//!     let file = record.get_str("file").unwrap();
//!     names.push(format!("{name}@{file}"));
//! }
//! assert_eq!(names, ["ada@/in/a.csv", "grace@/in/b.csv"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Splits
//!
//! A [`PathTrackingSplit`] is one byte range of one file. A [`CompositeSplit`] is an
//! ordered, non-empty list of them plus the resolved header (if any). Every byte of
//! every input file lands in exactly one range of exactly one composite split.
//!
//! ### Planning
//!
//! [`plan`] (or [`SplitPlanner`] for the full set of knobs) performs grouping and
//! header resolution. Header resolution opens files only when `copy_header` is set.
//!
//! ### Reading
//!
//! [`create_record_reader`] turns a composite split and a [`TaskContext`] into a
//! [`CompositeReader`]. Constituents are read in split order; the reader for file
//! `i + 1` is opened only after file `i` is exhausted and closed.
//!
//! ## Feature Flags
//!
//! - `io-text` (default) - line-oriented text decoder
//! - `io-jsonl` (default) - JSON Lines decoder
//! - `io-csv` (default) - CSV decoder using the header line for column names
//! - `io-avro` (default) - Avro object container decoder (not splittable)
//! - `parallel-io` (default) - parallel header resolution in [`SplitPlanner::plan_par`]

pub mod config;
pub mod error;
pub mod fs;
pub mod grouping;
pub mod header;
pub mod io;
pub mod metrics;
pub mod planner;
pub mod reader;
pub mod record;
pub mod split;
pub mod testing;

// General re-exports
pub use config::CombineConfig;
pub use error::{Result, SplitError};
pub use fs::{FileSystem, LocalFs, MemoryFs};
pub use grouping::{GroupingOptions, group_files};
pub use header::read_header;
pub use io::{DecodeContext, Decoder, Format, RecordStream};
pub use metrics::MetricsCollector;
pub use planner::{SplitPlanner, plan};
pub use reader::{CompositeReader, PathTrackingReader, TaskContext, create_record_reader};
pub use record::StructuredRecord;
pub use split::{CompositeSplit, FileEntry, PathTrackingSplit};

// Gated re-exports
#[cfg(feature = "io-text")]
pub use io::text::TextDecoder;

#[cfg(feature = "io-csv")]
pub use io::csv::CsvDecoder;

#[cfg(feature = "io-jsonl")]
pub use io::jsonl::JsonlDecoder;

#[cfg(feature = "io-avro")]
pub use io::avro::AvroDecoder;
