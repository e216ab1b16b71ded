//! Error type shared by planning and reading.
//!
//! Planning-time failures ([`SplitError::HeaderRead`]) are recovered by the planner.
//! Read-time failures ([`SplitError::ReaderInit`], [`SplitError::Decode`]) terminate the
//! split's reader and are returned to the caller as-is.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitError {
    /// Reading the candidate header of a file failed (open or UTF-8 decoding).
    #[error("read header of {}: {source}", path.display())]
    HeaderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A constituent file could not be opened or its decoder could not start.
    #[error("open reader for {}: {source:#}", path.display())]
    ReaderInit {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// Failure inside a decoder, passed through unmodified.
    #[error(transparent)]
    Decode(anyhow::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Input discovery (glob expansion, metadata lookup) failed.
    #[error("discover input files: {0:#}")]
    Discovery(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SplitError>;

impl SplitError {
    pub(crate) fn reader_init(path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        Self::ReaderInit {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Whether this error came from a decoder rather than from opening a file.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}
