//! Split model: discovered files, single-file byte ranges, and composite splits.

use crate::fs::FileSystem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// A discovered input file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub length: u64,
    /// Hosts holding a local copy; used as locality hints when grouping.
    pub hosts: Vec<String>,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>, length: u64) -> Self {
        Self {
            path: path.into(),
            length,
            hosts: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Describe `path` using the length and hosts reported by `fs`.
    ///
    /// # Errors
    ///
    /// Returns an error if `fs` cannot stat the file.
    pub fn from_fs(fs: &dyn FileSystem, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        Ok(Self {
            path: path.to_path_buf(),
            length: fs.file_len(path)?,
            hosts: fs.hosts(path),
        })
    }
}

/// A contiguous byte range of a single file, carrying the file path so decoded
/// records can be traced back to it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathTrackingSplit {
    pub path: PathBuf,
    pub start: u64,
    pub length: u64,
    #[serde(default)]
    pub hosts: Vec<String>,
}

impl PathTrackingSplit {
    pub fn new(path: impl Into<PathBuf>, start: u64, length: u64) -> Self {
        Self {
            path: path.into(),
            start,
            length,
            hosts: Vec::new(),
        }
    }

    /// Exclusive end offset.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.start + self.length
    }
}

/// One unit of work: byte ranges from one or more files plus at most one header
/// shared by all of them.
///
/// The header is taken from the first constituent file that has one. Every file of
/// the split is assumed to start with that same header; this is not checked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CompositeSplitRepr")]
pub struct CompositeSplit {
    splits: Vec<PathTrackingSplit>,
    header: Option<String>,
}

/// Wire form of [`CompositeSplit`], checked on the way in.
#[derive(Deserialize)]
struct CompositeSplitRepr {
    splits: Vec<PathTrackingSplit>,
    header: Option<String>,
}

impl TryFrom<CompositeSplitRepr> for CompositeSplit {
    type Error = String;

    fn try_from(repr: CompositeSplitRepr) -> Result<Self, Self::Error> {
        if repr.splits.is_empty() {
            return Err("a composite split needs at least one file range".to_string());
        }
        Ok(Self {
            splits: repr.splits,
            header: repr.header,
        })
    }
}

impl CompositeSplit {
    /// # Panics
    ///
    /// Panics if `splits` is empty; the planner never builds an empty split.
    #[must_use]
    pub fn new(splits: Vec<PathTrackingSplit>, header: Option<String>) -> Self {
        assert!(!splits.is_empty(), "a composite split needs at least one file range");
        Self { splits, header }
    }

    #[must_use]
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    #[must_use]
    pub fn splits(&self) -> &[PathTrackingSplit] {
        &self.splits
    }

    #[must_use]
    pub fn split(&self, index: usize) -> Option<&PathTrackingSplit> {
        self.splits.get(index)
    }

    /// Number of constituent file ranges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.splits.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    /// Sum of the constituent range lengths.
    #[must_use]
    pub fn total_length(&self) -> u64 {
        self.splits.iter().map(|s| s.length).sum()
    }

    /// Constituent paths in order (a path repeats if the split holds several of its chunks).
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.splits.iter().map(|s| s.path.as_path())
    }

    /// Distinct hosts of all constituents, sorted.
    #[must_use]
    pub fn locations(&self) -> Vec<String> {
        self.splits
            .iter()
            .flat_map(|s| s.hosts.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
