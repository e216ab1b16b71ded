//! Split planning: group discovered files and attach the shared header.
//!
//! Planning runs once per job. The grouping itself is delegated to
//! [`group_files`]; this module wraps each grouping into a [`CompositeSplit`] and,
//! when header propagation is on, looks up the header every reader of that split
//! will need.
//!
//! Header lookup walks a grouping's files in order and stops at the first one whose
//! first line is non-empty. Each grouping resolves its header on its own, so a file
//! shared by two groupings is read twice. All files of a job are assumed to share
//! one header, which makes the choice of file irrelevant for correctness.
//!
//! ```
//! use ironsplit::fs::MemoryFs;
//! use ironsplit::planner::plan;
//! use ironsplit::split::FileEntry;
//!
//! let fs = MemoryFs::new();
//! fs.insert("/in/a.csv", "id,name\n1,x\n");
//! fs.insert("/in/b.csv", "id,name\n2,y\n");
//! let files = vec![
//!     FileEntry::from_fs(&fs, "/in/a.csv").unwrap(),
//!     FileEntry::from_fs(&fs, "/in/b.csv").unwrap(),
//! ];
//!
//! let splits = plan(&fs, &files, 1024, true);
//! assert_eq!(splits.len(), 1);
//! assert_eq!(splits[0].header(), Some("id,name"));
//! ```

use crate::fs::FileSystem;
use crate::grouping::{GroupingOptions, group_files};
use crate::header::read_header;
use crate::metrics::{HEADER_READS, MetricsCollector, SPLITS_PLANNED};
use crate::split::{CompositeSplit, FileEntry, PathTrackingSplit};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Plan composite splits with default grouping options.
///
/// With `copy_header == false` no file is opened.
#[must_use]
pub fn plan(
    fs: &dyn FileSystem,
    files: &[FileEntry],
    max_split_size: u64,
    copy_header: bool,
) -> Vec<CompositeSplit> {
    let options = GroupingOptions::new(max_split_size);
    group_and_log(files, &options, copy_header)
        .into_iter()
        .map(|g| finish_grouping(fs, g, copy_header, None))
        .collect()
}

fn group_and_log(
    files: &[FileEntry],
    options: &GroupingOptions,
    copy_header: bool,
) -> Vec<Vec<PathTrackingSplit>> {
    let groupings = group_files(files, options);
    info!(
        files = files.len(),
        groupings = groupings.len(),
        max_split_size = options.max_split_size,
        copy_header,
        "planned file groupings"
    );
    groupings
}

/// Find the first non-empty header among the files of one grouping.
///
/// Failures to read a candidate are logged and the next file is tried. A path is
/// read at most once per call.
pub fn resolve_header(
    fs: &dyn FileSystem,
    grouping: &[PathTrackingSplit],
    metrics: Option<&MetricsCollector>,
) -> Option<String> {
    let mut tried: HashSet<&Path> = HashSet::new();
    for split in grouping {
        if !tried.insert(split.path.as_path()) {
            continue;
        }
        if let Some(m) = metrics {
            m.increment_counter(HEADER_READS, 1);
        }
        if let Some(header) = read_header(fs, &split.path).filter(|h| !h.is_empty()) {
            debug!(path = %split.path.display(), "resolved shared header");
            return Some(header);
        }
    }
    None
}

fn finish_grouping(
    fs: &dyn FileSystem,
    grouping: Vec<PathTrackingSplit>,
    copy_header: bool,
    metrics: Option<&MetricsCollector>,
) -> CompositeSplit {
    let header = if copy_header {
        resolve_header(fs, &grouping, metrics)
    } else {
        None
    };
    if let Some(m) = metrics {
        m.increment_counter(SPLITS_PLANNED, 1);
    }
    CompositeSplit::new(grouping, header)
}

/// Configurable planner.
///
/// ```
/// use ironsplit::fs::MemoryFs;
/// use ironsplit::planner::SplitPlanner;
/// use ironsplit::split::FileEntry;
/// use std::sync::Arc;
///
/// let fs = MemoryFs::new();
/// fs.insert("/a.txt", "hello\n");
/// let planner = SplitPlanner::new(Arc::new(fs.clone()), 64).with_copy_header(true);
/// let splits = planner.plan(&[FileEntry::from_fs(&fs, "/a.txt").unwrap()]);
/// assert_eq!(splits[0].header(), Some("hello"));
/// ```
#[derive(Clone)]
pub struct SplitPlanner {
    fs: Arc<dyn FileSystem>,
    options: GroupingOptions,
    copy_header: bool,
    metrics: Option<MetricsCollector>,
}

impl SplitPlanner {
    pub fn new(fs: Arc<dyn FileSystem>, max_split_size: u64) -> Self {
        Self {
            fs,
            options: GroupingOptions::new(max_split_size),
            copy_header: false,
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_copy_header(mut self, copy_header: bool) -> Self {
        self.copy_header = copy_header;
        self
    }

    #[must_use]
    pub fn with_min_split_size_per_node(mut self, size: u64) -> Self {
        self.options.min_split_size_per_node = size;
        self
    }

    /// Whether files may be cut into several ranges. Formats that can only be read
    /// from the start (Avro containers) turn this off.
    #[must_use]
    pub fn with_splittable(mut self, splittable: bool) -> Self {
        self.options.splittable = splittable;
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    #[must_use]
    pub fn options(&self) -> &GroupingOptions {
        &self.options
    }

    #[must_use]
    pub fn copy_header(&self) -> bool {
        self.copy_header
    }

    /// Plan splits sequentially.
    #[must_use]
    pub fn plan(&self, files: &[FileEntry]) -> Vec<CompositeSplit> {
        group_and_log(files, &self.options, self.copy_header)
            .into_iter()
            .map(|g| finish_grouping(self.fs.as_ref(), g, self.copy_header, self.metrics.as_ref()))
            .collect()
    }

    /// Plan splits, resolving headers of different groupings in parallel.
    ///
    /// The result is identical to [`plan`](Self::plan), order included.
    #[cfg(feature = "parallel-io")]
    #[must_use]
    pub fn plan_par(&self, files: &[FileEntry]) -> Vec<CompositeSplit> {
        use rayon::prelude::*;
        group_and_log(files, &self.options, self.copy_header)
            .into_par_iter()
            .map(|g| finish_grouping(self.fs.as_ref(), g, self.copy_header, self.metrics.as_ref()))
            .collect()
    }
}
