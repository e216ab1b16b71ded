//! Input discovery from glob patterns.
//!
//! # Examples
//!
//! ```no_run
//! use ironsplit::io::glob::{discover_files, expand_glob};
//! use regex::Regex;
//!
//! // Every CSV file of every daily partition
//! let paths = expand_glob("data/events/day=*/*.csv")?;
//!
//! // Same, but skip files still being written
//! let filter = Regex::new(r"^[^_.].*\.csv$")?;
//! let files = discover_files("data/events/day=*/*.csv", Some(&filter))?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::error::SplitError;
use crate::fs::{FileSystem, LocalFs};
use crate::split::FileEntry;
use anyhow::{Context, Result, bail};
use glob::glob;
use regex::Regex;
use std::path::PathBuf;
use tracing::debug;

/// Expand a glob pattern into a sorted vector of matching file paths.
///
/// Supports `*`, `?`, `**`, `[abc]` and `[!abc]`. Directories are skipped. Zero
/// matches is an empty vector, not an error.
///
/// # Errors
///
/// Returns an error if the pattern is invalid or a directory cannot be read.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;

    let mut result = Vec::new();
    for entry in paths {
        let path =
            entry.with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        if path.is_file() {
            result.push(path);
        }
    }

    // Sort for deterministic order
    result.sort();

    Ok(result)
}

/// Like [`expand_glob`], but zero matches is an error.
///
/// # Errors
///
/// Returns an error if the pattern is invalid, a directory cannot be read, or
/// nothing matches.
pub fn expand_glob_required(pattern: &str) -> Result<Vec<PathBuf>> {
    let files = expand_glob(pattern)?;
    if files.is_empty() {
        bail!("no files found matching pattern: {pattern}");
    }
    Ok(files)
}

/// Discover local input files matching `pattern`.
///
/// When `filter` is given, only files whose *file name* matches it are kept.
/// Entries come back sorted by path with their length and `localhost` as host.
///
/// # Errors
///
/// Returns [`SplitError::Discovery`] if the pattern is invalid or a matched file
/// cannot be stat'ed.
pub fn discover_files(pattern: &str, filter: Option<&Regex>) -> crate::Result<Vec<FileEntry>> {
    let fs = LocalFs;
    let paths = expand_glob(pattern).map_err(SplitError::Discovery)?;
    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        let keep = match filter {
            Some(re) => path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| re.is_match(n)),
            None => true,
        };
        if !keep {
            debug!(path = %path.display(), "filtered out");
            continue;
        }
        let entry = FileEntry::from_fs(&fs, &path)
            .with_context(|| format!("stat {}", path.display()))
            .map_err(SplitError::Discovery)?;
        out.push(entry);
    }
    debug!(pattern, files = out.len(), "discovered input files");
    Ok(out)
}

/// Describe explicit paths through any filesystem, keeping the given order.
///
/// # Errors
///
/// Returns [`SplitError::Discovery`] if a path cannot be stat'ed.
pub fn entries_from_paths<I, P>(fs: &dyn FileSystem, paths: I) -> crate::Result<Vec<FileEntry>>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    paths
        .into_iter()
        .map(|p| {
            let p: PathBuf = p.into();
            FileEntry::from_fs(fs, &p)
                .with_context(|| format!("stat {}", p.display()))
                .map_err(SplitError::Discovery)
        })
        .collect()
}
