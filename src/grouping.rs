//! Size- and locality-bounded grouping of file chunks.
//!
//! Files are first cut into chunks no larger than the maximum split size (unless
//! the format cannot be split), then chunks are bundled:
//!
//! 1. **Node pass** - for each host, in sorted order, that host's unassigned chunks
//!    are accumulated and emitted whenever they reach `max_split_size`. A remainder
//!    that reaches `min_split_size_per_node` is emitted too; a smaller one is
//!    released for the next pass.
//! 2. **Leftover pass** - all still-unassigned chunks, in discovery order, are
//!    accumulated and emitted on reaching `max_split_size`. The last remainder is
//!    always emitted.
//!
//! Every chunk lands in exactly one grouping and keeps its discovery order inside
//! that grouping, so the groupings cover every input byte once.

use crate::split::{FileEntry, PathTrackingSplit};
use std::collections::BTreeMap;

/// Knobs for [`group_files`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupingOptions {
    /// Target upper bound for a grouping, in bytes. `0` means unbounded.
    pub max_split_size: u64,
    /// Smallest per-host remainder worth emitting as its own grouping. `0` disables.
    pub min_split_size_per_node: u64,
    /// Whether files may be cut into several chunks.
    pub splittable: bool,
}

impl GroupingOptions {
    #[must_use]
    pub fn new(max_split_size: u64) -> Self {
        Self {
            max_split_size,
            min_split_size_per_node: 0,
            splittable: true,
        }
    }
}

/// Cut `[0, length)` into chunk ranges `(start, len)`.
///
/// Chunks of `max` are cut while more than twice `max` remains; a remainder
/// between one and two times `max` is halved so the last two chunks are even.
fn chunk_ranges(length: u64, max: u64, splittable: bool) -> Vec<(u64, u64)> {
    if length == 0 || !splittable || max == 0 {
        return vec![(0, length)];
    }
    let mut out = Vec::new();
    let mut start = 0u64;
    let mut left = length;
    while left > 0 {
        let len = if max.checked_mul(2).is_some_and(|twice| left > twice) {
            max
        } else if left > max {
            left / 2
        } else {
            left
        };
        out.push((start, len));
        start += len;
        left -= len;
    }
    out
}

/// Group `files` into ordered lists of byte ranges.
///
/// Returns an empty vector for an empty input. Never returns an empty grouping.
#[must_use]
pub fn group_files(files: &[FileEntry], opts: &GroupingOptions) -> Vec<Vec<PathTrackingSplit>> {
    let chunks: Vec<PathTrackingSplit> = files
        .iter()
        .flat_map(|f| {
            chunk_ranges(f.length, opts.max_split_size, opts.splittable)
                .into_iter()
                .map(move |(start, len)| PathTrackingSplit {
                    path: f.path.clone(),
                    start,
                    length: len,
                    hosts: f.hosts.clone(),
                })
        })
        .collect();

    let mut assigned = vec![false; chunks.len()];
    let mut groupings = Vec::new();

    let mut by_host: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, c) in chunks.iter().enumerate() {
        for h in &c.hosts {
            by_host.entry(h.as_str()).or_default().push(i);
        }
    }

    for indices in by_host.values() {
        let mut acc: Vec<usize> = Vec::new();
        let mut acc_size = 0u64;
        for &i in indices {
            if assigned[i] {
                continue;
            }
            assigned[i] = true;
            acc.push(i);
            acc_size += chunks[i].length;
            if opts.max_split_size > 0 && acc_size >= opts.max_split_size {
                groupings.push(std::mem::take(&mut acc));
                acc_size = 0;
            }
        }
        if acc.is_empty() {
            continue;
        }
        if opts.min_split_size_per_node > 0 && acc_size >= opts.min_split_size_per_node {
            groupings.push(acc);
        } else {
            for i in acc {
                assigned[i] = false;
            }
        }
    }

    let mut acc: Vec<usize> = Vec::new();
    let mut acc_size = 0u64;
    for i in 0..chunks.len() {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;
        acc.push(i);
        acc_size += chunks[i].length;
        if opts.max_split_size > 0 && acc_size >= opts.max_split_size {
            groupings.push(std::mem::take(&mut acc));
            acc_size = 0;
        }
    }
    if !acc.is_empty() {
        groupings.push(acc);
    }

    groupings
        .into_iter()
        .map(|g| g.into_iter().map(|i| chunks[i].clone()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_halves_the_tail() {
        assert_eq!(chunk_ranges(10, 4, true), vec![(0, 4), (4, 3), (7, 3)]);
        assert_eq!(chunk_ranges(8, 4, true), vec![(0, 4), (4, 4)]);
        assert_eq!(chunk_ranges(3, 4, true), vec![(0, 3)]);
        assert_eq!(chunk_ranges(10, 4, false), vec![(0, 10)]);
        assert_eq!(chunk_ranges(0, 4, true), vec![(0, 0)]);
    }

    #[test]
    fn huge_max_does_not_overflow() {
        assert_eq!(chunk_ranges(10, u64::MAX, true), vec![(0, 10)]);
        assert_eq!(chunk_ranges(u64::MAX, u64::MAX, true), vec![(0, u64::MAX)]);
        let files = vec![FileEntry::new("/a", 10), FileEntry::new("/b", 20)];
        let groups = group_files(&files, &GroupingOptions::new(u64::MAX));
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn unbounded_max_puts_everything_in_one_group() {
        let files = vec![FileEntry::new("/a", 10), FileEntry::new("/b", 20)];
        let groups = group_files(&files, &GroupingOptions::new(0));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn small_per_node_remainders_fall_through_to_leftovers() {
        let files = vec![
            FileEntry::new("/a", 3).with_hosts(["h1"]),
            FileEntry::new("/b", 3).with_hosts(["h2"]),
        ];
        let groups = group_files(&files, &GroupingOptions::new(100));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0][0].path.to_str(), Some("/a"));
        assert_eq!(groups[0][1].path.to_str(), Some("/b"));
    }

    #[test]
    fn per_node_remainder_emitted_when_large_enough() {
        let files = vec![
            FileEntry::new("/a", 30).with_hosts(["h1"]),
            FileEntry::new("/b", 30).with_hosts(["h2"]),
        ];
        let opts = GroupingOptions {
            max_split_size: 100,
            min_split_size_per_node: 20,
            splittable: true,
        };
        let groups = group_files(&files, &opts);
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.len() == 1));
    }
}
