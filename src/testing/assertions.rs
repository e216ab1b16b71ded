//! Assertions over planned splits and read records.

use crate::error::Result;
use crate::reader::CompositeReader;
use crate::record::StructuredRecord;
use crate::split::{CompositeSplit, FileEntry};
use std::collections::HashMap;
use std::path::PathBuf;

/// Assert that `splits` cover every byte of every file in `files` exactly once,
/// with no range past a file's end.
///
/// # Panics
///
/// Panics on a gap, an overlap, an out-of-bounds range, a range of an unknown
/// file, or an empty composite split.
pub fn assert_covers_exactly_once(files: &[FileEntry], splits: &[CompositeSplit]) {
    let lengths: HashMap<&PathBuf, u64> = files.iter().map(|f| (&f.path, f.length)).collect();
    let mut ranges: HashMap<&PathBuf, Vec<(u64, u64)>> = HashMap::new();
    for (i, cs) in splits.iter().enumerate() {
        assert!(!cs.is_empty(), "composite split #{i} is empty");
        for s in cs.splits() {
            let len = lengths.get(&s.path).unwrap_or_else(|| {
                panic!("split #{i} references unknown file {}", s.path.display())
            });
            assert!(
                s.end() <= *len,
                "split #{i} range {}..{} exceeds {} ({len} bytes)",
                s.start,
                s.end(),
                s.path.display()
            );
            ranges.entry(&s.path).or_default().push((s.start, s.end()));
        }
    }
    for f in files {
        let mut rs = ranges.remove(&f.path).unwrap_or_default();
        assert!(!rs.is_empty(), "file {} is not covered", f.path.display());
        rs.sort_unstable();
        let mut expected_start = 0;
        for (start, end) in &rs {
            assert_eq!(
                *start,
                expected_start,
                "gap or overlap in {} at offset {expected_start}: ranges {rs:?}",
                f.path.display()
            );
            expected_start = *end;
        }
        assert_eq!(
            expected_start,
            f.length,
            "file {} covered up to {expected_start} of {}",
            f.path.display(),
            f.length
        );
    }
}

/// Drain a reader into a vector, stopping at the first error.
///
/// # Errors
///
/// Returns the first error produced by the reader.
pub fn collect_records(reader: &mut CompositeReader) -> Result<Vec<StructuredRecord>> {
    let mut out = Vec::new();
    while let Some(rec) = reader.advance()? {
        out.push(rec);
    }
    Ok(out)
}

/// Values of string field `field` across `records`; missing or non-string values
/// are skipped.
#[must_use]
pub fn string_field(records: &[StructuredRecord], field: &str) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.get_str(field).map(str::to_string))
        .collect()
}
