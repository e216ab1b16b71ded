use crate::error::{Result, SplitError};
use crate::io::{DecodeContext, RecordStream};
use crate::reader::TaskContext;
use crate::record::StructuredRecord;
use crate::split::{CompositeSplit, PathTrackingSplit};
use anyhow::anyhow;
use serde_json::Value;
use std::path::Path;

/// Reader for one constituent file range of a composite split.
///
/// The shared header of the composite split is published to the decoder through
/// the [`DecodeContext`] before any byte is read. The byte range handed to the
/// decoder is the planned one; the header never shifts it.
pub struct PathTrackingReader {
    stream: Box<dyn RecordStream>,
    split: PathTrackingSplit,
    tag: Option<(String, Value)>,
}

impl PathTrackingReader {
    /// Open the constituent at `index` of `composite`.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::ReaderInit`] if `index` is out of range, the file
    /// cannot be opened, or the decoder fails to start.
    pub fn open(composite: &CompositeSplit, index: usize, task: &TaskContext) -> Result<Self> {
        let split = composite.split(index).cloned().ok_or_else(|| {
            let path = composite
                .splits()
                .last()
                .map(|s| s.path.clone())
                .unwrap_or_default();
            SplitError::reader_init(
                path,
                anyhow!("constituent index {index} out of range ({} files)", composite.len()),
            )
        })?;
        let ctx = DecodeContext::for_split(&split, composite.header());
        let input = task
            .fs()
            .open(&split.path)
            .map_err(|e| SplitError::reader_init(&split.path, e))?;
        let stream = task
            .decoder()
            .decode(input, &split, &ctx)
            .map_err(|e| SplitError::reader_init(&split.path, e))?;
        let tag = task
            .path_field()
            .map(|field| (field.to_string(), path_value(&split.path, task.filename_only())));
        Ok(Self { stream, split, tag })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.split.path
    }

    #[must_use]
    pub fn split(&self) -> &PathTrackingSplit {
        &self.split
    }

    /// Bytes of this file's range consumed so far.
    #[must_use]
    pub fn bytes_consumed(&self) -> u64 {
        self.stream.bytes_consumed().min(self.split.length)
    }
}

fn path_value(path: &Path, filename_only: bool) -> Value {
    let shown = if filename_only {
        path.file_name().map_or_else(
            || path.to_string_lossy(),
            |n| n.to_string_lossy(),
        )
    } else {
        path.to_string_lossy()
    };
    Value::String(shown.into_owned())
}

impl Iterator for PathTrackingReader {
    type Item = Result<StructuredRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.stream.next()?;
        Some(match item {
            Ok(mut record) => {
                if let Some((field, value)) = &self.tag {
                    record.set(field.clone(), value.clone());
                }
                Ok(record)
            }
            Err(e) => Err(SplitError::Decode(e)),
        })
    }
}
