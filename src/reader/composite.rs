use crate::error::{Result, SplitError};
use crate::metrics::{FILES_OPENED, RECORDS_READ};
use crate::reader::{PathTrackingReader, TaskContext};
use crate::record::StructuredRecord;
use crate::split::CompositeSplit;
use std::path::Path;
use tracing::{debug, warn};

/// Build the reader for one composite split. Nothing is opened until the first
/// call to [`CompositeReader::advance`].
#[must_use]
pub fn create_record_reader(split: CompositeSplit, task: TaskContext) -> CompositeReader {
    CompositeReader::new(split, task)
}

enum ReaderState {
    Start,
    Reading {
        index: usize,
        reader: PathTrackingReader,
    },
    Done,
}

enum Step {
    Emit(StructuredRecord),
    Fail(SplitError),
    Open(usize),
    Finished,
}

/// One continuous record stream over all constituents of a composite split.
///
/// Constituents are read strictly in split order, one at a time: the reader for
/// file `i + 1` is opened only after file `i` is exhausted and its handle dropped.
/// The first error ends the stream; later calls return `Ok(None)`.
///
/// ```
/// use ironsplit::fs::MemoryFs;
/// use ironsplit::io::text::TextDecoder;
/// use ironsplit::reader::{TaskContext, create_record_reader};
/// use ironsplit::split::{CompositeSplit, PathTrackingSplit};
/// use std::sync::Arc;
///
/// let fs = MemoryFs::new();
/// fs.insert("/a", "1\n2\n");
/// fs.insert("/b", "3\n");
/// let split = CompositeSplit::new(
///     vec![PathTrackingSplit::new("/a", 0, 4), PathTrackingSplit::new("/b", 0, 2)],
///     None,
/// );
/// let task = TaskContext::new(Arc::new(fs), Arc::new(TextDecoder));
/// let bodies: Vec<String> = create_record_reader(split, task)
///     .map(|r| r.unwrap().get_str("body").unwrap().to_string())
///     .collect();
/// assert_eq!(bodies, ["1", "2", "3"]);
/// ```
pub struct CompositeReader {
    split: CompositeSplit,
    task: TaskContext,
    state: ReaderState,
    completed_bytes: u64,
    total_bytes: u64,
    records_read: u64,
}

impl CompositeReader {
    #[must_use]
    pub fn new(split: CompositeSplit, task: TaskContext) -> Self {
        let total_bytes = split.total_length();
        Self {
            split,
            task,
            state: ReaderState::Start,
            completed_bytes: 0,
            total_bytes,
            records_read: 0,
        }
    }

    /// Next record of the split, `Ok(None)` once every constituent is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::ReaderInit`] if a constituent cannot be opened and
    /// [`SplitError::Decode`] if its decoder fails. Either error closes the reader.
    pub fn advance(&mut self) -> Result<Option<StructuredRecord>> {
        loop {
            let step = match &mut self.state {
                ReaderState::Done => return Ok(None),
                ReaderState::Start => Step::Open(0),
                ReaderState::Reading { index, reader } => match reader.next() {
                    Some(Ok(record)) => Step::Emit(record),
                    Some(Err(e)) => Step::Fail(e),
                    None => {
                        self.completed_bytes += reader.split().length;
                        debug!(
                            index = *index,
                            path = %reader.path().display(),
                            "constituent exhausted"
                        );
                        if *index + 1 < self.split.len() {
                            Step::Open(*index + 1)
                        } else {
                            Step::Finished
                        }
                    }
                },
            };

            match step {
                Step::Emit(record) => {
                    self.records_read += 1;
                    if let Some(m) = self.task.metrics() {
                        m.increment_counter(RECORDS_READ, 1);
                    }
                    return Ok(Some(record));
                }
                Step::Fail(err) => {
                    warn!(error = %err, "composite split reader failed");
                    self.close();
                    return Err(err);
                }
                Step::Finished => {
                    self.state = ReaderState::Done;
                    debug!(
                        files = self.split.len(),
                        records = self.records_read,
                        "composite split exhausted"
                    );
                    return Ok(None);
                }
                Step::Open(index) => {
                    // release the previous handle before opening the next one
                    self.state = ReaderState::Done;
                    let reader = PathTrackingReader::open(&self.split, index, &self.task)?;
                    if let Some(m) = self.task.metrics() {
                        m.increment_counter(FILES_OPENED, 1);
                    }
                    debug!(index, path = %reader.path().display(), "opened constituent");
                    self.state = ReaderState::Reading { index, reader };
                }
            }
        }
    }

    /// Drop the open constituent reader, if any. Constituents not reached yet are
    /// never opened. Idempotent.
    pub fn close(&mut self) {
        if let ReaderState::Reading { reader, .. } = &self.state {
            self.completed_bytes += reader.bytes_consumed();
        }
        self.state = ReaderState::Done;
    }

    /// Bytes consumed across the whole split so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        let current = match &self.state {
            ReaderState::Reading { reader, .. } => reader.bytes_consumed(),
            _ => 0,
        };
        self.completed_bytes + current
    }

    /// Fraction of the split consumed, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f32 {
        if self.total_bytes == 0 {
            return if matches!(self.state, ReaderState::Done) {
                1.0
            } else {
                0.0
            };
        }
        (self.position() as f64 / self.total_bytes as f64).min(1.0) as f32
    }

    /// Index of the constituent being read, if one is open.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        match &self.state {
            ReaderState::Reading { index, .. } => Some(*index),
            _ => None,
        }
    }

    #[must_use]
    pub fn current_path(&self) -> Option<&Path> {
        match &self.state {
            ReaderState::Reading { reader, .. } => Some(reader.path()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self.state, ReaderState::Done)
    }

    #[must_use]
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    #[must_use]
    pub fn split(&self) -> &CompositeSplit {
        &self.split
    }
}

impl Iterator for CompositeReader {
    type Item = Result<StructuredRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}
