//! Newline-delimited reading of one file range.
//!
//! Ownership rule shared by all line-based decoders: a line belongs to the range
//! that contains its first byte, except that a line starting exactly at a range
//! boundary belongs to the range that *ends* there. Concretely:
//!
//! - a range starting at offset 0 begins with the first line;
//! - a range starting elsewhere discards everything up to and including its first
//!   `\n`;
//! - a range reads every line that starts at or before its end offset.
//!
//! Adjacent ranges therefore see each line exactly once.

use crate::fs::SeekRead;
use crate::split::PathTrackingSplit;
use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, SeekFrom};
use std::path::PathBuf;

/// One decoded line and the absolute file offset it starts at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub offset: u64,
    pub text: String,
}

pub struct LineRangeReader {
    reader: BufReader<Box<dyn SeekRead>>,
    path: PathBuf,
    start: u64,
    end: u64,
    pos: u64,
    skip_header: Option<String>,
    done: bool,
    buf: Vec<u8>,
}

impl LineRangeReader {
    /// Position `input` at the first line owned by `split`.
    ///
    /// When `skip_header` is set, a first line of the file (offset 0) equal to it
    /// is not returned. The range itself is not shifted.
    ///
    /// # Errors
    ///
    /// Returns an error if seeking or the initial partial-line skip fails.
    pub fn open(
        mut input: Box<dyn SeekRead>,
        split: &PathTrackingSplit,
        skip_header: Option<String>,
    ) -> Result<Self> {
        input
            .seek(SeekFrom::Start(split.start))
            .with_context(|| format!("seek to {} in {}", split.start, split.path.display()))?;
        let mut reader = BufReader::new(input);
        let mut pos = split.start;
        if split.start != 0 {
            let mut skipped = Vec::new();
            pos += reader
                .read_until(b'\n', &mut skipped)
                .with_context(|| format!("skip partial line in {}", split.path.display()))?
                as u64;
        }
        Ok(Self {
            reader,
            path: split.path.clone(),
            start: split.start,
            end: split.end(),
            pos,
            skip_header,
            done: false,
            buf: Vec::new(),
        })
    }

    /// Next owned line, without its `\n` / `\r\n` terminator.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or if the line is not valid UTF-8.
    pub fn next_line(&mut self) -> Result<Option<Line>> {
        loop {
            if self.done || self.pos > self.end {
                self.done = true;
                return Ok(None);
            }
            self.buf.clear();
            let offset = self.pos;
            let n = self
                .reader
                .read_until(b'\n', &mut self.buf)
                .with_context(|| {
                    format!("read line at offset {offset} in {}", self.path.display())
                })?;
            if n == 0 {
                self.done = true;
                return Ok(None);
            }
            self.pos += n as u64;
            if self.buf.last() == Some(&b'\n') {
                self.buf.pop();
                if self.buf.last() == Some(&b'\r') {
                    self.buf.pop();
                }
            }
            let text = String::from_utf8(std::mem::take(&mut self.buf)).with_context(|| {
                format!("line at offset {offset} in {} is not UTF-8", self.path.display())
            })?;
            if offset == 0 && self.skip_header.as_deref() == Some(text.as_str()) {
                continue;
            }
            return Ok(Some(Line { offset, text }));
        }
    }

    #[must_use]
    pub fn bytes_consumed(&self) -> u64 {
        self.pos.min(self.end).saturating_sub(self.start)
    }
}
