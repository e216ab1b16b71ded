//! JSON Lines.
//!
//! One JSON document per line; empty/whitespace-only lines are skipped. Objects
//! become the record's fields, any other JSON value is stored under `body`. The
//! shared header is ignored: JSON Lines files carry none.

use crate::fs::SeekRead;
use crate::io::decoder::{DecodeContext, Decoder, RecordStream};
use crate::io::lines::LineRangeReader;
use crate::record::StructuredRecord;
use crate::split::PathTrackingSplit;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, Default)]
pub struct JsonlDecoder;

impl Decoder for JsonlDecoder {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    fn decode(
        &self,
        input: Box<dyn SeekRead>,
        split: &PathTrackingSplit,
        ctx: &DecodeContext,
    ) -> Result<Box<dyn RecordStream>> {
        let lines = LineRangeReader::open(input, split, None)?;
        Ok(Box::new(JsonlStream {
            lines,
            path: ctx.path.clone(),
        }))
    }
}

struct JsonlStream {
    lines: LineRangeReader,
    path: PathBuf,
}

impl JsonlStream {
    fn next_record(&mut self) -> Result<Option<StructuredRecord>> {
        while let Some(line) = self.lines.next_line()? {
            if line.text.trim().is_empty() {
                continue;
            }
            let v: Value = serde_json::from_str(&line.text).with_context(|| {
                format!(
                    "parse JSONL line at offset {} in {}: {}",
                    line.offset,
                    self.path.display(),
                    line.text
                )
            })?;
            return Ok(Some(StructuredRecord::from(v)));
        }
        Ok(None)
    }
}

impl Iterator for JsonlStream {
    type Item = Result<StructuredRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

impl RecordStream for JsonlStream {
    fn bytes_consumed(&self) -> u64 {
        self.lines.bytes_consumed()
    }
}
