//! Plain text lines.
//!
//! Each line becomes a record with two fields: `offset` (absolute byte offset of
//! the line in its file) and `body` (the line without its terminator). A first
//! line equal to the shared header is dropped.

use crate::fs::SeekRead;
use crate::io::decoder::{DecodeContext, Decoder, RecordStream};
use crate::io::lines::LineRangeReader;
use crate::record::StructuredRecord;
use crate::split::PathTrackingSplit;
use anyhow::Result;

#[derive(Clone, Copy, Debug, Default)]
pub struct TextDecoder;

impl Decoder for TextDecoder {
    fn name(&self) -> &'static str {
        "text"
    }

    fn decode(
        &self,
        input: Box<dyn SeekRead>,
        split: &PathTrackingSplit,
        ctx: &DecodeContext,
    ) -> Result<Box<dyn RecordStream>> {
        let lines = LineRangeReader::open(input, split, ctx.header.clone())?;
        Ok(Box::new(TextStream { lines }))
    }
}

struct TextStream {
    lines: LineRangeReader,
}

impl Iterator for TextStream {
    type Item = Result<StructuredRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.next_line().transpose().map(|line| {
            line.map(|l| {
                StructuredRecord::new()
                    .with_field("offset", l.offset)
                    .with_field("body", l.text)
            })
        })
    }
}

impl RecordStream for TextStream {
    fn bytes_consumed(&self) -> u64 {
        self.lines.bytes_consumed()
    }
}
