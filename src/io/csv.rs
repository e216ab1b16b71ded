//! Delimited text (CSV, TSV, pipe-separated...).
//!
//! Lines are owned per the rules in [`lines`](crate::io::lines) and each one is
//! parsed on its own with the `csv` crate, so quoted fields may not span lines.
//!
//! Column names come from the shared header of the composite split, parsed with
//! the same delimiter. Without a header, or for values beyond the header's width,
//! columns are named `field_0`, `field_1`, ... All values are strings. Blank lines
//! are skipped, and a first line equal to the header is dropped.

use crate::fs::SeekRead;
use crate::io::decoder::{DecodeContext, Decoder, RecordStream};
use crate::io::lines::LineRangeReader;
use crate::record::StructuredRecord;
use crate::split::PathTrackingSplit;
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug)]
pub struct CsvDecoder {
    delimiter: u8,
}

impl Default for CsvDecoder {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvDecoder {
    #[must_use]
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    #[must_use]
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }
}

/// Split one line into fields.
fn parse_fields(line: &str, delimiter: u8) -> Result<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(line.as_bytes());
    let mut rec = csv::StringRecord::new();
    rdr.read_record(&mut rec)?;
    Ok(rec.iter().map(str::to_string).collect())
}

impl Decoder for CsvDecoder {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn decode(
        &self,
        input: Box<dyn SeekRead>,
        split: &PathTrackingSplit,
        ctx: &DecodeContext,
    ) -> Result<Box<dyn RecordStream>> {
        let columns = match &ctx.header {
            Some(h) => parse_fields(h, self.delimiter)
                .with_context(|| format!("parse header of {}", ctx.path.display()))?,
            None => Vec::new(),
        };
        let lines = LineRangeReader::open(input, split, ctx.header.clone())?;
        Ok(Box::new(CsvStream {
            lines,
            columns,
            delimiter: self.delimiter,
            path: ctx.path.clone(),
        }))
    }
}

struct CsvStream {
    lines: LineRangeReader,
    columns: Vec<String>,
    delimiter: u8,
    path: PathBuf,
}

impl CsvStream {
    fn next_record(&mut self) -> Result<Option<StructuredRecord>> {
        while let Some(line) = self.lines.next_line()? {
            if line.text.trim().is_empty() {
                continue;
            }
            let values = parse_fields(&line.text, self.delimiter).with_context(|| {
                format!("parse CSV line at offset {} in {}", line.offset, self.path.display())
            })?;
            let mut rec = StructuredRecord::new();
            for (i, v) in values.into_iter().enumerate() {
                match self.columns.get(i) {
                    Some(name) => rec.set(name.clone(), v),
                    None => rec.set(format!("field_{i}"), v),
                }
            }
            return Ok(Some(rec));
        }
        Ok(None)
    }
}

impl Iterator for CsvStream {
    type Item = Result<StructuredRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

impl RecordStream for CsvStream {
    fn bytes_consumed(&self) -> u64 {
        self.lines.bytes_consumed()
    }
}
