//! Avro object container files.
//!
//! Container files can only be decoded from their first byte (the header holds the
//! writer schema and sync marker), so this decoder reports itself as not
//! splittable and the planner keeps each file in a single range. A range that does
//! not start at offset 0 yields nothing.
//!
//! Records are converted to JSON values; a record's fields become the structured
//! record's fields. An optional reader schema is applied with Avro schema
//! resolution before conversion.

use crate::fs::SeekRead;
use crate::io::decoder::{DecodeContext, Decoder, RecordStream};
use crate::record::StructuredRecord;
use crate::split::PathTrackingSplit;
use anyhow::{Context, Result, bail};
use apache_avro::Schema;
use apache_avro::types::Value as AvroValue;
use serde_json::Value as JsonValue;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Debug, Default)]
pub struct AvroDecoder {
    reader_schema: Option<Arc<Schema>>,
}

impl AvroDecoder {
    /// Decode with `schema_json` as the reader schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema does not parse.
    pub fn with_reader_schema(schema_json: &str) -> Result<Self> {
        let schema = Schema::parse_str(schema_json).context("parse Avro reader schema")?;
        Ok(Self {
            reader_schema: Some(Arc::new(schema)),
        })
    }
}

impl Decoder for AvroDecoder {
    fn name(&self) -> &'static str {
        "avro"
    }

    fn is_splittable(&self) -> bool {
        false
    }

    fn decode(
        &self,
        input: Box<dyn SeekRead>,
        split: &PathTrackingSplit,
        ctx: &DecodeContext,
    ) -> Result<Box<dyn RecordStream>> {
        if split.start != 0 {
            return Ok(Box::new(AvroStream {
                reader: None,
                reader_schema: None,
                consumed: Arc::new(AtomicU64::new(split.length)),
                length: split.length,
                path: ctx.path.clone(),
            }));
        }
        let consumed = Arc::new(AtomicU64::new(0));
        let counting = CountingRead {
            inner: input,
            count: Arc::clone(&consumed),
        };
        let reader = apache_avro::Reader::new(BufReader::new(counting))
            .with_context(|| format!("read Avro container header of {}", ctx.path.display()))?;
        Ok(Box::new(AvroStream {
            reader: Some(reader),
            reader_schema: self.reader_schema.clone(),
            consumed,
            length: split.length,
            path: ctx.path.clone(),
        }))
    }
}

struct CountingRead {
    inner: Box<dyn SeekRead>,
    count: Arc<AtomicU64>,
}

impl Read for CountingRead {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

struct AvroStream {
    reader: Option<apache_avro::Reader<'static, BufReader<CountingRead>>>,
    reader_schema: Option<Arc<Schema>>,
    consumed: Arc<AtomicU64>,
    length: u64,
    path: PathBuf,
}

impl AvroStream {
    fn convert(&self, value: AvroValue) -> Result<StructuredRecord> {
        let value = match &self.reader_schema {
            Some(schema) => value
                .resolve(schema)
                .with_context(|| format!("resolve Avro record in {}", self.path.display()))?,
            None => value,
        };
        let json = avro_to_json(value)
            .with_context(|| format!("convert Avro record in {}", self.path.display()))?;
        Ok(StructuredRecord::from(json))
    }
}

fn float_to_json(f: f64) -> JsonValue {
    serde_json::Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number)
}

/// Convert a decoded Avro value to JSON. Logical types are emitted as their
/// underlying primitive (days, millis, micros).
fn avro_to_json(value: AvroValue) -> Result<JsonValue> {
    Ok(match value {
        AvroValue::Null => JsonValue::Null,
        AvroValue::Boolean(b) => JsonValue::Bool(b),
        AvroValue::Int(i) | AvroValue::Date(i) | AvroValue::TimeMillis(i) => JsonValue::from(i),
        AvroValue::Long(l)
        | AvroValue::TimeMicros(l)
        | AvroValue::TimestampMillis(l)
        | AvroValue::TimestampMicros(l) => JsonValue::from(l),
        AvroValue::Float(f) => float_to_json(f64::from(f)),
        AvroValue::Double(d) => float_to_json(d),
        AvroValue::Bytes(b) | AvroValue::Fixed(_, b) => JsonValue::from(b),
        AvroValue::String(s) | AvroValue::Enum(_, s) => JsonValue::String(s),
        AvroValue::Union(_, inner) => avro_to_json(*inner)?,
        AvroValue::Array(items) => JsonValue::Array(
            items
                .into_iter()
                .map(avro_to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        AvroValue::Map(entries) => {
            let mut keys: Vec<_> = entries.into_iter().collect();
            keys.sort_by(|a, b| a.0.cmp(&b.0));
            let mut obj = serde_json::Map::new();
            for (k, v) in keys {
                obj.insert(k, avro_to_json(v)?);
            }
            JsonValue::Object(obj)
        }
        AvroValue::Record(fields) => {
            let mut obj = serde_json::Map::new();
            for (k, v) in fields {
                obj.insert(k, avro_to_json(v)?);
            }
            JsonValue::Object(obj)
        }
        other => bail!("unsupported Avro value {other:?}"),
    })
}

impl Iterator for AvroStream {
    type Item = Result<StructuredRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.reader.as_mut()?.next();
        match next {
            Some(Ok(value)) => Some(self.convert(value)),
            Some(Err(e)) => Some(
                Err(e).with_context(|| format!("decode Avro block in {}", self.path.display())),
            ),
            None => {
                self.reader = None;
                self.consumed.store(self.length, Ordering::Relaxed);
                None
            }
        }
    }
}

impl RecordStream for AvroStream {
    fn bytes_consumed(&self) -> u64 {
        self.consumed.load(Ordering::Relaxed).min(self.length)
    }
}
