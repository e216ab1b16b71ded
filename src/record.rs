//! The structured record emitted by decoders.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An ordered set of named JSON values.
///
/// Decoders decide which fields a record carries. The path-tracking layer may add
/// one more field naming the file the record was read from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredRecord {
    fields: Map<String, Value>,
}

impl StructuredRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or replace a field, keeping its position if it already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Convenience accessor for string fields.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl From<Map<String, Value>> for StructuredRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Objects become fields; any other value is stored under `body`.
impl From<Value> for StructuredRecord {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            other => Self::new().with_field("body", other),
        }
    }
}
