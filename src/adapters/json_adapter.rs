//! JSON record source: an array of flat objects, as returned by the price API.

use crate::domain::error::PipelineError;
use crate::domain::raw::{Column, RawBatch, RawRecord, RawValue};
use crate::ports::record_source::RecordSource;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

/// Converts a parsed JSON document into a raw batch. The column set is the
/// union of recognised keys across all objects.
pub fn batch_from_value(value: Value) -> Result<RawBatch, PipelineError> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(PipelineError::NotTabular {
                reason: format!("expected an array of records, found {}", kind(&other)),
            });
        }
    };

    let mut batch = RawBatch::default();
    for (i, item) in items.into_iter().enumerate() {
        let fields = match item {
            Value::Object(fields) => fields,
            other => {
                return Err(PipelineError::NotTabular {
                    reason: format!("element {} is {}, not a record", i, kind(&other)),
                });
            }
        };

        let mut row = RawRecord::new();
        for (key, cell) in fields {
            let Some(column) = Column::from_name(&key) else {
                continue;
            };
            batch.add_column(column);
            row.set(column, raw_value(cell));
        }
        batch.push(row);
    }

    Ok(batch)
}

pub fn read_batch(input: &str) -> Result<RawBatch, PipelineError> {
    batch_from_value(serde_json::from_str(input)?)
}

/// Only `null` is missing. A blank string is a malformed value, so it fails
/// coercion later instead of being forward-filled.
fn raw_value(cell: Value) -> RawValue {
    match cell {
        Value::Null => RawValue::Missing,
        Value::Number(n) => n.as_f64().map(RawValue::Number).unwrap_or_default(),
        Value::String(s) => RawValue::Text(s),
        // bools and nested values never coerce to a price or date
        other => RawValue::Text(other.to_string()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl RecordSource for JsonFileSource {
    fn load(&self) -> Result<RawBatch, PipelineError> {
        let content = fs::read_to_string(&self.path)?;
        read_batch(&content)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
