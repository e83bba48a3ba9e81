//! Dynamic row model
//!
//! A `Row` is an ordered mapping from field name to a JSON value, the shape
//! every `DataSource` hands back. Insertion order is kept so that rows
//! serialise with their columns in select order.

use serde::Serialize;
use serde_json::{Map, Value};

/// A single record returned by a data source.
pub type Row = Map<String, Value>;

/// Build a `Row` from a JSON object literal.
///
/// Non-object values produce an empty row.
pub fn row_from(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

/// Deterministic string form used when two records must be compared by value.
pub trait CanonicalForm {
    fn canonical_form(&self) -> String;
}

impl CanonicalForm for Value {
    fn canonical_form(&self) -> String {
        let mut out = String::new();
        write_canonical(self, &mut out);
        out
    }
}

impl CanonicalForm for Row {
    fn canonical_form(&self) -> String {
        let mut out = String::new();
        write_canonical_object(self, &mut out);
        out
    }
}

/// Canonical form of any serialisable value.
pub fn canonical_form_of<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    Ok(serde_json::to_value(value)?.canonical_form())
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_canonical_object(map, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        // Scalars already have a single compact JSON rendering
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_canonical_object(map: &Map<String, Value>, out: &mut String) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    out.push('{');
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_canonical(&map[key.as_str()], out);
    }
    out.push('}');
}
