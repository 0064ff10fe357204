//! Conversion between [Record]s and the flat string maps a hash store holds.
//!
//! A save goes `Record -> flatten -> encode_fields`, a read goes
//! `decode_fields -> unflatten -> coerce_types`. Paths are joined with
//! [FIELD_SEPARATOR], array elements use their index as the segment.
//!
//! The stored form is lossy in a few documented places:
//!
//! * every number comes back as the narrowest of `i64`/`f64` that parses it
//! * booleans come back as the strings `"true"`/`"false"`
//! * dates come back as epoch milliseconds
//! * null comes back as an empty string
//! * a record whose keys are all canonical integers comes back as an array
//!
//! Empty records and arrays are stored as `{}` and `[]`. A string leaf that
//! equals one of those markers, or starts with [STRING_ESCAPE], is stored
//! with one extra [STRING_ESCAPE] in front, which is removed again on read.

use indexmap::IndexMap;
use std::collections::BTreeMap;

use crate::common::{
    Value, DOC_ID, EMPTY_ARRAY_MARKER, EMPTY_RECORD_MARKER, FIELD_SEPARATOR, STRING_ESCAPE,
};
use crate::errors::{ErrorKind, HashStashError, HashStashResult};
use crate::record::Record;

/// Dotted path to leaf value, in traversal order.
pub type FlatMap = IndexMap<String, Value>;

/// Flattens a record into dotted paths.
///
/// Leaves are scalars, dates, null and empty containers. Empty containers
/// are kept so they survive the trip through the store.
///
/// ```ignore
/// let flat = flatten(&record! { a: { b: 1 }, c: [true] });
/// assert_eq!(flat.get("a.b"), Some(&Value::I64(1)));
/// assert_eq!(flat.get("c.0"), Some(&Value::Bool(true)));
/// ```
pub fn flatten(record: &Record) -> FlatMap {
    let mut flat = FlatMap::new();
    for (key, value) in record.iter() {
        flatten_into(key.clone(), value, &mut flat);
    }
    flat
}

fn flatten_into(path: String, value: &Value, flat: &mut FlatMap) {
    match value {
        Value::Record(record) if !record.is_empty() => {
            for (key, child) in record.iter() {
                flatten_into(join(&path, key), child, flat);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(join(&path, &index.to_string()), child, flat);
            }
        }
        _ => {
            flat.insert(path, value.clone());
        }
    }
}

fn join(prefix: &str, segment: &str) -> String {
    format!("{}{}{}", prefix, FIELD_SEPARATOR, segment)
}

/// Rebuilds a nested record from dotted paths.
///
/// A container's kind is decided by the first path that reaches it: a
/// canonical integer segment (no sign, no leading zeros) makes an array,
/// anything else a record. Paths that contradict an earlier one are dropped
/// with a warning, gaps in arrays are filled with [Value::Null], and an
/// array index no smaller than the number of flat entries is treated as a
/// contradiction.
pub fn unflatten(flat: &FlatMap) -> Record {
    let mut root = Node::Object(IndexMap::new());
    for (path, value) in flat {
        if let Err(reason) = insert_path(&mut root, path, value.clone(), flat.len()) {
            log::warn!("Dropping field {} while rebuilding record: {}", path, reason);
        }
    }
    match root.into_value() {
        Value::Record(record) => record,
        _ => Record::new(),
    }
}

/// Like [unflatten] but fails on the first contradicting path.
pub fn unflatten_strict(flat: &FlatMap) -> HashStashResult<Record> {
    let mut root = Node::Object(IndexMap::new());
    for (path, value) in flat {
        if let Err(reason) = insert_path(&mut root, path, value.clone(), flat.len()) {
            log::error!("Cannot rebuild field {}: {}", path, reason);
            return Err(HashStashError::new(
                &format!("Cannot rebuild field {}: {}", path, reason),
                ErrorKind::EncodingError,
            ));
        }
    }
    match root.into_value() {
        Value::Record(record) => Ok(record),
        _ => Err(HashStashError::new(
            "Flat map did not rebuild into a record",
            ErrorKind::EncodingError,
        )),
    }
}

enum Node {
    Leaf(Value),
    Object(IndexMap<String, Node>),
    List(BTreeMap<usize, Node>),
}

impl Node {
    fn container_for(next_segment: &str) -> Node {
        if array_index(next_segment).is_some() {
            Node::List(BTreeMap::new())
        } else {
            Node::Object(IndexMap::new())
        }
    }

    fn into_value(self) -> Value {
        match self {
            Node::Leaf(value) => value,
            Node::Object(children) => Value::Record(
                children
                    .into_iter()
                    .map(|(key, node)| (key, node.into_value()))
                    .collect(),
            ),
            Node::List(children) => {
                let len = children.keys().next_back().map_or(0, |last| last + 1);
                let mut items = vec![Value::Null; len];
                for (index, node) in children {
                    items[index] = node.into_value();
                }
                Value::Array(items)
            }
        }
    }
}

fn insert_path(root: &mut Node, path: &str, value: Value, max_index: usize) -> Result<(), String> {
    let segments: Vec<&str> = path.split(FIELD_SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err("empty path segment".to_string());
    }

    let mut node = root;
    for (depth, segment) in segments.iter().enumerate() {
        let last = depth == segments.len() - 1;
        let slot: &mut Node = match node {
            Node::Leaf(_) => {
                return Err(format!("{} is already a scalar", segments[..depth].join(FIELD_SEPARATOR)));
            }
            Node::Object(children) => {
                if last {
                    if children.contains_key(*segment) {
                        return Err("field already set".to_string());
                    }
                    children.insert(segment.to_string(), Node::Leaf(value));
                    return Ok(());
                }
                children
                    .entry(segment.to_string())
                    .or_insert_with(|| Node::container_for(segments[depth + 1]))
            }
            Node::List(children) => {
                let index = match array_index(segment) {
                    Some(index) if index < max_index => index,
                    _ => return Err(format!("{} is not a valid array index", segment)),
                };
                if last {
                    if children.contains_key(&index) {
                        return Err("element already set".to_string());
                    }
                    children.insert(index, Node::Leaf(value));
                    return Ok(());
                }
                children
                    .entry(index)
                    .or_insert_with(|| Node::container_for(segments[depth + 1]))
            }
        };
        node = slot;
    }
    Ok(())
}

/// Parses a canonical array index: digits only, no leading zeros.
fn array_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if segment.len() > 1 && segment.starts_with('0') {
        return None;
    }
    segment.parse().ok()
}

/// Returns a copy of `record` with numeric-looking strings turned into numbers.
///
/// Applies at every depth. The top-level `_id` is never converted.
pub fn coerce_types(record: &Record) -> Record {
    record
        .iter()
        .map(|(key, value)| {
            if key == DOC_ID {
                (key.clone(), value.clone())
            } else {
                (key.clone(), coerce_value(value))
            }
        })
        .collect()
}

/// Converts a single value the way [coerce_types] does.
pub fn coerce_value(value: &Value) -> Value {
    match value {
        Value::String(text) => parse_numeric(text).unwrap_or_else(|| value.clone()),
        Value::Array(items) => Value::Array(items.iter().map(coerce_value).collect()),
        Value::Record(record) => Value::Record(
            record
                .iter()
                .map(|(key, child)| (key.clone(), coerce_value(child)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Parses text that is entirely a numeric literal.
///
/// Integers that fit `i64` become [Value::I64], anything else that parses
/// to a finite float becomes [Value::F64]. Surrounding whitespace, `NaN`
/// and infinities are rejected.
pub fn parse_numeric(text: &str) -> Option<Value> {
    if text.is_empty() || text.trim() != text {
        return None;
    }
    if let Ok(number) = text.parse::<i64>() {
        return Some(Value::I64(number));
    }
    match text.parse::<f64>() {
        Ok(number) if number.is_finite() => Some(Value::F64(number)),
        _ => None,
    }
}

/// Renders a flat leaf as the string the store keeps.
pub fn encode_leaf(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => escape_text(text),
        Value::Date(date) => date.timestamp_millis().to_string(),
        Value::Array(items) if items.is_empty() => EMPTY_ARRAY_MARKER.to_string(),
        Value::Record(record) if record.is_empty() => EMPTY_RECORD_MARKER.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::I64(number) => number.to_string(),
        Value::F64(number) => number.to_string(),
        other => other.to_string(),
    }
}

fn escape_text(text: &str) -> String {
    if text == EMPTY_RECORD_MARKER || text == EMPTY_ARRAY_MARKER || text.starts_with(STRING_ESCAPE) {
        format!("{}{}", STRING_ESCAPE, text)
    } else {
        text.to_string()
    }
}

/// Encodes every leaf of a flat map into hash field/value pairs.
pub fn encode_fields(flat: &FlatMap) -> Vec<(String, String)> {
    flat.iter()
        .map(|(path, value)| (path.clone(), encode_leaf(value)))
        .collect()
}

/// Turns stored hash fields back into a flat map, restoring empty containers
/// and unescaping strings that were stored escaped.
///
/// Every other value comes back as a string; [coerce_types] recovers numbers
/// after [unflatten].
pub fn decode_fields<I>(fields: I) -> FlatMap
where
    I: IntoIterator<Item = (String, String)>,
{
    fields
        .into_iter()
        .map(|(path, text)| {
            let value = if let Some(escaped) = text.strip_prefix(STRING_ESCAPE) {
                Value::String(escaped.to_string())
            } else {
                match text.as_str() {
                    EMPTY_RECORD_MARKER => Value::Record(Record::new()),
                    EMPTY_ARRAY_MARKER => Value::Array(Vec::new()),
                    _ => Value::String(text),
                }
            };
            (path, value)
        })
        .collect()
}

/// Decodes stored hash fields all the way back to a typed record.
pub fn decode_record<I>(fields: I) -> Record
where
    I: IntoIterator<Item = (String, String)>,
{
    coerce_types(&unflatten(&decode_fields(fields)))
}
