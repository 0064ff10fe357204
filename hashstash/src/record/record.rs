use im::OrdMap;
use smallvec::SmallVec;

use crate::common::{escape_json, Value, DOC_ID, FIELD_SEPARATOR, RESERVED_FIELDS};
use crate::errors::{ErrorKind, HashStashError, HashStashResult};
use std::collections::BTreeMap;
use std::fmt::{Debug, Display};

type FieldVec = SmallVec<[String; 8]>;

/// A nested, JSON-shaped record saved as a single hash in the store.
///
/// Keys are [String]s and values are [Value]s. Nested records and arrays are
/// addressed with dotted paths, so `record.get("address.city")` reads the
/// `city` field of the nested `address` record and `record.get("tags.0")`
/// reads the first element of the `tags` array.
///
/// The reserved field `_id` holds the record's full store key. It is assigned
/// on save when missing and must always be a non-empty string.
///
/// Backed by `im::OrdMap`, so clones are cheap and share structure.
#[derive(Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Record {
    data: OrdMap<String, Value>,
}

impl Record {
    /// Creates a new empty record.
    ///
    /// ```ignore
    /// let record = Record::new();
    /// assert!(record.is_empty());
    /// ```
    pub fn new() -> Self {
        Record {
            data: OrdMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Associates `value` with `key`, creating intermediate records for a
    /// dotted key.
    ///
    /// # Errors
    ///
    /// * the key or one of its segments is empty
    /// * the key is `_id` and the value is not a non-empty string
    ///
    /// ```ignore
    /// let mut record = Record::new();
    /// record.put("user.name", "Alice")?;
    /// assert_eq!(record.get("user.name")?, Value::from("Alice"));
    /// ```
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> HashStashResult<()> {
        if key.is_empty() {
            log::error!("Record does not support empty key");
            return Err(HashStashError::new(
                "Record does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }

        let value = value.into();
        if key == DOC_ID {
            return match value {
                Value::String(ref id) if !id.is_empty() => {
                    self.data = self.data.update(key.to_string(), value);
                    Ok(())
                }
                _ => {
                    log::error!("Record id must be a non-empty string, found {:?}", value);
                    Err(HashStashError::new(
                        "Record id must be a non-empty string",
                        ErrorKind::InvalidOperation,
                    ))
                }
            };
        }

        if key.contains(FIELD_SEPARATOR) {
            let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
            self.deep_put(&splits, value)
        } else {
            self.data = self.data.update(key.to_string(), value);
            Ok(())
        }
    }

    /// Returns the value at `key`, or [Value::Null] when absent.
    ///
    /// Dotted keys descend through nested records and array indexes.
    pub fn get(&self, key: &str) -> HashStashResult<Value> {
        match self.data.get(key) {
            Some(value) => Ok(value.clone()),
            None if key.contains(FIELD_SEPARATOR) => self.deep_get(key),
            None => Ok(Value::Null),
        }
    }

    /// Returns the record's store key, if it has one.
    pub fn id(&self) -> Option<String> {
        self.data
            .get(DOC_ID)
            .and_then(|value| value.as_string())
            .cloned()
    }

    pub fn has_id(&self) -> bool {
        self.data.contains_key(DOC_ID)
    }

    /// Returns the dotted path of every leaf field, skipping `_id`.
    ///
    /// Paths descend into nested records only; arrays are reported as a
    /// single field.
    pub fn fields(&self) -> FieldVec {
        self.get_fields_internal("")
    }

    /// Removes `key` and its value. Missing keys are not an error.
    ///
    /// Removing the last field of a nested record removes the nested record.
    pub fn remove(&mut self, key: &str) -> HashStashResult<()> {
        if key.contains(FIELD_SEPARATOR) {
            let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
            self.deep_remove(&splits)
        } else {
            self.data = self.data.without(key);
            Ok(())
        }
    }

    /// Number of top-level entries.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Checks for a top-level key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Checks for a field at any depth, using a dotted path.
    pub fn contains_field(&self, field: &str) -> bool {
        if self.contains_key(field) {
            return true;
        }
        self.fields().iter().any(|f| f == field)
    }

    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Iterates the top-level entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    /// Sets a top-level entry without path splitting or id validation.
    ///
    /// Used when rebuilding records from their stored form, where keys
    /// are already single segments.
    pub(crate) fn insert_raw(&mut self, key: String, value: Value) {
        self.data.insert(key, value);
    }

    pub(crate) fn to_pretty_json(&self, indent: usize) -> String {
        if self.data.is_empty() {
            return "{}".to_string();
        }

        let mut json_string = String::with_capacity(self.data.len() * 30 + indent * 2);
        json_string.push_str("{\n");
        let indent_str = " ".repeat(indent + 2);
        for (key, value) in self.data.iter() {
            json_string.push_str(&format!(
                "{}{}: {},\n",
                indent_str,
                escape_json(key),
                value.to_pretty_json(indent + 2)
            ));
        }

        json_string.pop();
        json_string.pop();
        json_string.push_str(&format!("\n{}}}", " ".repeat(indent)));
        json_string
    }

    pub(crate) fn to_debug_string(&self, indent: usize) -> String {
        if self.data.is_empty() {
            return "{}".to_string();
        }

        let mut debug_string = String::new();
        debug_string.push_str("{\n");
        let indent_str = " ".repeat(indent + 2);
        for (key, value) in self.data.iter() {
            debug_string.push_str(&format!(
                "{}\"{}\": {},\n",
                indent_str,
                key,
                value.to_debug_string(indent + 2)
            ));
        }

        debug_string.pop();
        debug_string.pop();
        debug_string.push_str(&format!("\n{}}}", " ".repeat(indent)));
        debug_string
    }

    fn get_fields_internal(&self, prefix: &str) -> FieldVec {
        let mut fields = FieldVec::new();

        for key in self.data.keys() {
            if key.is_empty() || RESERVED_FIELDS.contains(&key.as_str()) {
                continue;
            }

            let field = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}{}{}", prefix, FIELD_SEPARATOR, key)
            };

            match self.data.get(key) {
                Some(Value::Record(record)) if !record.is_empty() => {
                    fields.append(&mut record.get_fields_internal(&field));
                }
                _ => fields.push(field),
            }
        }
        fields
    }

    fn deep_put(&mut self, splits: &[&str], value: Value) -> HashStashResult<()> {
        let key = match splits.first() {
            Some(key) if !key.is_empty() => *key,
            _ => {
                log::error!("Record does not support empty key");
                return Err(HashStashError::new(
                    "Record does not support empty key",
                    ErrorKind::InvalidOperation,
                ));
            }
        };

        if splits.len() == 1 {
            self.data = self.data.update(key.to_string(), value);
            return Ok(());
        }

        let mut nested = match self.data.get(key) {
            Some(Value::Record(record)) => record.clone(),
            // anything else at this level is replaced by a fresh record
            _ => Record::new(),
        };
        nested.deep_put(&splits[1..], value)?;
        self.data = self.data.update(key.to_string(), Value::Record(nested));
        Ok(())
    }

    fn deep_remove(&mut self, splits: &[&str]) -> HashStashResult<()> {
        let key = match splits.first() {
            Some(key) if !key.is_empty() => *key,
            _ => {
                log::error!("Record does not support empty key");
                return Err(HashStashError::new(
                    "Record does not support empty key",
                    ErrorKind::InvalidOperation,
                ));
            }
        };

        if splits.len() == 1 {
            self.data = self.data.without(key);
            return Ok(());
        }

        match self.data.get(key) {
            Some(Value::Record(record)) => {
                let mut nested = record.clone();
                nested.deep_remove(&splits[1..])?;
                if nested.is_empty() {
                    self.data = self.data.without(key);
                } else {
                    self.data = self.data.update(key.to_string(), Value::Record(nested));
                }
                Ok(())
            }
            Some(Value::Array(items)) => {
                let index = parse_index(splits[1], items.len())?;
                let mut items = items.clone();
                if splits.len() > 2 {
                    if let Value::Record(record) = &items[index] {
                        let mut nested = record.clone();
                        nested.deep_remove(&splits[2..])?;
                        if nested.is_empty() {
                            items.remove(index);
                        } else {
                            items[index] = Value::Record(nested);
                        }
                    }
                } else {
                    items.remove(index);
                }
                self.data = self.data.update(key.to_string(), Value::Array(items));
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn deep_get(&self, key: &str) -> HashStashResult<Value> {
        let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
        let first = splits[0];
        if first.is_empty() {
            log::error!("Record does not support empty key");
            return Err(HashStashError::new(
                "Record does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }
        recursive_get(self.data.get(first), &splits[1..])
    }
}

fn recursive_get(value: Option<&Value>, splits: &[&str]) -> HashStashResult<Value> {
    let value = match value {
        None => return Ok(Value::Null),
        Some(v) => v,
    };

    let key = match splits.first() {
        None => return Ok(value.clone()),
        Some(key) => *key,
    };

    if key.is_empty() {
        log::error!("Record does not support empty key");
        return Err(HashStashError::new(
            "Record does not support empty key",
            ErrorKind::InvalidOperation,
        ));
    }

    match value {
        Value::Record(record) => recursive_get(record.data.get(key), &splits[1..]),
        Value::Array(items) => match key.parse::<usize>() {
            Ok(index) if index < items.len() => recursive_get(items.get(index), &splits[1..]),
            _ => Ok(Value::Null),
        },
        _ => Ok(Value::Null),
    }
}

fn parse_index(segment: &str, len: usize) -> HashStashResult<usize> {
    match segment.parse::<usize>() {
        Ok(index) if index < len => Ok(index),
        _ => {
            log::error!("Invalid array index {} for array of length {}", segment, len);
            Err(HashStashError::new(
                &format!("Invalid array index {} for array of length {}", segment, len),
                ErrorKind::ValidationError,
            ))
        }
    }
}

impl Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_debug_string(0))
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_pretty_json(0))
    }
}

impl From<BTreeMap<String, Value>> for Record {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Record {
            data: map.into_iter().collect(),
        }
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record {
            data: iter.into_iter().collect(),
        }
    }
}

#[doc(hidden)]
pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Record] with JSON-like syntax.
///
/// Keys may be bare identifiers or string literals. Values may be literals,
/// nested `{ ... }` records, `[ ... ]` arrays or parenthesised expressions.
///
/// ```rust
/// use hashstash::record;
///
/// let base = 100;
/// let record = record! {
///     username: "alice",
///     score: (base * 2),
///     address: { city: "Dar es Salaam" },
///     tags: ["admin", "user"]
/// };
/// assert_eq!(record.size(), 4);
/// ```
///
/// # Panics
///
/// Panics if a key is empty or `_id` is given a non-string value.
#[macro_export]
macro_rules! record {
    () => {
        $crate::record::Record::new()
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::record_value;

            let mut record = $crate::record::Record::new();
            $(
                record.put(&$crate::record::normalize(stringify!($key)), $crate::record_value!($value))
                    .expect(&format!("Failed to put value {} in record", stringify!($value)));
            )*
            record
        }
    };
}

/// Helper for [record!] that converts nested records, arrays and expressions.
#[macro_export]
macro_rules! record_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Record($crate::record!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::record_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
