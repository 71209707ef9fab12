use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::{Direction, Record, RecordCollection, RelatedRecord};

/// A record held as a JSON object, with per-field visibility.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonRecord {
    attributes: Map<String, Value>,
    hidden: BTreeSet<String>,
    relation: Option<String>,
}

impl JsonRecord {
    #[must_use]
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self {
            attributes,
            ..Self::default()
        }
    }

    /// Build from a JSON value; non-objects give an empty record
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::new(map),
            _ => Self::default(),
        }
    }

    /// Fields hidden until made visible
    #[must_use]
    pub fn hidden<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hidden.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Mark this record as reached through `relation`
    #[must_use]
    pub fn through(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    #[must_use]
    pub fn is_hidden(&self, field: &str) -> bool {
        self.hidden.contains(field)
    }

    /// Visible attributes only
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.attributes
                .iter()
                .filter(|(k, _)| !self.hidden.contains(*k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl Record for JsonRecord {
    fn attribute(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    fn set_field_visibility(&mut self, field: &str, visible: bool) {
        if visible {
            self.hidden.remove(field);
        } else {
            self.hidden.insert(field.to_string());
        }
    }
}

impl RelatedRecord for JsonRecord {
    fn relation(&self) -> &str {
        self.relation.as_deref().unwrap_or_default()
    }
}

impl Serialize for JsonRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// An ordered collection of [`JsonRecord`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecordSet {
    records: Vec<JsonRecord>,
}

impl RecordSet {
    #[must_use]
    pub const fn new(records: Vec<JsonRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[JsonRecord] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<JsonRecord> {
        self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of one attribute across the collection, in order
    #[must_use]
    pub fn pluck(&self, field: &str) -> Vec<Value> {
        self.records
            .iter()
            .map(|r| r.attribute(field).cloned().unwrap_or(Value::Null))
            .collect()
    }
}

impl FromIterator<JsonRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = JsonRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl RecordCollection for RecordSet {
    fn sort_by(&mut self, field: &str, direction: Direction) {
        self.records.sort_by(|a, b| {
            let ordering = compare_values(a.attribute(field), b.attribute(field));
            match direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            }
        });
    }

    fn set_field_visibility(&mut self, field: &str, visible: bool) {
        for record in &mut self.records {
            record.set_field_visibility(field, visible);
        }
    }
}

/// Missing and null first, then booleans, numbers, strings
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
