use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::operator::Operator;
use crate::meta::FieldRef;

/// A parameter value, either raw from the request or cast by a checker.
#[derive(Debug, Clone)]
pub enum Param {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
    List(Vec<Param>),
    Map(ParameterSet),
    /// A resolved field handle
    Field(FieldRef),
    /// A resolved comparison operator
    Operator(Operator),
}

impl Param {
    /// Convert a raw JSON value, keeping maps in key order
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or_default()), Self::Int),
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// JSON rendering; fields render as their name and operators as their symbol
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::Text(s) => Value::String(s.clone()),
            Self::Date(d) => Value::String(d.to_string()),
            Self::DateTime(dt) => Value::String(dt.to_rfc3339()),
            Self::Uuid(u) => Value::String(u.to_string()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(set) => Value::Object(
                set.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
            Self::Field(field) => Value::String(field.name().to_string()),
            Self::Operator(op) => Value::String(op.symbol().to_string()),
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// String form of a scalar, as it would appear in a query string
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Date(d) => Some(d.to_string()),
            Self::DateTime(dt) => Some(dt.to_rfc3339()),
            Self::Uuid(u) => Some(u.to_string()),
            Self::Field(field) => Some(field.name().to_string()),
            Self::Operator(op) => Some(op.name().to_string()),
            Self::Null | Self::List(_) | Self::Map(_) => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view, parsing text when needed
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Text(s) => s.trim().parse().ok(),
            #[allow(clippy::cast_possible_truncation)]
            Self::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Param]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_field(&self) -> Option<&FieldRef> {
        match self {
            Self::Field(field) => Some(field),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_operator(&self) -> Option<Operator> {
        match self {
            Self::Operator(op) => Some(*op),
            _ => None,
        }
    }

    /// Treat the value as a list: lists are kept, null is empty, scalars are wrapped
    #[must_use]
    pub fn into_list(self) -> Vec<Param> {
        match self {
            Self::List(items) => items,
            Self::Null => Vec::new(),
            other => vec![other],
        }
    }
}

impl PartialEq for Param {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Uuid(a), Self::Uuid(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Field(a), Self::Field(b)) => a.name() == b.name(),
            (Self::Operator(a), Self::Operator(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<Operator> for Param {
    fn from(value: Operator) -> Self {
        Self::Operator(value)
    }
}

impl From<FieldRef> for Param {
    fn from(value: FieldRef) -> Self {
        Self::Field(value)
    }
}

impl<T: Into<Param>> From<Vec<T>> for Param {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// An ordered map of parameter name to value.
///
/// Order is significant: defaults declare the order in which checkers run,
/// so a checker may read siblings that were declared before it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    entries: Vec<(String, Param)>,
}

/// One normalized parameter map derived from a single raw filter invocation.
pub type Occurrence = ParameterSet;

impl ParameterSet {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Occurrence holding a single `value`
    #[must_use]
    pub fn with_value(value: Param) -> Self {
        let mut set = Self::new();
        set.insert("value", value);
        set
    }

    /// Builder-style insert
    #[must_use]
    pub fn and(mut self, key: &str, value: impl Into<Param>) -> Self {
        self.insert(key, value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Param> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Insert or replace; replaced keys keep their position
    pub fn insert(&mut self, key: &str, value: Param) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Take a value out, leaving `Null` in its slot
    pub fn take(&mut self, key: &str) -> Option<Param> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| std::mem::replace(v, Param::Null))
    }

    pub fn remove(&mut self, key: &str) -> Option<Param> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overlay `occurrence` on top of `self`; occurrence values win
    #[must_use]
    pub fn merged_with(mut self, occurrence: Self) -> Self {
        for (key, value) in occurrence.entries {
            self.insert(&key, value);
        }
        self
    }

    /// `value`, or `Null` when missing
    #[must_use]
    pub fn value(&self) -> &Param {
        self.get("value").unwrap_or(&Param::Null)
    }

    /// Resolved `field`, when the field checker produced a single handle
    #[must_use]
    pub fn field(&self) -> Option<&FieldRef> {
        self.get("field").and_then(Param::as_field)
    }

    /// Resolved `operator`
    #[must_use]
    pub fn operator(&self) -> Option<Operator> {
        self.get("operator").and_then(Param::as_operator)
    }
}

impl FromIterator<(String, Param)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (String, Param)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (key, value) in iter {
            set.insert(&key, value);
        }
        set
    }
}
