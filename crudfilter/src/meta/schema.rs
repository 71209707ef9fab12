//! In-memory model metadata.
//!
//! ```rust,ignore
//! let meta = ModelMeta::new("user")
//!     .per_page(20)
//!     .with_field(FieldDef::attribute("name", FieldType::Text))
//!     .with_field(FieldDef::attribute("created_at", FieldType::DateTime))
//!     .with_field(FieldDef::computed("score", FieldType::Integer))
//!     .with_field(FieldDef::relation("father", "father_id", FieldType::Integer).with_reversed("children"));
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::{Field, FieldRef, Meta};
use crate::filtering::{Operator, Param};
use crate::targets::{Boolean, QueryBuilder};

/// Value type of a field, driving `cast`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    Uuid,
}

impl FieldType {
    /// Cast a scalar
    pub fn cast(self, value: Param) -> Result<Param, String> {
        match (self, value) {
            (_, Param::Null) => Ok(Param::Null),
            (Self::Text, value) => value
                .as_text()
                .map(Param::Text)
                .ok_or_else(|| "must be a string".to_string()),
            (Self::Integer, value) => value
                .as_i64()
                .map(Param::Int)
                .ok_or_else(|| "must be an integer".to_string()),
            (Self::Float, Param::Float(f)) => Ok(Param::Float(f)),
            #[allow(clippy::cast_precision_loss)]
            (Self::Float, Param::Int(i)) => Ok(Param::Float(i as f64)),
            (Self::Float, Param::Text(s)) => s
                .trim()
                .parse()
                .map(Param::Float)
                .map_err(|_| "must be a number".to_string()),
            (Self::Boolean, Param::Bool(b)) => Ok(Param::Bool(b)),
            (Self::Boolean, Param::Int(i)) if i == 0 || i == 1 => Ok(Param::Bool(i == 1)),
            (Self::Boolean, Param::Text(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Param::Bool(true)),
                "false" | "0" | "no" => Ok(Param::Bool(false)),
                _ => Err("must be a boolean".to_string()),
            },
            (Self::Date, Param::Date(d)) => Ok(Param::Date(d)),
            (Self::Date, Param::DateTime(dt)) => Ok(Param::Date(dt.date_naive())),
            (Self::Date, Param::Text(s)) => parse_date(&s).map(Param::Date),
            (Self::DateTime, Param::DateTime(dt)) => Ok(Param::DateTime(dt)),
            (Self::DateTime, Param::Date(d)) => Ok(Param::DateTime(start_of_day(d))),
            (Self::DateTime, Param::Text(s)) => parse_datetime(&s).map(Param::DateTime),
            (Self::Uuid, Param::Uuid(u)) => Ok(Param::Uuid(u)),
            (Self::Uuid, Param::Text(s)) => Uuid::parse_str(s.trim())
                .map(Param::Uuid)
                .map_err(|_| "must be a UUID".to_string()),
            (ty, _) => Err(format!("cannot be cast to {ty:?}")),
        }
    }
}

fn parse_date(text: &str) -> Result<NaiveDate, String> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| parse_datetime(text).map(|dt| dt.date_naive()).map_err(|_| ()))
        .map_err(|()| "must be a date (YYYY-MM-DD)".to_string())
}

fn parse_datetime(text: &str) -> Result<DateTime<Utc>, String> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(start_of_day)
        .map_err(|_| "must be a date-time".to_string())
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Shape of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Single storage column
    Attribute,
    /// Computed in memory, not queryable
    Computed,
    /// Several storage columns, addressed as `a,b`
    Composite { columns: Vec<String> },
    /// Foreign key(s) pointing at another model
    Relation {
        columns: Vec<String>,
        many: bool,
        reversed: Option<String>,
    },
}

/// Field definition usable as a [`Field`] handle.
#[derive(Debug, Clone)]
pub struct FieldDef {
    name: String,
    native: String,
    field_type: FieldType,
    kind: FieldKind,
}

impl FieldDef {
    pub fn attribute(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            native: name.clone(),
            name,
            field_type,
            kind: FieldKind::Attribute,
        }
    }

    pub fn computed(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            kind: FieldKind::Computed,
            ..Self::attribute(name, field_type)
        }
    }

    pub fn composite<I, S>(name: impl Into<String>, columns: I, field_type: FieldType) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: FieldKind::Composite {
                columns: columns.into_iter().map(Into::into).collect(),
            },
            ..Self::attribute(name, field_type)
        }
    }

    /// One-relation stored in `column`, with keys of `key_type`
    pub fn relation(name: impl Into<String>, column: impl Into<String>, key_type: FieldType) -> Self {
        let column = column.into();
        Self {
            native: column.clone(),
            kind: FieldKind::Relation {
                columns: vec![column],
                many: false,
                reversed: None,
            },
            ..Self::attribute(name, key_type)
        }
    }

    /// One-relation keyed by several columns
    pub fn composite_relation<I, S>(name: impl Into<String>, columns: I, key_type: FieldType) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: FieldKind::Relation {
                columns: columns.into_iter().map(Into::into).collect(),
                many: false,
                reversed: None,
            },
            ..Self::attribute(name, key_type)
        }
    }

    /// Relation to many records, stored on the other side
    pub fn many_relation(name: impl Into<String>, key_type: FieldType) -> Self {
        Self {
            kind: FieldKind::Relation {
                columns: Vec::new(),
                many: true,
                reversed: None,
            },
            ..Self::attribute(name, key_type)
        }
    }

    /// Override the storage column name
    #[must_use]
    pub fn with_native(mut self, native: impl Into<String>) -> Self {
        self.native = native.into();
        self
    }

    /// Name of the inverse field on the related model
    #[must_use]
    pub fn with_reversed(mut self, reversed: impl Into<String>) -> Self {
        if let FieldKind::Relation { reversed: slot, .. } = &mut self.kind {
            *slot = Some(reversed.into());
        }
        self
    }

    #[must_use]
    pub const fn kind(&self) -> &FieldKind {
        &self.kind
    }

    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.field_type
    }

    #[must_use]
    pub fn into_ref(self) -> FieldRef {
        Arc::new(self)
    }

    fn columns(&self) -> Vec<&str> {
        match &self.kind {
            FieldKind::Composite { columns } | FieldKind::Relation { columns, .. }
                if !columns.is_empty() =>
            {
                columns.iter().map(String::as_str).collect()
            }
            _ => vec![self.native.as_str()],
        }
    }

    /// Compare a tuple of parts column by column
    fn compare_parts(
        &self,
        query: &mut dyn QueryBuilder,
        operator: Operator,
        parts: &Param,
    ) -> Result<(), String> {
        let columns = self.columns();
        let parts = parts.clone().into_list();

        if parts.len() != columns.len() {
            return Err(format!(
                "The field `{}` expects {} parts, got {}",
                self.name,
                columns.len(),
                parts.len()
            ));
        }

        // not-equal on a tuple holds when any part differs
        let boolean = if operator == Operator::NotEq {
            Boolean::Or
        } else {
            Boolean::And
        };
        query.where_group(boolean, &mut |group| {
            for (column, part) in columns.iter().zip(&parts) {
                group.where_clause(column, operator, part)?;
            }
            Ok(())
        })
    }

    /// Membership test against a list of tuples
    fn compare_collection(
        &self,
        query: &mut dyn QueryBuilder,
        operator: Operator,
        value: &Param,
    ) -> Result<(), String> {
        if self.columns().len() == 1 {
            return query.where_clause(&self.native, operator, value);
        }

        let (outer, inner) = if operator == Operator::NotIn {
            (Boolean::And, Operator::NotEq)
        } else {
            (Boolean::Or, Operator::Eq)
        };
        let tuples = value.clone().into_list();
        query.where_group(outer, &mut |group| {
            for tuple in &tuples {
                self.compare_parts(group, inner, tuple)?;
            }
            Ok(())
        })
    }
}

impl Field for FieldDef {
    fn name(&self) -> &str {
        &self.name
    }

    fn native(&self) -> &str {
        &self.native
    }

    fn is_stored(&self) -> bool {
        !matches!(self.kind, FieldKind::Computed)
            && !matches!(self.kind, FieldKind::Relation { many: true, .. })
    }

    fn is_relation(&self) -> bool {
        matches!(self.kind, FieldKind::Relation { .. })
    }

    fn is_many_relation(&self) -> bool {
        matches!(self.kind, FieldKind::Relation { many: true, .. })
    }

    fn is_composite(&self) -> bool {
        self.columns().len() > 1
    }

    fn reversed(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Relation { reversed, .. } => reversed.as_deref(),
            _ => None,
        }
    }

    fn cast(&self, value: Param) -> Result<Param, String> {
        match value {
            Param::List(items) => items
                .into_iter()
                .map(|item| self.cast(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Param::List),
            other => self
                .field_type
                .cast(other)
                .map_err(|e| format!("The field `{}` {e}", self.name)),
        }
    }

    fn where_clause(
        &self,
        query: &mut dyn QueryBuilder,
        operator: Operator,
        value: &Param,
    ) -> Result<(), String> {
        if !self.is_stored() {
            return Err(format!("The field `{}` cannot be queried", self.name));
        }

        if operator.needs_collection() {
            return self.compare_collection(query, operator, value);
        }

        if self.is_composite() {
            if operator.needs_no_value() {
                let columns = self.columns();
                return query.where_group(Boolean::And, &mut |group| {
                    for column in &columns {
                        group.where_clause(column, operator, &Param::Null)?;
                    }
                    Ok(())
                });
            }
            return self.compare_parts(query, operator, value);
        }

        query.where_clause(&self.native, operator, value)
    }

    fn operator_hook(
        &self,
        query: &mut dyn QueryBuilder,
        operator: Operator,
        value: &Param,
    ) -> Option<Result<(), String>> {
        if !self.is_relation() || !operator.needs_collection() {
            return None;
        }

        if self.is_many_relation() {
            return Some(Err(format!(
                "The relation `{}` cannot be compared by key",
                self.name
            )));
        }

        Some(self.compare_collection(query, operator, value))
    }
}

/// Metadata for one model, holding its fields in declaration order.
#[derive(Debug, Clone)]
pub struct ModelMeta {
    name: String,
    per_page: u64,
    fields: Vec<FieldRef>,
}

impl ModelMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            per_page: 15,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub const fn per_page(mut self, per_page: u64) -> Self {
        self.per_page = per_page;
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: impl Field + 'static) -> Self {
        self.fields.push(Arc::new(field));
        self
    }

    #[must_use]
    pub fn into_ref(self) -> super::MetaRef {
        Arc::new(self)
    }
}

impl Meta for ModelMeta {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn field(&self, name: &str) -> Option<FieldRef> {
        self.fields.iter().find(|f| f.name() == name).cloned()
    }

    fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name().to_string()).collect()
    }

    fn default_per_page(&self) -> u64 {
        self.per_page
    }
}
