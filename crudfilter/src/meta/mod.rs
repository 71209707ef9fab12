//! Field metadata capability.
//!
//! Filters never inspect a model's schema directly. They resolve named
//! [`Field`] handles through a [`Meta`] and call the field's hooks to cast
//! values and to emit comparisons on a query. [`schema`] ships a plain
//! in-memory implementation.

pub mod schema;

use std::fmt;
use std::sync::Arc;

use crate::filtering::{Operator, Param};
use crate::targets::QueryBuilder;

pub use schema::{FieldDef, FieldKind, FieldType, ModelMeta};

/// Shared handle to a field
pub type FieldRef = Arc<dyn Field>;

/// Shared handle to model metadata
pub type MetaRef = Arc<dyn Meta>;

/// Capability a resolved field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCapability {
    /// Backed by a storage column
    Stored,
    /// Points at another model
    Relation,
}

/// A field of a model, as seen by filters.
pub trait Field: fmt::Debug + Send + Sync {
    /// Public name, as used in requests
    fn name(&self) -> &str;

    /// Storage column name
    fn native(&self) -> &str;

    /// Whether the field is backed by storage (as opposed to computed in memory)
    fn is_stored(&self) -> bool;

    fn is_relation(&self) -> bool;

    /// One-to-many or many-to-many relation
    fn is_many_relation(&self) -> bool {
        false
    }

    /// Whether values are made of several parts (`a,b`)
    fn is_composite(&self) -> bool;

    /// Name of the inverse field on the related model
    fn reversed(&self) -> Option<&str> {
        None
    }

    /// Cast a request value into this field's type
    fn cast(&self, value: Param) -> Result<Param, String>;

    /// Generic comparison hook
    fn where_clause(
        &self,
        query: &mut dyn QueryBuilder,
        operator: Operator,
        value: &Param,
    ) -> Result<(), String>;

    /// Operator-specific builder hook; `None` when the field has none for `operator`
    fn operator_hook(
        &self,
        _query: &mut dyn QueryBuilder,
        _operator: Operator,
        _value: &Param,
    ) -> Option<Result<(), String>> {
        None
    }

    /// Split a composite value into its parts.
    ///
    /// With a collection operator each element of the list is split on its own.
    fn decompose(&self, value: Param, operator: Operator) -> Param {
        if !self.is_composite() {
            return value;
        }

        if operator.needs_collection() {
            Param::List(value.into_list().into_iter().map(split_parts).collect())
        } else {
            split_parts(value)
        }
    }
}

/// `"a,b"` into `["a", "b"]`; anything but text is returned as is
#[must_use]
pub fn split_parts(value: Param) -> Param {
    match value {
        Param::Text(text) => Param::List(
            text.split(',')
                .map(|part| Param::Text(part.trim().to_string()))
                .collect(),
        ),
        other => other,
    }
}

/// Metadata of one model.
pub trait Meta: fmt::Debug + Send + Sync {
    fn model_name(&self) -> &str;

    fn field(&self, name: &str) -> Option<FieldRef>;

    fn field_names(&self) -> Vec<String>;

    /// Page size used when the request does not choose one
    fn default_per_page(&self) -> u64 {
        15
    }

    /// Resolve a field, optionally requiring a capability
    fn resolve_field(
        &self,
        name: &str,
        capability: Option<FieldCapability>,
    ) -> Result<FieldRef, String> {
        let field = self
            .field(name)
            .ok_or_else(|| format!("The field `{name}` does not exist on `{}`", self.model_name()))?;

        match capability {
            Some(FieldCapability::Relation) if !field.is_relation() => {
                Err(format!("The field `{name}` is not a relation field"))
            }
            Some(FieldCapability::Stored) if !field.is_stored() => {
                Err(format!("The field `{name}` is not stored"))
            }
            _ => Ok(field),
        }
    }
}
