//! Data-access targets filters are applied to.
//!
//! A filter can transform four kinds of targets:
//!
//! - a lazily executed query ([`QueryBuilder`])
//! - an in-memory result collection ([`RecordCollection`])
//! - a single record ([`Record`])
//! - a record reached through a relation ([`RelatedRecord`])
//!
//! The crate never talks to storage itself, only through these traits.
//! [`QueryPlan`] records query calls, [`SeaQuery`](crate::database::SeaQuery)
//! turns them into sea-query conditions, and [`RecordSet`] / [`JsonRecord`]
//! are JSON-backed collection and record implementations.

pub mod plan;
pub mod records;

use serde_json::Value;
use std::fmt;

use crate::filtering::{Operator, Param};
use crate::pagination::PageRequest;

pub use plan::{Directive, QueryPlan};
pub use records::{JsonRecord, RecordSet};

/// How clauses inside a group are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Boolean {
    And,
    Or,
}

impl Boolean {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            _ => None,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

/// Soft-delete visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrashMode {
    /// Trashed and live records
    With,
    /// Live records only
    Without,
    /// Trashed records only
    Only,
}

impl TrashMode {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "with" => Some(Self::With),
            "without" => Some(Self::Without),
            "only" => Some(Self::Only),
            _ => None,
        }
    }
}

/// Callback building the clauses of a nested group
pub type GroupBuilder<'a> = dyn FnMut(&mut dyn QueryBuilder) -> Result<(), String> + 'a;

/// Query-builder capability.
pub trait QueryBuilder {
    /// Request eager loading of a relation
    fn with_relation(&mut self, relation: &str);

    /// Request the number of related records alongside each result
    fn with_count(&mut self, relation: &str);

    /// Add a comparison, joined to the current group
    fn where_clause(&mut self, column: &str, operator: Operator, value: &Param)
    -> Result<(), String>;

    /// Add a nested group whose clauses are joined with `boolean`
    fn where_group(&mut self, boolean: Boolean, build: &mut GroupBuilder<'_>) -> Result<(), String>;

    fn order_by(&mut self, column: &str, direction: Direction);

    fn random_order(&mut self);

    /// Page size used when the query is paginated
    fn set_page_size(&mut self, size: u64);

    fn trash_visibility(&mut self, mode: TrashMode);

    fn paginate(&mut self, page: &PageRequest);
}

/// In-memory collection capability.
pub trait RecordCollection {
    /// Stable sort on one attribute
    fn sort_by(&mut self, field: &str, direction: Direction);

    fn set_field_visibility(&mut self, field: &str, visible: bool);
}

/// Single record capability.
pub trait Record {
    fn attribute(&self, field: &str) -> Option<&Value>;

    fn set_field_visibility(&mut self, field: &str, visible: bool);
}

/// A record reached through a relation of a parent record.
pub trait RelatedRecord: Record {
    /// Name of the relation the record was reached through
    fn relation(&self) -> &str;
}

/// The kind of object a filter capability transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Query,
    Collection,
    Record,
    RelatedRecord,
}

/// A borrowed target of any kind.
pub enum Target<'a> {
    Query(&'a mut dyn QueryBuilder),
    Collection(&'a mut dyn RecordCollection),
    Record(&'a mut dyn Record),
    Related(&'a mut dyn RelatedRecord),
}

impl Target<'_> {
    #[must_use]
    pub const fn kind(&self) -> TargetKind {
        match self {
            Self::Query(_) => TargetKind::Query,
            Self::Collection(_) => TargetKind::Collection,
            Self::Record(_) => TargetKind::Record,
            Self::Related(_) => TargetKind::RelatedRecord,
        }
    }
}
