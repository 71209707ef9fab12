//! Declarative, validated request filters.
//!
//! A [`FilterRegistry`] maps request parameter names to [`Filter`]s bound to a
//! model's [`meta::Meta`]. Raw parameters are normalized, merged with each
//! filter's defaults, checked key by key and then applied, in request order, to
//! a query ([`SeaQuery`], [`QueryPlan`]), an in-memory [`RecordSet`] or a
//! single record.
//!
//! ```rust,ignore
//! let mut filters = FilterRegistry::new(meta);
//! filters
//!     .register("order_by", OrderBy::default())?
//!     .register("per_page", PerPage::default())?
//!     .register("trash", Trash::default())?;
//!
//! let raw = parse_query("order_by[field]=name&order_by[value]=desc&per_page=5")?;
//! let query = filters.paginate_query(SeaQuery::new(), &raw)?;
//! ```

pub mod config;
pub mod core;
pub mod database;
pub mod errors;
pub mod filtering;
pub mod filters;
pub mod meta;
pub mod pagination;
pub mod request;
pub mod targets;

pub use crate::core::{
    CollectionFilter, Filter, FilterBase, FilterRegistry, Flow, QueryFilter, RawQuery,
    RecordFilter, RelatedFilter,
};
pub use config::FilterConfig;
pub use database::SeaQuery;
pub use errors::{FilterError, FilterErrorKind, FilterErrors};
pub use filtering::{Operator, Param, ParameterSet};
pub use filters::{Append, Date, FieldFilter, OrderBy, Page, PerPage, Related, Search, Trash};
pub use meta::{FieldDef, FieldType, Meta, ModelMeta};
pub use pagination::{PageRequest, Pagination};
pub use request::{FilterQuery, merge_body_filters, parse_query, scope_related};
pub use targets::{JsonRecord, QueryPlan, RecordSet};
