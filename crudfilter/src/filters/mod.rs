//! Built-in filters.
//!
//! | Filter | Targets | Parameters |
//! |---|---|---|
//! | [`Append`] | query, collection, record | `field`, `value`, `count` |
//! | [`Date`] | query | `field`, `operator`, `value` |
//! | [`FieldFilter`] | query | `operator`, `value` |
//! | [`OrderBy`] | query, collection | `field`, `value` |
//! | [`Page`] | pagination only | `value` |
//! | [`PerPage`] | query | `value` |
//! | [`Related`] | query | `operator`, `value` |
//! | [`Search`] | query | `field`, `operator`, `boolean`, `value` |
//! | [`Trash`] | query | `value` |

pub mod append;
pub mod date;
pub mod field;
pub mod order_by;
pub mod page;
pub mod related;
pub mod search;
mod support;
pub mod trash;

pub use append::Append;
pub use date::Date;
pub use field::FieldFilter;
pub use order_by::OrderBy;
pub use page::{Page, PerPage};
pub use related::Related;
pub use search::Search;
pub use trash::Trash;
