//! sea-orm backed query target.

pub mod query;

pub use query::SeaQuery;
