//! Request values before and after validation.

pub mod normalize;
pub mod operator;
pub mod params;

pub use normalize::normalize;
pub use operator::Operator;
pub use params::{Occurrence, Param, ParameterSet};
