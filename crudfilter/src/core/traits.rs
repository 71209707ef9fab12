use std::any::Any;
use std::fmt;

use super::FilterBase;
use crate::errors::FilterError;
use crate::filtering::{Occurrence, Param, ParameterSet};
use crate::targets::{QueryBuilder, Record, RecordCollection, RelatedRecord, TargetKind};

/// Result of applying one filter occurrence to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep going with the (possibly modified) target
    Continue,
    /// The target must be excluded entirely; stop the fold
    Exclude,
}

/// Capability: transform a query.
pub trait QueryFilter {
    fn filter_query(
        &self,
        query: &mut dyn QueryBuilder,
        params: &ParameterSet,
    ) -> Result<Flow, FilterError>;
}

/// Capability: transform an in-memory collection.
pub trait CollectionFilter {
    fn filter_collection(
        &self,
        collection: &mut dyn RecordCollection,
        params: &ParameterSet,
    ) -> Result<Flow, FilterError>;
}

/// Capability: transform or reject a single record.
pub trait RecordFilter {
    fn filter_record(&self, record: &mut dyn Record, params: &ParameterSet)
    -> Result<Flow, FilterError>;
}

/// Capability: transform or reject a record reached through a relation.
pub trait RelatedFilter {
    fn filter_related(
        &self,
        record: &mut dyn RelatedRecord,
        params: &ParameterSet,
    ) -> Result<Flow, FilterError>;
}

/// A named, independently validated unit of request-driven selection.
///
/// Implementors declare their default parameters and checkers, and expose the
/// capabilities they support through the `as_*` accessors. The identity
/// accessors are usually generated with [`filter_identity!`](crate::filter_identity).
pub trait Filter: fmt::Debug + Send + Sync {
    fn base(&self) -> &FilterBase;

    fn base_mut(&mut self) -> &mut FilterBase;

    /// Snake-case identity of the filter type, used as its default name
    fn type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    /// Parameters every occurrence is merged over. Key order is checker order.
    fn default_params(&self) -> Result<ParameterSet, FilterError>;

    /// Validate and cast one parameter.
    ///
    /// `params` holds the whole set: keys declared earlier are already
    /// checked, later keys are still raw. Keys without a checker pass through.
    fn check_param(
        &self,
        _key: &str,
        value: Param,
        _params: &mut ParameterSet,
    ) -> Result<Param, FilterError> {
        Ok(value)
    }

    /// Called once when the filter is bound to a registry
    fn owned(&mut self) -> Result<(), FilterError> {
        Ok(())
    }

    fn as_query(&self) -> Option<&dyn QueryFilter> {
        None
    }

    fn as_collection(&self) -> Option<&dyn CollectionFilter> {
        None
    }

    fn as_record(&self) -> Option<&dyn RecordFilter> {
        None
    }

    fn as_related(&self) -> Option<&dyn RelatedFilter> {
        None
    }

    fn name(&self) -> &str {
        self.base().name().unwrap_or_else(|| self.type_name())
    }

    fn supports(&self, kind: TargetKind) -> bool {
        match kind {
            TargetKind::Query => self.as_query().is_some(),
            TargetKind::Collection => self.as_collection().is_some(),
            TargetKind::Record => self.as_record().is_some(),
            TargetKind::RelatedRecord => self.as_related().is_some(),
        }
    }

    fn capabilities(&self) -> Vec<TargetKind> {
        [
            TargetKind::Query,
            TargetKind::Collection,
            TargetKind::Record,
            TargetKind::RelatedRecord,
        ]
        .into_iter()
        .filter(|kind| self.supports(*kind))
        .collect()
    }

    /// Merge defaults, reject malformed shapes and run every checker
    fn build_params(&self, occurrence: Occurrence) -> Result<ParameterSet, FilterError> {
        super::build::build_params(self, occurrence)
    }
}

/// Generate the identity accessors of a [`Filter`] implementation.
///
/// The implementing struct must hold its [`FilterBase`] in a field named `base`.
///
/// ```rust,ignore
/// impl Filter for Active {
///     crudfilter::filter_identity!("active");
///
///     fn default_params(&self) -> Result<ParameterSet, FilterError> {
///         Ok(ParameterSet::with_value(Param::Null))
///     }
/// }
/// ```
#[macro_export]
macro_rules! filter_identity {
    ($type_name:literal) => {
        fn base(&self) -> &$crate::core::FilterBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut $crate::core::FilterBase {
            &mut self.base
        }

        fn type_name(&self) -> &'static str {
            $type_name
        }

        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }
    };
}
