//! Filter abstraction, lifecycle and registry.
//!
//! A filter starts **unbound**: it has no name and no metadata. Registering it
//! on a [`FilterRegistry`] names it and binds it to the registry's [`Meta`],
//! after which it is **owned** for the rest of its life.
//!
//! [`Meta`]: crate::meta::Meta

pub mod build;
pub mod registry;
pub mod traits;

use crate::errors::FilterError;
use crate::meta::MetaRef;

pub use build::build_params;
pub use registry::{FilterRegistry, Interceptor, RawQuery};
pub use traits::{CollectionFilter, Filter, Flow, QueryFilter, RecordFilter, RelatedFilter};

#[derive(Debug, Clone, Default)]
enum Ownership {
    #[default]
    Unbound,
    Owned(MetaRef),
}

/// Name and ownership state shared by every filter.
#[derive(Debug, Clone, Default)]
pub struct FilterBase {
    name: Option<String>,
    ownership: Ownership,
}

impl FilterBase {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            name: None,
            ownership: Ownership::Unbound,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set the name; a name can only be set once
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), FilterError> {
        let name = name.into();
        if let Some(current) = &self.name {
            return Err(FilterError::configuration(
                current,
                format!("The filter is already named `{current}` and cannot be renamed `{name}`"),
            ));
        }

        self.name = Some(name);
        Ok(())
    }

    #[must_use]
    pub const fn is_owned(&self) -> bool {
        matches!(self.ownership, Ownership::Owned(_))
    }

    /// Bind to `meta`; a filter can only be owned once
    pub fn own(&mut self, filter: &str, meta: MetaRef) -> Result<(), FilterError> {
        if let Ownership::Owned(current) = &self.ownership {
            return Err(FilterError::ownership(
                filter,
                format!("The filter is already owned by `{}`", current.model_name()),
            ));
        }

        self.ownership = Ownership::Owned(meta);
        Ok(())
    }

    /// Owner metadata; fails while unbound
    pub fn meta(&self, filter: &str) -> Result<&MetaRef, FilterError> {
        match &self.ownership {
            Ownership::Owned(meta) => Ok(meta),
            Ownership::Unbound => Err(FilterError::ownership(
                filter,
                "The filter needs to be owned before being used",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FilterErrorKind;
    use crate::meta::ModelMeta;

    #[test]
    fn test_name_is_set_once() {
        let mut base = FilterBase::new();
        base.set_name("order_by").unwrap();
        assert_eq!(base.name(), Some("order_by"));

        let err = base.set_name("sort").unwrap_err();
        assert_eq!(err.kind(), FilterErrorKind::Configuration);
        assert_eq!(base.name(), Some("order_by"));
    }

    #[test]
    fn test_ownership_lifecycle() {
        let mut base = FilterBase::new();
        assert!(!base.is_owned());
        assert_eq!(
            base.meta("x").unwrap_err().kind(),
            FilterErrorKind::Ownership
        );

        base.own("x", ModelMeta::new("user").into_ref()).unwrap();
        assert!(base.is_owned());
        assert_eq!(base.meta("x").unwrap().model_name(), "user");

        let err = base.own("x", ModelMeta::new("post").into_ref()).unwrap_err();
        assert_eq!(err.kind(), FilterErrorKind::Ownership);
        assert_eq!(base.meta("x").unwrap().model_name(), "user");
    }
}
