use crate::config::{FilterConfig, PageConfig, PerPageConfig};
use crate::core::{Filter, FilterBase, Flow, QueryFilter};
use crate::errors::FilterError;
use crate::filtering::{Param, ParameterSet};
use crate::targets::QueryBuilder;

/// Requested page number, `?page=3`.
///
/// Has no capability of its own: it is read by
/// [`FilterRegistry::resolve_pagination`](crate::core::FilterRegistry::resolve_pagination).
#[derive(Debug, Clone)]
pub struct Page {
    base: FilterBase,
    default: u64,
}

impl Page {
    #[must_use]
    pub fn new(config: &PageConfig) -> Self {
        Self {
            base: FilterBase::new(),
            default: config.default.max(1),
        }
    }

    #[must_use]
    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(&config.page)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(&PageConfig::default())
    }
}

impl Filter for Page {
    crate::filter_identity!("page");

    fn default_params(&self) -> Result<ParameterSet, FilterError> {
        Ok(ParameterSet::with_value(Param::Int(
            i64::try_from(self.default).unwrap_or(1),
        )))
    }

    fn check_param(
        &self,
        key: &str,
        value: Param,
        _params: &mut ParameterSet,
    ) -> Result<Param, FilterError> {
        if key != "value" {
            return Ok(value);
        }

        match value.as_i64() {
            Some(page) if page >= 1 => Ok(Param::Int(page)),
            _ => Err(FilterError::validation(self.name(), "Must be a positive integer")),
        }
    }
}

/// Page size, bounded by the configured range: `?per_page=50`.
///
/// Defaults to the owning model's page size.
#[derive(Debug, Clone)]
pub struct PerPage {
    base: FilterBase,
    min: u64,
    max: u64,
}

impl PerPage {
    #[must_use]
    pub fn new(config: &PerPageConfig) -> Self {
        Self {
            base: FilterBase::new(),
            min: config.min,
            max: config.max,
        }
    }

    #[must_use]
    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(&config.per_page)
    }
}

impl Default for PerPage {
    fn default() -> Self {
        Self::new(&PerPageConfig::default())
    }
}

impl Filter for PerPage {
    crate::filter_identity!("per_page");

    fn default_params(&self) -> Result<ParameterSet, FilterError> {
        let per_page = self.base.meta(self.name())?.default_per_page();
        Ok(ParameterSet::with_value(Param::Int(
            i64::try_from(per_page).unwrap_or(i64::MAX),
        )))
    }

    fn check_param(
        &self,
        key: &str,
        value: Param,
        _params: &mut ParameterSet,
    ) -> Result<Param, FilterError> {
        if key != "value" {
            return Ok(value);
        }

        let per_page = value
            .as_i64()
            .ok_or_else(|| FilterError::validation(self.name(), "Must be an integer"))?;

        match u64::try_from(per_page) {
            Ok(size) if (self.min..=self.max).contains(&size) => Ok(Param::Int(per_page)),
            _ => Err(FilterError::validation(
                self.name(),
                format!("Min per page `{}` and max `{}`", self.min, self.max),
            )),
        }
    }

    fn as_query(&self) -> Option<&dyn QueryFilter> {
        Some(self)
    }
}

impl QueryFilter for PerPage {
    fn filter_query(
        &self,
        query: &mut dyn QueryBuilder,
        params: &ParameterSet,
    ) -> Result<Flow, FilterError> {
        if let Some(size) = params.value().as_i64().and_then(|s| u64::try_from(s).ok()) {
            query.set_page_size(size);
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FilterErrorKind;
    use crate::core::FilterRegistry;
    use crate::meta::ModelMeta;
    use crate::targets::{Directive, QueryPlan, TargetKind};
    use serde_json::json;

    #[test]
    fn test_page_casts_and_bounds() {
        let page = Page::default();
        let params = page.build_params(ParameterSet::with_value(Param::from("4"))).unwrap();
        assert_eq!(params.value(), &Param::Int(4));

        let params = page.build_params(ParameterSet::new()).unwrap();
        assert_eq!(params.value(), &Param::Int(1));

        assert!(page.build_params(ParameterSet::with_value(Param::from("0"))).is_err());
        assert!(page.build_params(ParameterSet::with_value(Param::from("two"))).is_err());
        assert!(page.capabilities().is_empty());
    }

    #[test]
    fn test_per_page_needs_an_owner() {
        let err = PerPage::default().default_params().unwrap_err();
        assert_eq!(err.kind(), FilterErrorKind::Ownership);
    }

    #[test]
    fn test_per_page_bounds() {
        let mut registry = FilterRegistry::new(ModelMeta::new("user").per_page(25).into_ref());
        registry
            .register(
                "per_page",
                PerPage::new(&PerPageConfig { min: 5, max: 50 }),
            )
            .unwrap();
        let per_page = registry.get_as::<PerPage>("per_page").unwrap();
        assert_eq!(per_page.capabilities(), vec![TargetKind::Query]);

        assert_eq!(
            per_page.build_params(ParameterSet::new()).unwrap().value(),
            &Param::Int(25)
        );

        let err = per_page
            .build_params(ParameterSet::with_value(Param::from("51")))
            .unwrap_err();
        assert_eq!(err.messages(), &["Min per page `5` and max `50`".to_string()]);
        assert!(per_page.build_params(ParameterSet::with_value(Param::Int(-1))).is_err());

        let raw = json!({"per_page": "50"});
        let plan = registry
            .apply_to_query(QueryPlan::new(), raw.as_object().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(plan.directives(), &[Directive::PageSize(50)]);
    }
}
