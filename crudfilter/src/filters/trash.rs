use super::support::check_allowed;
use crate::config::{FilterConfig, TrashConfig};
use crate::core::{Filter, FilterBase, Flow, QueryFilter};
use crate::errors::FilterError;
use crate::filtering::{Param, ParameterSet};
use crate::targets::{QueryBuilder, TrashMode};

/// Soft-delete visibility: `?trash=with|without|only`.
#[derive(Debug, Clone)]
pub struct Trash {
    base: FilterBase,
    allowed_values: Vec<String>,
}

impl Trash {
    #[must_use]
    pub fn new(config: &TrashConfig) -> Self {
        Self {
            base: FilterBase::new(),
            allowed_values: config.allowed_values.clone(),
        }
    }

    #[must_use]
    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(&config.trash)
    }
}

impl Default for Trash {
    fn default() -> Self {
        Self::new(&TrashConfig::default())
    }
}

impl Filter for Trash {
    crate::filter_identity!("trash");

    fn owned(&mut self) -> Result<(), FilterError> {
        let invalid: Vec<&str> = self
            .allowed_values
            .iter()
            .map(String::as_str)
            .filter(|value| TrashMode::parse(value).is_none())
            .collect();

        if invalid.is_empty() {
            Ok(())
        } else {
            Err(FilterError::configuration(
                self.name(),
                format!("Not trash modes: {}", invalid.join(", ")),
            ))
        }
    }

    fn default_params(&self) -> Result<ParameterSet, FilterError> {
        let value = self
            .allowed_values
            .first()
            .cloned()
            .unwrap_or_else(|| "with".to_string());
        Ok(ParameterSet::with_value(Param::Text(value)))
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

        check_allowed(self, &value, &self.allowed_values).map(Param::Text)
    }

    fn as_query(&self) -> Option<&dyn QueryFilter> {
        Some(self)
    }
}

impl QueryFilter for Trash {
    fn filter_query(
        &self,
        query: &mut dyn QueryBuilder,
        params: &ParameterSet,
    ) -> Result<Flow, FilterError> {
        if let Some(mode) = params.value().as_str().and_then(TrashMode::parse) {
            query.trash_visibility(mode);
        }
        Ok(Flow::Continue)
    }
}
