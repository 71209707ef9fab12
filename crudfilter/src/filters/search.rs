use super::support::{
    builder_error, cast_value, check_allowed, check_operator, operator_of, require_value,
    resolve_field, to_strings,
};
use crate::config::{FilterConfig, SearchConfig};
use crate::core::{Filter, FilterBase, Flow, QueryFilter};
use crate::errors::FilterError;
use crate::filtering::{Param, ParameterSet};
use crate::meta::FieldCapability;
use crate::targets::{Boolean, QueryBuilder};

/// Text search on one stored field.
///
/// `?search[field]=name&search[operator]=like&search[value]=%bob%`. A list of
/// values is searched in one group, joined with `boolean` (`or` by default).
#[derive(Debug, Clone)]
pub struct Search {
    base: FilterBase,
    allowed_values: Vec<String>,
    operators: Vec<String>,
    fields: Option<Vec<String>>,
}

impl Search {
    #[must_use]
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            base: FilterBase::new(),
            allowed_values: config.allowed_values.clone(),
            operators: config.only.clone(),
            fields: config.fields.clone(),
        }
    }

    #[must_use]
    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(&config.search)
    }

    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(to_strings(fields));
        self
    }
}

impl Default for Search {
    fn default() -> Self {
        Self::new(&SearchConfig::default())
    }
}

impl Filter for Search {
    crate::filter_identity!("search");

    fn default_params(&self) -> Result<ParameterSet, FilterError> {
        let operator = self
            .operators
            .first()
            .map_or(Param::Null, |op| Param::from(op.as_str()));
        let boolean = self
            .allowed_values
            .first()
            .cloned()
            .unwrap_or_else(|| "and".to_string());

        Ok(ParameterSet::new()
            .and("field", Param::Null)
            .and("operator", operator)
            .and("boolean", boolean)
            .and("value", Param::Null))
    }

    fn check_param(
        &self,
        key: &str,
        value: Param,
        params: &mut ParameterSet,
    ) -> Result<Param, FilterError> {
        match key {
            "field" => resolve_field(
                self,
                &value,
                self.fields.as_deref(),
                Some(FieldCapability::Stored),
            )
            .map(Param::Field),
            "operator" => check_operator(self, &value, Some(self.operators.as_slice()), params),
            "boolean" => check_allowed(self, &value, &self.allowed_values).map(Param::Text),
            "value" => {
                require_value(self, &value, operator_of(params))?;
                let field = params
                    .field()
                    .cloned()
                    .ok_or_else(|| FilterError::validation(self.name(), "Field required"))?;
                cast_value(self, &field, value)
            }
            _ => Ok(value),
        }
    }

    fn as_query(&self) -> Option<&dyn QueryFilter> {
        Some(self)
    }
}

impl QueryFilter for Search {
    fn filter_query(
        &self,
        query: &mut dyn QueryBuilder,
        params: &ParameterSet,
    ) -> Result<Flow, FilterError> {
        let Some(field) = params.field() else {
            return Ok(Flow::Continue);
        };
        let operator = operator_of(params);
        let boolean = params
            .get("boolean")
            .and_then(Param::as_str)
            .and_then(Boolean::parse)
            .unwrap_or(Boolean::Or);

        let result = match params.value() {
            Param::List(values) if !operator.needs_collection() => {
                query.where_group(boolean, &mut |group| {
                    values
                        .iter()
                        .try_for_each(|value| field.where_clause(group, operator, value))
                })
            }
            value => field.where_clause(query, operator, value),
        };
        result.map_err(builder_error(self))?;

        Ok(Flow::Continue)
    }
}
