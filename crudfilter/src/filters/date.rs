use super::support::{
    builder_error, cast_value, check_operator, operator_of, require_value, resolve_field, to_strings,
};
use crate::config::{DateConfig, FilterConfig};
use crate::core::{Filter, FilterBase, Flow, QueryFilter};
use crate::errors::FilterError;
use crate::filtering::{Param, ParameterSet};
use crate::meta::FieldCapability;
use crate::targets::{Boolean, QueryBuilder};

/// Compare a date field: `?date[field]=created_at&date[operator]=>=&date[value]=2024-01-01`.
///
/// A list of values matches any of them.
#[derive(Debug, Clone, Default)]
pub struct Date {
    base: FilterBase,
    operators: Option<Vec<String>>,
    fields: Option<Vec<String>>,
}

impl Date {
    #[must_use]
    pub fn new(config: &DateConfig) -> Self {
        Self {
            base: FilterBase::new(),
            operators: config.operators.clone(),
            fields: config.fields.clone(),
        }
    }

    #[must_use]
    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(&config.date)
    }

    #[must_use]
    pub fn operators<I, S>(mut self, operators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operators = Some(to_strings(operators));
        self
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

impl Filter for Date {
    crate::filter_identity!("date");

    fn default_params(&self) -> Result<ParameterSet, FilterError> {
        let operator = self
            .operators
            .as_ref()
            .and_then(|ops| ops.first())
            .map_or(Param::Null, |op| Param::from(op.as_str()));

        Ok(ParameterSet::new()
            .and("field", Param::Null)
            .and("operator", operator)
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
            "operator" => check_operator(self, &value, self.operators.as_deref(), params),
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

impl QueryFilter for Date {
    fn filter_query(
        &self,
        query: &mut dyn QueryBuilder,
        params: &ParameterSet,
    ) -> Result<Flow, FilterError> {
        let Some(field) = params.field() else {
            return Ok(Flow::Continue);
        };
        let operator = operator_of(params);

        let result = match params.value() {
            Param::List(values) if !operator.needs_collection() => {
                query.where_group(Boolean::Or, &mut |group| {
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
