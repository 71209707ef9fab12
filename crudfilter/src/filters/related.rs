use super::support::{
    builder_error, cast_value, check_operator, operator_of, require_value, to_strings,
};
use crate::config::{FilterConfig, OperatorConfig};
use crate::core::{Filter, FilterBase, Flow, QueryFilter};
use crate::errors::FilterError;
use crate::filtering::{Param, ParameterSet};
use crate::meta::{FieldCapability, FieldRef};
use crate::targets::QueryBuilder;

/// Constrain a relation by the key(s) of the related records.
///
/// Registered under the relation's name: `?father=12`,
/// `?father[operator]=in&father[value][]=1&father[value][]=2`. Composite keys
/// are written `a,b`.
#[derive(Debug, Clone, Default)]
pub struct Related {
    base: FilterBase,
    operators: Option<Vec<String>>,
    field: Option<FieldRef>,
}

impl Related {
    #[must_use]
    pub fn new(config: &OperatorConfig) -> Self {
        Self {
            base: FilterBase::new(),
            operators: config.operators.clone(),
            field: None,
        }
    }

    #[must_use]
    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(&config.related)
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

    /// The bound relation field; available once owned
    pub fn field(&self) -> Result<&FieldRef, FilterError> {
        self.field.as_ref().ok_or_else(|| {
            FilterError::ownership(self.name(), "The filter needs to be owned before being used")
        })
    }
}

impl Filter for Related {
    crate::filter_identity!("related");

    fn owned(&mut self) -> Result<(), FilterError> {
        let field = self
            .base
            .meta(self.name())?
            .resolve_field(self.name(), Some(FieldCapability::Relation))
            .map_err(|message| FilterError::ownership(self.name(), message))?;
        self.field = Some(field);
        Ok(())
    }

    fn default_params(&self) -> Result<ParameterSet, FilterError> {
        let operator = self
            .operators
            .as_ref()
            .and_then(|ops| ops.first())
            .map_or(Param::Null, |op| Param::from(op.as_str()));

        Ok(ParameterSet::new()
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
            "operator" => check_operator(self, &value, self.operators.as_deref(), params),
            "value" => {
                let operator = operator_of(params);
                require_value(self, &value, operator)?;
                let field = self.field()?;
                cast_value(self, field, field.decompose(value, operator))
            }
            _ => Ok(value),
        }
    }

    fn as_query(&self) -> Option<&dyn QueryFilter> {
        Some(self)
    }
}

impl QueryFilter for Related {
    fn filter_query(
        &self,
        query: &mut dyn QueryBuilder,
        params: &ParameterSet,
    ) -> Result<Flow, FilterError> {
        let field = self.field()?;
        let operator = operator_of(params);
        let value = params.value();

        field
            .operator_hook(query, operator, value)
            .unwrap_or_else(|| field.where_clause(query, operator, value))
            .map_err(builder_error(self))?;

        Ok(Flow::Continue)
    }
}
