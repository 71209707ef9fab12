use super::support::{check_bool, resolve_field, to_strings};
use crate::config::{AppendConfig, FilterConfig};
use crate::core::{CollectionFilter, Filter, FilterBase, Flow, QueryFilter, RecordFilter};
use crate::errors::FilterError;
use crate::filtering::{Param, ParameterSet};
use crate::targets::{QueryBuilder, Record, RecordCollection};

/// Show or hide a field, eager-loading it when it is a relation.
///
/// `?append=father` or `?append[field]=secret&append[value]=false`. With
/// `count=true` the number of related records is requested as well.
#[derive(Debug, Clone)]
pub struct Append {
    base: FilterBase,
    allowed_values: Vec<String>,
    fields: Option<Vec<String>>,
}

impl Append {
    #[must_use]
    pub fn new(config: &AppendConfig) -> Self {
        Self {
            base: FilterBase::new(),
            allowed_values: config.allowed_values.clone(),
            fields: config.fields.clone(),
        }
    }

    #[must_use]
    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(&config.append)
    }

    /// Restrict the fields that can be appended
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(to_strings(fields));
        self
    }

    fn visibility(params: &ParameterSet) -> Option<(&str, bool)> {
        let field = params.field()?;
        Some((field.name(), params.value().as_bool().unwrap_or(true)))
    }
}

impl Default for Append {
    fn default() -> Self {
        Self::new(&AppendConfig::default())
    }
}

impl Filter for Append {
    crate::filter_identity!("append");

    fn default_params(&self) -> Result<ParameterSet, FilterError> {
        let value = self
            .allowed_values
            .first()
            .cloned()
            .unwrap_or_else(|| "true".to_string());

        Ok(ParameterSet::new()
            .and("field", Param::Null)
            .and("value", value)
            .and("count", "false"))
    }

    fn check_param(
        &self,
        key: &str,
        value: Param,
        params: &mut ParameterSet,
    ) -> Result<Param, FilterError> {
        match key {
            // `?append=father` names the field through `value`
            "field" if value.is_null() => {
                let shorthand = params.value().clone();
                let is_bool = check_bool(self, &shorthand, &self.allowed_values).is_ok();
                if shorthand.is_null() || is_bool {
                    return resolve_field(self, &value, self.fields.as_deref(), None).map(Param::Field);
                }

                let field = resolve_field(self, &shorthand, self.fields.as_deref(), None)?;
                params.insert("value", Param::Bool(true));
                Ok(Param::Field(field))
            }
            "field" => resolve_field(self, &value, self.fields.as_deref(), None).map(Param::Field),
            "value" | "count" => check_bool(self, &value, &self.allowed_values),
            _ => Ok(value),
        }
    }

    fn as_query(&self) -> Option<&dyn QueryFilter> {
        Some(self)
    }

    fn as_collection(&self) -> Option<&dyn CollectionFilter> {
        Some(self)
    }

    fn as_record(&self) -> Option<&dyn RecordFilter> {
        Some(self)
    }
}

impl QueryFilter for Append {
    fn filter_query(
        &self,
        query: &mut dyn QueryBuilder,
        params: &ParameterSet,
    ) -> Result<Flow, FilterError> {
        let Some(field) = params.field() else {
            return Ok(Flow::Continue);
        };

        if field.is_relation() && params.value().as_bool() == Some(true) {
            query.with_relation(field.name());
            if params.get("count").and_then(Param::as_bool) == Some(true) {
                query.with_count(field.name());
            }
        }

        Ok(Flow::Continue)
    }
}

impl CollectionFilter for Append {
    fn filter_collection(
        &self,
        collection: &mut dyn RecordCollection,
        params: &ParameterSet,
    ) -> Result<Flow, FilterError> {
        if let Some((field, visible)) = Self::visibility(params) {
            collection.set_field_visibility(field, visible);
        }
        Ok(Flow::Continue)
    }
}

impl RecordFilter for Append {
    fn filter_record(&self, record: &mut dyn Record, params: &ParameterSet) -> Result<Flow, FilterError> {
        if let Some((field, visible)) = Self::visibility(params) {
            record.set_field_visibility(field, visible);
        }
        Ok(Flow::Continue)
    }
}
