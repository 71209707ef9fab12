use super::support::{check_allowed, resolve_field, to_strings};
use crate::config::{FilterConfig, OrderByConfig};
use crate::core::{CollectionFilter, Filter, FilterBase, Flow, QueryFilter};
use crate::errors::FilterError;
use crate::filtering::{Param, ParameterSet};
use crate::meta::FieldRef;
use crate::targets::{Direction, QueryBuilder, RecordCollection};

const RANDOM: &str = "random";

/// Sort results.
///
/// `?order_by=random`, `?order_by[field]=created_at&order_by[value]=desc`, or
/// parallel lists for several keys:
/// `?order_by[field][]=last_name&order_by[field][]=first_name&order_by[value][]=asc&order_by[value][]=desc`.
///
/// Stored fields are ordered by the query; computed fields are sorted in memory.
#[derive(Debug, Clone)]
pub struct OrderBy {
    base: FilterBase,
    allowed_values: Vec<String>,
    fields: Option<Vec<String>>,
}

impl OrderBy {
    #[must_use]
    pub fn new(config: &OrderByConfig) -> Self {
        Self {
            base: FilterBase::new(),
            allowed_values: config.allowed_values.clone(),
            fields: config.fields.clone(),
        }
    }

    #[must_use]
    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(&config.order_by)
    }

    /// Restrict the fields that can be ordered on
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(to_strings(fields));
        self
    }

    fn is_random(value: &Param) -> bool {
        value
            .as_text()
            .is_some_and(|text| text.trim().eq_ignore_ascii_case(RANDOM))
    }

    fn check_field(&self, value: &Param, params: &ParameterSet) -> Result<Param, FilterError> {
        match value {
            Param::Null if Self::is_random(params.value()) => Ok(Param::Null),
            Param::List(names) => names
                .iter()
                .map(|name| resolve_field(self, name, self.fields.as_deref(), None).map(Param::Field))
                .collect::<Result<Vec<_>, _>>()
                .map(Param::List),
            single => resolve_field(self, single, self.fields.as_deref(), None).map(Param::Field),
        }
    }

    fn check_direction(&self, value: &Param) -> Result<String, FilterError> {
        check_allowed(self, value, &self.allowed_values)
    }

    fn check_value(&self, value: &Param, params: &ParameterSet) -> Result<Param, FilterError> {
        let field = params.get("field").unwrap_or(&Param::Null);

        let Param::List(values) = value else {
            let direction = self.check_direction(value)?;
            if direction == RANDOM && !field.is_null() {
                return Err(FilterError::validation(
                    self.name(),
                    "Cannot be random and have a field",
                ));
            }
            return Ok(Param::Text(direction));
        };

        let Some(fields) = field.as_list() else {
            return Err(FilterError::validation(
                self.name(),
                "A list of directions needs a list of fields",
            ));
        };

        if fields.len() != values.len() {
            return Err(FilterError::validation(
                self.name(),
                format!(
                    "Got {} fields for {} directions",
                    fields.len(),
                    values.len()
                ),
            ));
        }

        values
            .iter()
            .map(|value| match self.check_direction(value)? {
                direction if direction == RANDOM => Err(FilterError::validation(
                    self.name(),
                    "Cannot be random and have a field",
                )),
                direction => Ok(Param::Text(direction)),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Param::List)
    }

    /// Each ordered field with its direction, in request order
    fn keys(params: &ParameterSet) -> Vec<(&FieldRef, Direction)> {
        let fields = match params.get("field") {
            Some(Param::List(fields)) => fields.iter().filter_map(Param::as_field).collect(),
            Some(Param::Field(field)) => vec![field],
            _ => Vec::new(),
        };

        let direction_at = |index: usize| {
            let value = match params.value() {
                Param::List(values) => values.get(index),
                value => Some(value),
            };
            value
                .and_then(Param::as_str)
                .and_then(Direction::parse)
                .unwrap_or(Direction::Asc)
        };

        fields
            .into_iter()
            .enumerate()
            .map(|(index, field)| (field, direction_at(index)))
            .collect()
    }
}

impl Default for OrderBy {
    fn default() -> Self {
        Self::new(&OrderByConfig::default())
    }
}

impl Filter for OrderBy {
    crate::filter_identity!("order_by");

    fn default_params(&self) -> Result<ParameterSet, FilterError> {
        let value = self
            .allowed_values
            .first()
            .cloned()
            .unwrap_or_else(|| "asc".to_string());

        Ok(ParameterSet::new()
            .and("field", Param::Null)
            .and("value", value))
    }

    fn check_param(
        &self,
        key: &str,
        value: Param,
        params: &mut ParameterSet,
    ) -> Result<Param, FilterError> {
        match key {
            // `?order_by=name` names the field through `value`
            "field" if value.is_null() && self.check_direction(params.value()).is_err() => {
                let field = self.check_field(params.value(), params)?;
                params.insert("value", Param::Null);
                Ok(field)
            }
            "field" => self.check_field(&value, params),
            "value" if value.is_null() => {
                let default = self.default_params()?.value().clone();
                self.check_value(&default, params)
            }
            "value" => self.check_value(&value, params),
            _ => Ok(value),
        }
    }

    fn as_query(&self) -> Option<&dyn QueryFilter> {
        Some(self)
    }

    fn as_collection(&self) -> Option<&dyn CollectionFilter> {
        Some(self)
    }
}

impl QueryFilter for OrderBy {
    fn filter_query(
        &self,
        query: &mut dyn QueryBuilder,
        params: &ParameterSet,
    ) -> Result<Flow, FilterError> {
        if Self::is_random(params.value()) {
            query.random_order();
            return Ok(Flow::Continue);
        }

        for (field, direction) in Self::keys(params) {
            if field.is_stored() {
                query.order_by(field.native(), direction);
            }
        }

        Ok(Flow::Continue)
    }
}

impl CollectionFilter for OrderBy {
    fn filter_collection(
        &self,
        collection: &mut dyn RecordCollection,
        params: &ParameterSet,
    ) -> Result<Flow, FilterError> {
        // Stable sorts: sorting by the last key first keeps the first key primary
        for (field, direction) in Self::keys(params).into_iter().rev() {
            if !field.is_stored() {
                collection.sort_by(field.name(), direction);
            }
        }

        Ok(Flow::Continue)
    }
}
