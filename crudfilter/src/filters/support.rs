//! Checkers shared by several filters.

use crate::core::Filter;
use crate::errors::FilterError;
use crate::filtering::{Operator, Param, ParameterSet};
use crate::meta::{FieldCapability, FieldRef};

/// Owned list of strings from a config slice
pub(crate) fn to_strings<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

/// `value` as lowercase text, if it is one of `allowed`
pub(crate) fn check_allowed(
    filter: &dyn Filter,
    value: &Param,
    allowed: &[String],
) -> Result<String, FilterError> {
    value
        .as_text()
        .map(|text| text.trim().to_lowercase())
        .filter(|text| allowed.iter().any(|a| a.eq_ignore_ascii_case(text)))
        .ok_or_else(|| {
            FilterError::validation(
                filter.name(),
                format!("Expected one of: {}", allowed.join(", ")),
            )
        })
}

/// `true`/`false` spelled as one of `allowed`
pub(crate) fn check_bool(
    filter: &dyn Filter,
    value: &Param,
    allowed: &[String],
) -> Result<Param, FilterError> {
    if let Param::Bool(b) = value {
        return Ok(Param::Bool(*b));
    }

    check_allowed(filter, value, allowed).map(|text| Param::Bool(text == "true"))
}

/// Resolve a field name against the owner's metadata.
///
/// Already-resolved handles are kept, so a set can be built twice.
pub(crate) fn resolve_field(
    filter: &dyn Filter,
    value: &Param,
    allowed: Option<&[String]>,
    capability: Option<FieldCapability>,
) -> Result<FieldRef, FilterError> {
    let name = match value {
        Param::Field(field) => field.name().to_string(),
        Param::Null => return Err(FilterError::validation(filter.name(), "Field required")),
        other => other
            .as_text()
            .ok_or_else(|| FilterError::validation(filter.name(), "The field must be a name"))?,
    };

    if let Some(allowed) = allowed {
        if !allowed.iter().any(|a| *a == name) {
            return Err(FilterError::validation(
                filter.name(),
                format!("The field `{name}` is not allowed"),
            ));
        }
    }

    if let Param::Field(field) = value {
        return Ok(field.clone());
    }

    filter
        .base()
        .meta(filter.name())?
        .resolve_field(&name, capability)
        .map_err(|message| FilterError::validation(filter.name(), message))
}

/// Resolve `operator`, defaulting to `=`, and wrap `value` into a list
/// when the operator compares against several values
pub(crate) fn check_operator(
    filter: &dyn Filter,
    value: &Param,
    allowed: Option<&[String]>,
    params: &mut ParameterSet,
) -> Result<Param, FilterError> {
    let operator = match value {
        Param::Operator(op) => *op,
        Param::Null => Operator::Eq,
        other => {
            let key = other.as_text().unwrap_or_default();
            Operator::find(&key).ok_or_else(|| {
                FilterError::validation(filter.name(), format!("Wrong operator `{key}`"))
            })?
        }
    };

    if let Some(allowed) = allowed {
        if !allowed.iter().any(|a| operator.matches(a)) {
            return Err(FilterError::validation(
                filter.name(),
                format!("Wrong operator `{}`", operator.name()),
            ));
        }
    }

    if operator.needs_collection() {
        if let Some(value) = params.take("value") {
            params.insert("value", Param::List(value.into_list()));
        }
    }

    Ok(Param::Operator(operator))
}

/// Operator resolved by an earlier checker, or `=`
pub(crate) fn operator_of(params: &ParameterSet) -> Operator {
    params.operator().unwrap_or(Operator::Eq)
}

/// Reject a missing value unless the operator takes none
pub(crate) fn require_value(
    filter: &dyn Filter,
    value: &Param,
    operator: Operator,
) -> Result<(), FilterError> {
    if value.is_null() && !operator.needs_no_value() {
        return Err(FilterError::validation(filter.name(), "A value is required"));
    }
    Ok(())
}

/// Cast through the field, reporting failures against the filter
pub(crate) fn cast_value(
    filter: &dyn Filter,
    field: &FieldRef,
    value: Param,
) -> Result<Param, FilterError> {
    field
        .cast(value)
        .map_err(|message| FilterError::validation(filter.name(), message))
}

/// Attach the filter name to a builder hook failure
pub(crate) fn builder_error(filter: &dyn Filter) -> impl Fn(String) -> FilterError + '_ {
    move |message| FilterError::validation(filter.name(), message)
}
