use super::Filter;
use crate::errors::FilterError;
use crate::filtering::{Occurrence, Param, ParameterSet};

/// Build the validated parameter set of one occurrence.
///
/// The occurrence is merged over the filter's defaults and must carry a
/// `value`. Keys the defaults do not declare are rejected. Each key is then
/// run through its checker in default order; the first failing checker aborts
/// the build.
pub fn build_params<F>(filter: &F, occurrence: Occurrence) -> Result<ParameterSet, FilterError>
where
    F: Filter + ?Sized,
{
    let defaults = filter.default_params()?;
    let allowed = defaults.keys();
    let mut params = defaults.merged_with(occurrence);

    if !params.has("value") {
        return Err(FilterError::validation(
            filter.name(),
            "Missing value for filter",
        ));
    }

    let extra = params
        .keys()
        .into_iter()
        .filter(|key| key != "value" && !allowed.contains(key))
        .collect::<Vec<_>>();
    if !extra.is_empty() {
        return Err(FilterError::validation(
            filter.name(),
            format!(
                "Some parameters are not allowed for this filter: {}",
                extra.join(", ")
            ),
        ));
    }

    for key in params.keys() {
        let raw = params.take(&key).unwrap_or(Param::Null);
        let checked = filter.check_param(&key, raw, &mut params)?;
        params.insert(&key, checked);
    }

    tracing::trace!(filter = %filter.name(), keys = ?params.keys(), "Built filter parameters");

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FilterBase;
    use crate::errors::FilterErrorKind;

    /// Doubles `value`; `scale` is read by the value checker
    #[derive(Debug, Default)]
    struct Scaled {
        base: FilterBase,
    }

    impl Filter for Scaled {
        crate::filter_identity!("scaled");

        fn default_params(&self) -> Result<ParameterSet, FilterError> {
            Ok(ParameterSet::new()
                .and("scale", 2_i64)
                .and("value", Param::Null))
        }

        fn check_param(
            &self,
            key: &str,
            value: Param,
            params: &mut ParameterSet,
        ) -> Result<Param, FilterError> {
            match key {
                "scale" => value
                    .as_i64()
                    .map(Param::Int)
                    .ok_or_else(|| FilterError::validation(self.name(), "bad scale")),
                "value" => {
                    let scale = params.get("scale").and_then(Param::as_i64).unwrap_or(1);
                    let value = value
                        .as_i64()
                        .ok_or_else(|| FilterError::validation(self.name(), "bad value"))?;
                    Ok(Param::Int(value * scale))
                }
                _ => Ok(value),
            }
        }
    }

    #[test]
    fn test_checkers_see_processed_siblings() {
        let params = Scaled::default()
            .build_params(ParameterSet::new().and("value", "4").and("scale", "3"))
            .unwrap();
        assert_eq!(params.value(), &Param::Int(12));
        assert_eq!(params.keys(), vec!["scale", "value"]);
    }

    #[test]
    fn test_extra_keys_are_rejected() {
        let err = Scaled::default()
            .build_params(
                ParameterSet::new()
                    .and("value", "1")
                    .and("colour", "red")
                    .and("size", "xl"),
            )
            .unwrap_err();
        assert_eq!(err.kind(), FilterErrorKind::Validation);
        assert_eq!(err.filter(), "scaled");
        assert!(err.messages()[0].ends_with("colour, size"));
    }

    #[test]
    fn test_checker_failure_aborts() {
        let err = Scaled::default()
            .build_params(ParameterSet::with_value(Param::from("abc")))
            .unwrap_err();
        assert_eq!(err.messages(), &["bad value".to_string()]);
    }

    #[derive(Debug, Default)]
    struct NoValue {
        base: FilterBase,
    }

    impl Filter for NoValue {
        crate::filter_identity!("no_value");

        fn default_params(&self) -> Result<ParameterSet, FilterError> {
            Ok(ParameterSet::new().and("field", Param::Null))
        }
    }

    #[test]
    fn test_missing_value_fails() {
        let err = NoValue::default()
            .build_params(ParameterSet::new().and("field", "x"))
            .unwrap_err();
        assert_eq!(err.messages(), &["Missing value for filter".to_string()]);
    }
}
