use serde_json::Value;

use super::params::{Occurrence, Param, ParameterSet};

/// Split the raw value bound to one filter name into occurrences.
///
/// - `?trash=only` (scalar) gives one occurrence `{value: "only"}`
/// - `?order_by[field]=name&order_by[value]=desc` (map) gives one occurrence
/// - `?date[0][field]=a&date[0][value]=x&date[1]...` (list) gives one
///   occurrence per element, in list order; scalar elements become `{value: x}`
#[must_use]
pub fn normalize(raw: &Value) -> Vec<Occurrence> {
    match raw {
        Value::Array(items) => items.iter().map(single).collect(),
        other => vec![single(other)],
    }
}

fn single(raw: &Value) -> Occurrence {
    match Param::from_json(raw) {
        Param::Map(set) => set,
        scalar => ParameterSet::with_value(scalar),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_gives_one_value_occurrence() {
        let occurrences = normalize(&json!("only"));
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].value(), &Param::from("only"));
    }

    #[test]
    fn test_map_gives_itself() {
        let occurrences = normalize(&json!({"field": "created_at", "value": "desc"}));
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].keys(), vec!["field", "value"]);
    }

    #[test]
    fn test_list_of_maps_keeps_order() {
        let occurrences = normalize(&json!([
            {"field": "a", "value": "1"},
            {"field": "b", "value": "2"},
            {"field": "a", "value": "1"}
        ]));
        assert_eq!(occurrences.len(), 3);
        assert_eq!(occurrences[1].get("field"), Some(&Param::from("b")));
        assert_eq!(occurrences[0], occurrences[2]);
    }

    #[test]
    fn test_list_of_scalars() {
        let occurrences = normalize(&json!(["x", "y"]));
        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[1].value(), &Param::from("y"));
    }

    #[test]
    fn test_empty_list_gives_nothing() {
        assert!(normalize(&json!([])).is_empty());
    }
}
