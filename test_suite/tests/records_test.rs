// Folding filters over in-memory records, plus an application-defined filter
// excluding records.

use crudfilter::targets::{Record, RelatedRecord};
use crudfilter::{
    Append, Filter, FilterBase, FilterConfig, FilterError, FilterErrorKind, FilterRegistry, Flow,
    JsonRecord, OrderBy, Param, ParameterSet, RecordFilter, RecordSet, RelatedFilter, Trash,
};
use serde_json::json;

mod common;
use common::{raw, user_filters, user_meta};

/// Keeps records whose `field` attribute equals `value`, and related records
/// reached through the relation named by `value`
#[derive(Debug, Default)]
struct Matching {
    base: FilterBase,
}

impl Filter for Matching {
    crudfilter::filter_identity!("matching");

    fn default_params(&self) -> Result<ParameterSet, FilterError> {
        Ok(ParameterSet::new().and("field", Param::Null).and("value", Param::Null))
    }

    fn check_param(&self, key: &str, value: Param, _params: &mut ParameterSet) -> Result<Param, FilterError> {
        match key {
            "value" if value.is_null() => Err(FilterError::validation(self.name(), "A value is required")),
            _ => Ok(value),
        }
    }

    fn as_record(&self) -> Option<&dyn RecordFilter> {
        Some(self)
    }

    fn as_related(&self) -> Option<&dyn RelatedFilter> {
        Some(self)
    }
}

impl RecordFilter for Matching {
    fn filter_record(&self, record: &mut dyn Record, params: &ParameterSet) -> Result<Flow, FilterError> {
        let Some(field) = params.get("field").and_then(Param::as_str) else {
            return Ok(Flow::Continue);
        };
        let expected = params.value().to_json();

        Ok(match record.attribute(field) {
            Some(actual) if *actual == expected => Flow::Continue,
            _ => Flow::Exclude,
        })
    }
}

impl RelatedFilter for Matching {
    fn filter_related(&self, record: &mut dyn RelatedRecord, params: &ParameterSet) -> Result<Flow, FilterError> {
        if params.value().as_str() == Some(record.relation()) {
            Ok(Flow::Continue)
        } else {
            Ok(Flow::Exclude)
        }
    }
}

fn users() -> RecordSet {
    [
        json!({"id": 1, "name": "Alice", "email": "alice@example.com", "full_name": "Alice Martin"}),
        json!({"id": 2, "name": "Bob", "email": "bob@example.com", "full_name": "Bob Durand"}),
        json!({"id": 3, "name": "Charlie", "email": "charlie@example.com", "full_name": "Charlie Petit"}),
    ]
    .into_iter()
    .map(|user| JsonRecord::from_value(user).hidden(["full_name"]))
    .collect()
}

fn registry() -> FilterRegistry {
    let mut filters = user_filters(&FilterConfig::default());
    filters.register("matching", Matching::default()).unwrap();
    filters
}

#[test]
fn test_collection_sorted_on_computed_field() {
    let users = registry()
        .apply_to_collection(
            users(),
            &raw(json!({"order_by": {"field": "full_name", "value": "desc"}})),
        )
        .unwrap()
        .unwrap();

    assert_eq!(users.pluck("name"), vec![json!("Charlie"), json!("Bob"), json!("Alice")]);
}

#[test]
fn test_collection_field_visibility() {
    let users = registry()
        .apply_to_collection(
            users(),
            &raw(json!({"append": [{"field": "full_name"}, {"field": "email", "value": "false"}]})),
        )
        .unwrap()
        .unwrap();

    let body = serde_json::to_value(&users).unwrap();
    assert_eq!(
        body[0],
        json!({"id": 1, "name": "Alice", "full_name": "Alice Martin"})
    );
}

#[test]
fn test_query_only_filters_are_skipped_on_records() {
    let filters = registry();
    let record = JsonRecord::from_value(json!({"id": 2, "name": "Bob"}));

    let record = filters
        .apply_to_record(record, &raw(json!({"trash": "only", "per_page": "5", "name": "Bob"})))
        .unwrap();
    assert!(record.is_some());
}

#[test]
fn test_record_excluded_by_custom_filter() {
    let filters = registry();
    let bob = || JsonRecord::from_value(json!({"id": 2, "name": "Bob"}));

    let kept = filters
        .apply_to_record(bob(), &raw(json!({"matching": {"field": "name", "value": "Bob"}})))
        .unwrap();
    assert!(kept.is_some());

    let excluded = filters
        .apply_to_record(
            bob(),
            &raw(json!({"matching": {"field": "name", "value": "Alice"}, "bogus": "1"})),
        )
        .unwrap();
    assert!(excluded.is_none(), "exclusion stops the fold before `bogus`");

    let err = filters
        .apply_to_record(bob(), &raw(json!({"matching": {"field": "name"}})))
        .unwrap_err();
    assert_eq!(err.filter(), "matching");
}

#[test]
fn test_related_record_excluded_by_relation() {
    let filters = registry();
    let child = || JsonRecord::from_value(json!({"id": 2, "name": "Bob"})).through("children");

    assert!(
        filters
            .apply_to_related(child(), &raw(json!({"matching": "children"})))
            .unwrap()
            .is_some()
    );
    assert!(
        filters
            .apply_to_related(child(), &raw(json!({"matching": "father"})))
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_interceptor_replaces_and_vetoes() {
    let mut filters = FilterRegistry::new(user_meta()).intercept(|name, filter| match name {
        "trash" => None,
        "order_by" => Some(Box::new(OrderBy::default().fields(["name"])) as Box<dyn Filter>),
        _ => Some(filter),
    });
    filters
        .register("trash", Trash::default())
        .unwrap()
        .register("order_by", OrderBy::default())
        .unwrap()
        .register("append", Append::default())
        .unwrap();

    assert_eq!(filters.names(), vec!["order_by".to_string(), "append".to_string()]);
    assert_eq!(
        filters
            .apply_to_collection(users(), &raw(json!({"trash": "only"})))
            .unwrap_err()
            .kind(),
        FilterErrorKind::NotFound
    );

    let err = filters
        .apply_to_collection(users(), &raw(json!({"order_by": "full_name"})))
        .unwrap_err();
    assert_eq!(err.messages(), &["The field `full_name` is not allowed".to_string()]);
}

#[test]
fn test_typed_access() {
    let filters = registry();
    assert!(filters.get_as::<Matching>("matching").is_some());
    assert!(filters.get_as::<Trash>("matching").is_none());
    assert_eq!(
        filters.get("matching").unwrap().map(|filter| filter.name()),
        Some("matching")
    );
    assert!(matches!(filters.get("unknown"), Err(e) if e.kind() == FilterErrorKind::NotFound));
}
