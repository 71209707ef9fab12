//! Turning HTTP requests into raw filter parameters.
//!
//! Query strings use bracket nesting:
//!
//! ```text
//! ?trash=only                                   {"trash": "only"}
//! ?order_by[field]=name&order_by[value]=desc    {"order_by": {"field": "name", "value": "desc"}}
//! ?date[0][field]=a&date[1][field]=b            {"date": [{"field": "a"}, {"field": "b"}]}
//! ?id[]=1&id[]=2                                {"id": ["1", "2"]}
//! ```
//!
//! A JSON body may carry more filters under the reserved `_filters` key, see
//! [`merge_body_filters`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde_json::{Map, Value};

use crate::core::RawQuery;
use crate::errors::FilterError;
use crate::filtering::{Operator, Param};
use crate::meta::{FieldCapability, Meta};
use crate::targets::QueryBuilder;

/// Body key holding filters sent alongside a JSON payload
pub const BODY_FILTERS_KEY: &str = "_filters";

/// Parse a query string into raw filter parameters, keeping encounter order.
///
/// A later value for the same key replaces the earlier one; `[]` appends.
pub fn parse_query(query: &str) -> Result<RawQuery, FilterError> {
    let mut raw = RawQuery::new();

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let (name, path) = split_key(&key)?;
        if name.is_empty() {
            continue;
        }

        let node = raw.entry(name.to_string()).or_insert(Value::Null);
        insert(node, &path, Value::String(value.into_owned()));
    }

    // Filter names are never folded into a list, even when numeric
    Ok(raw.into_iter().map(|(name, value)| (name, into_lists(value))).collect())
}

/// `a[b][]` into `("a", ["b", ""])`
fn split_key(key: &str) -> Result<(&str, Vec<&str>), FilterError> {
    let Some(open) = key.find('[') else {
        return if key.contains(']') {
            Err(malformed(key))
        } else {
            Ok((key, Vec::new()))
        };
    };

    let (name, mut rest) = key.split_at(open);
    let mut segments = Vec::new();

    while !rest.is_empty() {
        let Some(inner) = rest.strip_prefix('[') else {
            return Err(malformed(key));
        };
        let Some(close) = inner.find(']') else {
            return Err(malformed(key));
        };
        let segment = &inner[..close];
        if segment.contains('[') {
            return Err(malformed(key));
        }
        segments.push(segment);
        rest = &inner[close + 1..];
    }

    Ok((name, segments))
}

fn malformed(key: &str) -> FilterError {
    let name = key.split('[').next().unwrap_or(key);
    FilterError::validation(name, format!("Malformed parameter `{key}`"))
}

fn insert(node: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    let key = if head.is_empty() {
        map.keys()
            .filter_map(|k| k.parse::<usize>().ok())
            .max()
            .map_or(0, |last| last + 1)
            .to_string()
    } else {
        (*head).to_string()
    };
    let child = map.entry(key).or_insert(Value::Null);
    insert(child, rest, value);
}

/// Objects keyed `0..n` become lists, recursively
fn into_lists(value: Value) -> Value {
    let Value::Object(map) = value else {
        return value;
    };

    let map: Map<String, Value> = map.into_iter().map(|(k, v)| (k, into_lists(v))).collect();

    let mut indexed = map
        .iter()
        .map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, v.clone())))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default();
    indexed.sort_by_key(|(i, _)| *i);

    let contiguous = !indexed.is_empty() && indexed.iter().enumerate().all(|(n, (i, _))| n == *i);
    if contiguous {
        Value::Array(indexed.into_iter().map(|(_, v)| v).collect())
    } else {
        Value::Object(map)
    }
}

/// Move the `_filters` object of a JSON body into `raw`.
///
/// Body filters override query filters of the same name. The key is removed
/// from the body either way.
pub fn merge_body_filters(raw: &mut RawQuery, body: &mut Value) -> Result<(), FilterError> {
    let Some(filters) = body.as_object_mut().and_then(|b| b.remove(BODY_FILTERS_KEY)) else {
        return Ok(());
    };

    match filters {
        Value::Object(filters) => {
            raw.extend(filters);
            Ok(())
        }
        Value::Null => Ok(()),
        _ => Err(FilterError::validation(
            BODY_FILTERS_KEY,
            "Body filters must be an object",
        )),
    }
}

/// Axum extractor for the raw filter parameters of the query string.
///
/// ```rust,ignore
/// async fn list_users(
///     State(state): State<AppState>,
///     FilterQuery(raw): FilterQuery,
/// ) -> Result<Json<Vec<Value>>, FilterError> {
///     let query = state.filters.apply_to_query(SeaQuery::new(), &raw)?;
///     ...
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterQuery(pub RawQuery);

impl FilterQuery {
    #[must_use]
    pub fn into_inner(self) -> RawQuery {
        self.0
    }
}

impl<S> FromRequestParts<S> for FilterQuery
where
    S: Send + Sync,
{
    type Rejection = FilterError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parse_query(parts.uri.query().unwrap_or_default()).map(Self)
    }
}

/// Constrain `query` to the records under the given parent route parameters.
///
/// Each parameter name must be a one-relation of `meta`; the relation is
/// compared to the parameter value, e.g. `/users/{father}/children` with
/// `[("father", "12")]` selects users whose `father` is 12.
pub fn scope_related<I, N, K>(
    query: &mut dyn QueryBuilder,
    meta: &dyn Meta,
    parents: I,
) -> Result<(), FilterError>
where
    I: IntoIterator<Item = (N, K)>,
    N: AsRef<str>,
    K: AsRef<str>,
{
    for (name, key) in parents {
        let name = name.as_ref();
        let field = meta
            .resolve_field(name, Some(FieldCapability::Relation))
            .map_err(|message| FilterError::validation(name, message))?;

        if field.is_many_relation() {
            return Err(FilterError::validation(
                name,
                format!("Cannot resolve many models from a one relation: {name}"),
            ));
        }

        let key = field
            .cast(field.decompose(Param::from(key.as_ref()), Operator::Eq))
            .map_err(|message| FilterError::validation(name, message))?;
        field
            .where_clause(query, Operator::Eq, &key)
            .map_err(|message| FilterError::validation(name, message))?;

        tracing::debug!(relation = %name, "Scoped query to parent");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FilterErrorKind;
    use crate::meta::{FieldDef, FieldType, ModelMeta};
    use crate::targets::{Directive, QueryPlan};
    use axum::http::Request;
    use serde_json::json;

    #[test]
    fn test_parse_shapes() {
        let raw = parse_query(
            "trash=only&order_by%5Bfield%5D=name&order_by[value]=desc&id[]=1&id[]=2&search[value]=a%20b",
        )
        .unwrap();

        assert_eq!(
            Value::Object(raw),
            json!({
                "trash": "only",
                "order_by": {"field": "name", "value": "desc"},
                "id": ["1", "2"],
                "search": {"value": "a b"},
            })
        );
    }

    #[test]
    fn test_parse_indexed_occurrences() {
        let raw = parse_query("date[1][field]=b&date[0][field]=a&date[0][value]=x").unwrap();
        assert_eq!(
            raw["date"],
            json!([{"field": "a", "value": "x"}, {"field": "b"}])
        );

        let raw = parse_query("weird[0]=a&weird[2]=b").unwrap();
        assert_eq!(raw["weird"], json!({"0": "a", "2": "b"}));
    }

    #[test]
    fn test_parse_numeric_filter_names() {
        let raw = parse_query("0=x&1=y").unwrap();
        assert_eq!(Value::Object(raw), json!({"0": "x", "1": "y"}));
    }

    #[test]
    fn test_parse_append_after_named_key() {
        let raw = parse_query("a[x]=1&a[]=2&a[]=3").unwrap();
        assert_eq!(raw["a"], json!({"x": "1", "0": "2", "1": "3"}));

        let raw = parse_query("a[3]=x&a[]=y").unwrap();
        assert_eq!(raw["a"], json!({"3": "x", "4": "y"}));
    }

    #[test]
    fn test_parse_keeps_encounter_order() {
        let raw = parse_query("per_page=5&order_by=name&append=father").unwrap();
        assert_eq!(
            raw.keys().collect::<Vec<_>>(),
            vec!["per_page", "order_by", "append"]
        );
    }

    #[test]
    fn test_parse_rejects_unbalanced_brackets() {
        let err = parse_query("order_by[field=name").unwrap_err();
        assert_eq!(err.kind(), FilterErrorKind::Validation);
        assert_eq!(err.filter(), "order_by");
        assert!(parse_query("order_by]=name").is_err());
    }

    #[test]
    fn test_merge_body_filters() {
        let mut raw = parse_query("trash=with&per_page=5").unwrap();
        let mut body = json!({"name": "x", "_filters": {"trash": "only", "append": "father"}});

        merge_body_filters(&mut raw, &mut body).unwrap();
        assert_eq!(body, json!({"name": "x"}));
        assert_eq!(
            Value::Object(raw),
            json!({"trash": "only", "per_page": "5", "append": "father"})
        );

        let mut body = json!({"_filters": "trash"});
        assert!(merge_body_filters(&mut RawQuery::new(), &mut body).is_err());
    }

    #[tokio::test]
    async fn test_extractor() {
        let (mut parts, ()) = Request::builder()
            .uri("/users?order_by%5Bfield%5D=name")
            .body(())
            .unwrap()
            .into_parts();
        let FilterQuery(raw) = FilterQuery::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(raw["order_by"], json!({"field": "name"}));

        let (mut parts, ()) = Request::builder()
            .uri("/users?order_by%5Bfield=name")
            .body(())
            .unwrap()
            .into_parts();
        let err = FilterQuery::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_scope_related() {
        let meta = ModelMeta::new("user")
            .with_field(FieldDef::attribute("name", FieldType::Text))
            .with_field(FieldDef::relation("father", "father_id", FieldType::Integer))
            .with_field(FieldDef::many_relation("children", FieldType::Integer));

        let mut plan = QueryPlan::new();
        scope_related(&mut plan, &meta, [("father", "12")]).unwrap();
        assert_eq!(
            plan.directives(),
            &[Directive::Where {
                column: "father_id".into(),
                operator: Operator::Eq,
                value: Param::Int(12),
            }]
        );

        let err = scope_related(&mut QueryPlan::new(), &meta, [("children", "1")]).unwrap_err();
        assert!(err.messages()[0].contains("Cannot resolve many models"));

        let err = scope_related(&mut QueryPlan::new(), &meta, [("name", "1")]).unwrap_err();
        assert!(err.messages()[0].contains("not a relation"));
    }
}
