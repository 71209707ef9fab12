//! Static per-filter-type configuration.
//!
//! Every filter type reads its options from one section of [`FilterConfig`].
//! The value is immutable once built and can be shared across requests.
//!
//! ```json
//! {
//!     "order_by": { "allowed_values": ["asc", "desc"] },
//!     "per_page": { "min": 5, "max": 50 },
//!     "search": { "only": ["like"] }
//! }
//! ```
//!
//! Missing sections and keys fall back to their defaults.

use serde::Deserialize;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub append: AppendConfig,
    pub date: DateConfig,
    pub filter: OperatorConfig,
    pub order_by: OrderByConfig,
    pub page: PageConfig,
    pub per_page: PerPageConfig,
    pub related: OperatorConfig,
    pub search: SearchConfig,
    pub trash: TrashConfig,
}

impl FilterConfig {
    /// Parse from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppendConfig {
    /// Accepted spellings of true and false; the first is the default
    pub allowed_values: Vec<String>,
    /// Restricts the fields that can be appended
    pub fields: Option<Vec<String>>,
}

impl Default for AppendConfig {
    fn default() -> Self {
        Self {
            allowed_values: strings(&["true", "false"]),
            fields: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DateConfig {
    /// Allowed operators by name or symbol; all operators when unset
    pub operators: Option<Vec<String>>,
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    pub operators: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OrderByConfig {
    /// `asc`, `desc` and `random`; the first is the default
    pub allowed_values: Vec<String>,
    pub fields: Option<Vec<String>>,
}

impl Default for OrderByConfig {
    fn default() -> Self {
        Self {
            allowed_values: strings(&["asc", "desc", "random"]),
            fields: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub default: u64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self { default: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PerPageConfig {
    pub min: u64,
    pub max: u64,
}

impl Default for PerPageConfig {
    fn default() -> Self {
        Self { min: 1, max: 100 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Booleans joining searched values; the first is the default
    pub allowed_values: Vec<String>,
    /// Operators a search may use
    pub only: Vec<String>,
    pub fields: Option<Vec<String>>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            allowed_values: strings(&["or", "and"]),
            only: strings(&["eq", "equal", "not_eq", "not_equal", "like", "not_like"]),
            fields: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrashConfig {
    pub allowed_values: Vec<String>,
}

impl Default for TrashConfig {
    fn default() -> Self {
        Self {
            allowed_values: strings(&["with", "without", "only"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FilterConfig::default();
        assert_eq!(config.per_page.min, 1);
        assert_eq!(config.per_page.max, 100);
        assert_eq!(config.order_by.allowed_values, vec!["asc", "desc", "random"]);
        assert_eq!(config.trash.allowed_values, vec!["with", "without", "only"]);
        assert!(config.date.operators.is_none());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = FilterConfig::from_json_str(
            r#"{"per_page": {"max": 50}, "date": {"operators": [">=", "<="]}}"#,
        )
        .unwrap();
        assert_eq!(config.per_page.min, 1);
        assert_eq!(config.per_page.max, 50);
        assert_eq!(config.date.operators, Some(vec![">=".into(), "<=".into()]));
        assert_eq!(config.append, AppendConfig::default());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(FilterConfig::from_json_str(r#"{"per_page": {"max": "lots"}}"#).is_err());
    }
}
