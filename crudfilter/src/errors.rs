//! # Filter Errors
//!
//! Every failure raised while registering or resolving filters is a
//! [`FilterError`]. An error always carries the identity of the filter that
//! raised it and an ordered list of messages, and renders as
//! `{"filter_name": ["message", ...]}`.
//!
//! | Kind            | Raised when                                            | HTTP |
//! |-----------------|--------------------------------------------------------|------|
//! | `NotFound`      | an unknown filter name appears in the request          | 400  |
//! | `Validation`    | a parameter has a bad shape or value                   | 400  |
//! | `Ownership`     | a filter is used before binding, or its field is wrong | 500  |
//! | `Configuration` | a filter is renamed after its name was set             | 500  |
//!
//! Client-facing kinds are returned as structured data. Ownership and
//! configuration errors are programming mistakes in the setup callback: they
//! are logged with `tracing` and the client only sees a generic message.
//!
//! ```rust,ignore
//! async fn list(FilterQuery(raw): FilterQuery) -> Result<Json<Value>, FilterError> {
//!     let registry = setup_registry()?;
//!     let plan = registry.apply_to_query(QueryPlan::new(), &raw)?;
//!     Ok(Json(json!({ "directives": plan.map(|p| p.len()) })))
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

const FILTERS_ISSUE: &str = "An issue were detected with filters";

/// Category of a filter failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterErrorKind {
    /// Unknown filter name outside the pagination exemptions
    NotFound,
    /// Bad parameter shape or value
    Validation,
    /// Filter used before binding, or bound field lacks a capability
    Ownership,
    /// Attempt to rename an already-named filter
    Configuration,
}

impl FilterErrorKind {
    /// Whether the failure was caused by the request rather than the setup
    #[must_use]
    pub const fn is_client_error(self) -> bool {
        matches!(self, Self::NotFound | Self::Validation)
    }
}

/// A failure attributed to one filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterError {
    kind: FilterErrorKind,
    filter: String,
    messages: Vec<String>,
}

impl FilterError {
    pub fn new(kind: FilterErrorKind, filter: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            filter: filter.into(),
            messages: vec![message.into()],
        }
    }

    /// Unknown filter name
    pub fn not_found(filter: impl Into<String>) -> Self {
        let filter = filter.into();
        let message = format!("Unknown filter `{filter}`");
        Self::new(FilterErrorKind::NotFound, filter, message)
    }

    pub fn validation(filter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FilterErrorKind::Validation, filter, message)
    }

    pub fn ownership(filter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FilterErrorKind::Ownership, filter, message)
    }

    pub fn configuration(filter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FilterErrorKind::Configuration, filter, message)
    }

    /// Append another message to this error
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    #[must_use]
    pub const fn kind(&self) -> FilterErrorKind {
        self.kind
    }

    /// Name of the filter that raised the error
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        if self.kind.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Render as `{filter: [messages]}`
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            self.filter.clone(),
            Value::from(self.messages.clone()),
        );
        Value::Object(map)
    }

    fn log_internal(&self) {
        if self.kind.is_client_error() {
            tracing::debug!(
                filter = %self.filter,
                kind = ?self.kind,
                messages = ?self.messages,
                "Filter rejected request"
            );
        } else {
            tracing::error!(
                filter = %self.filter,
                kind = ?self.kind,
                messages = ?self.messages,
                "Filter setup error"
            );
        }
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.filter, self.messages.join("; "))
    }
}

impl std::error::Error for FilterError {}

/// Errors from several filters, grouped by filter name in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterErrors {
    errors: Vec<FilterError>,
}

impl FilterErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add an error, merging new messages into an existing entry for the same filter
    pub fn push(&mut self, error: FilterError) {
        match self.errors.iter_mut().find(|e| e.filter == error.filter) {
            Some(existing) => {
                for message in error.messages {
                    if !existing.messages.contains(&message) {
                        existing.messages.push(message);
                    }
                }
            }
            None => self.errors.push(error),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn errors(&self) -> &[FilterError] {
        &self.errors
    }

    /// Messages recorded for one filter
    #[must_use]
    pub fn get(&self, filter: &str) -> Option<&[String]> {
        self.errors
            .iter()
            .find(|e| e.filter == filter)
            .map(FilterError::messages)
    }

    /// Convert to Result
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let map = self
            .errors
            .iter()
            .map(|e| (e.filter.clone(), Value::from(e.messages.clone())))
            .collect::<Map<_, _>>();
        Value::Object(map)
    }

    fn status_code(&self) -> StatusCode {
        if self.errors.iter().all(|e| e.kind.is_client_error()) {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<FilterError> for FilterErrors {
    fn from(error: FilterError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl fmt::Display for FilterErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} filter(s) rejected:", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FilterErrors {}

/// Error response sent to users (sanitized)
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<Value>,
}

impl ErrorResponse {
    fn internal() -> Self {
        Self {
            error: "Filters are misconfigured".to_string(),
            filters: None,
        }
    }
}

impl IntoResponse for FilterError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let body = if self.kind.is_client_error() {
            ErrorResponse {
                error: FILTERS_ISSUE.to_string(),
                filters: Some(self.to_json()),
            }
        } else {
            ErrorResponse::internal()
        };

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for FilterErrors {
    fn into_response(self) -> Response {
        for error in &self.errors {
            error.log_internal();
        }

        let status = self.status_code();
        let body = if status == StatusCode::BAD_REQUEST {
            ErrorResponse {
                error: FILTERS_ISSUE.to_string(),
                filters: Some(self.to_json()),
            }
        } else {
            ErrorResponse::internal()
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_not_found_names_filter() {
        let err = FilterError::not_found("bogus");
        assert_eq!(err.kind(), FilterErrorKind::NotFound);
        assert_eq!(err.filter(), "bogus");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.messages()[0].contains("bogus"));
    }

    #[test]
    fn test_renders_as_name_to_messages() {
        let err = FilterError::validation("trash", "Only with, without or only")
            .with_message("second");
        assert_eq!(
            err.to_json(),
            json!({"trash": ["Only with, without or only", "second"]})
        );
        assert_eq!(err.to_string(), "trash: Only with, without or only; second");
    }

    #[test]
    fn test_setup_errors_are_server_errors() {
        assert_eq!(
            FilterError::ownership("related", "not owned").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            FilterError::configuration("x", "renamed").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_aggregation_merges_same_filter() {
        let mut errors = FilterErrors::new();
        errors.push(FilterError::validation("per_page", "too big"));
        errors.push(FilterError::validation("trash", "bad mode"));
        errors.push(FilterError::validation("per_page", "second occurrence"));

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.get("per_page"),
            Some(&["too big".to_string(), "second occurrence".to_string()][..])
        );
        assert_eq!(
            errors.to_json(),
            json!({"per_page": ["too big", "second occurrence"], "trash": ["bad mode"]})
        );
        assert!(errors.result().is_err());
        assert!(FilterErrors::new().result().is_ok());
    }

    #[tokio::test]
    async fn test_validation_response_body() {
        let response = FilterError::validation("order_by", "Use right value").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["filters"], json!({"order_by": ["Use right value"]}));
    }

    #[tokio::test]
    async fn test_internal_response_hides_details() {
        let response = FilterError::ownership("related", "secret detail").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("secret detail"));
    }
}
