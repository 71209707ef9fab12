// Filters driven through an axum router: query extraction, pagination
// headers and error responses.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::{Value, json};
use tower::ServiceExt;

mod common;
use common::{setup_test_app, setup_test_db};

async fn app() -> Router {
    let db = setup_test_db().await.expect("Failed to setup test database");
    setup_test_app(db)
}

async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn names(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|user| user["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_list_with_pagination_headers() {
    let app = app().await;

    let response = get(&app, "/users?order_by%5Bfield%5D=name&order_by%5Bvalue%5D=desc&per_page=2").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["pagination-count"], "2");
    assert_eq!(response.headers()["pagination-page"], "1");
    assert_eq!(response.headers()["pagination-limit"], "2");
    assert_eq!(response.headers()["pagination-total"], "4");
    assert_eq!(names(&json_body(response).await), vec!["Dana", "Charlie"]);

    let response = get(&app, "/users?order_by%5Bfield%5D=name&order_by%5Bvalue%5D=desc&per_page=2&page=2").await;
    assert_eq!(response.headers()["pagination-page"], "2");
    assert_eq!(names(&json_body(response).await), vec!["Bob", "Alice"]);
}

#[tokio::test]
async fn test_trashed_records() {
    let app = app().await;

    let response = get(&app, "/users?trash=only").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["pagination-total"], "1");
    assert_eq!(names(&json_body(response).await), vec!["Eve"]);
}

#[tokio::test]
async fn test_unknown_filter_is_rejected() {
    let app = app().await;

    let response = get(&app, "/users?bogus=1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "An issue were detected with filters");
    assert_eq!(body["filters"], json!({"bogus": ["Unknown filter `bogus`"]}));
}

#[tokio::test]
async fn test_every_invalid_filter_is_reported() {
    let app = app().await;

    let response = get(&app, "/users?trash=archived&per_page=101&order_by=name").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let filters = json_body(response).await["filters"].clone();
    assert_eq!(filters["trash"], json!(["Expected one of: with, without, only"]));
    assert_eq!(filters["per_page"], json!(["Min per page `1` and max `100`"]));
    assert!(filters.get("order_by").is_none());
}

#[tokio::test]
async fn test_malformed_query_is_rejected() {
    let app = app().await;

    let response = get(&app, "/users?order_by%5Bfield=name").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["filters"]["order_by"].is_array());
}

#[tokio::test]
async fn test_related_route() {
    let app = app().await;

    let response = get(&app, "/users/1/children?order_by=name").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["pagination-total"], "2");
    assert_eq!(names(&json_body(response).await), vec!["Bob", "Charlie"]);

    let response = get(&app, "/users/nope/children").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["filters"]["father"].is_array());
}
