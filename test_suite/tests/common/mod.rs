use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use crudfilter::meta::MetaRef;
use crudfilter::pagination::pagination_headers;
use crudfilter::{
    Append, Date, FieldDef, FieldFilter, FieldType, FilterConfig, FilterQuery, FilterRegistry,
    ModelMeta, OrderBy, Page, PageRequest, Pagination, PerPage, RawQuery, Related, SeaQuery,
    Search, Trash, scope_related,
};
use sea_orm::sea_query::{Alias, Expr, Query, SelectStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr};
use serde_json::{Value, json};

pub const USERS: &str = "users";

#[allow(dead_code)]
pub fn user_meta() -> MetaRef {
    ModelMeta::new("user")
        .per_page(15)
        .with_field(FieldDef::attribute("id", FieldType::Integer))
        .with_field(FieldDef::attribute("name", FieldType::Text))
        .with_field(FieldDef::attribute("email", FieldType::Text))
        .with_field(FieldDef::attribute("age", FieldType::Integer))
        .with_field(FieldDef::attribute("created_at", FieldType::DateTime))
        .with_field(FieldDef::computed("full_name", FieldType::Text))
        .with_field(FieldDef::relation("father", "father_id", FieldType::Integer).with_reversed("children"))
        .with_field(FieldDef::many_relation("children", FieldType::Integer).with_reversed("father"))
        .into_ref()
}

/// Every built-in filter, registered the way an application would
#[allow(dead_code)]
pub fn user_filters(config: &FilterConfig) -> FilterRegistry {
    FilterRegistry::setup(user_meta(), |filters| {
        filters
            .register("append", Append::from_config(config))?
            .register("date", Date::from_config(config).fields(["created_at"]))?
            .register("name", FieldFilter::from_config(config))?
            .register("age", FieldFilter::from_config(config))?
            .register("father", Related::from_config(config))?
            .register("order_by", OrderBy::from_config(config))?
            .register("page", Page::from_config(config))?
            .register("per_page", PerPage::from_config(config))?
            .register("search", Search::from_config(config).fields(["name", "email"]))?
            .register("trash", Trash::from_config(config))?;
        Ok(())
    })
    .expect("user filters should register")
    .paginate(true)
}

#[allow(dead_code)]
pub fn raw(value: Value) -> RawQuery {
    value.as_object().cloned().unwrap_or_default()
}

#[allow(dead_code)]
pub fn user_query() -> SeaQuery {
    SeaQuery::new().with_soft_delete("deleted_at")
}

/// In-memory SQLite database seeded with five users, one of them trashed
#[allow(dead_code)]
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    let db = Database::connect("sqlite::memory:").await?;

    db.execute_unprepared(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            age INTEGER NOT NULL,
            father_id INTEGER NULL,
            created_at TEXT NOT NULL,
            deleted_at TEXT NULL
        )",
    )
    .await?;

    db.execute_unprepared(
        "INSERT INTO users (id, name, email, age, father_id, created_at, deleted_at) VALUES
            (1, 'Alice', 'alice@example.com', 34, NULL, '2024-01-01 09:00:00', NULL),
            (2, 'Bob', 'bob@example.com', 28, 1, '2024-01-02 09:00:00', NULL),
            (3, 'Charlie', 'charlie@example.com', 41, 1, '2024-01-03 09:00:00', NULL),
            (4, 'Dana', 'dana@example.com', 19, 2, '2024-01-04 09:00:00', NULL),
            (5, 'Eve', 'eve@example.com', 25, NULL, '2024-01-05 09:00:00', '2024-03-01 00:00:00')",
    )
    .await?;

    Ok(db)
}

#[allow(dead_code)]
pub async fn fetch_names(db: &DatabaseConnection, statement: &SelectStatement) -> Result<Vec<String>, DbErr> {
    let rows = db.query_all(db.get_database_backend().build(statement)).await?;
    rows.iter().map(|row| row.try_get::<String>("", "name")).collect()
}

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub filters: Arc<FilterRegistry>,
}

#[allow(dead_code)]
pub fn setup_test_app(db: DatabaseConnection) -> Router {
    let state = AppState {
        db,
        filters: Arc::new(user_filters(&FilterConfig::default())),
    };

    Router::new()
        .route("/users", get(list_users))
        .route("/users/{father}/children", get(list_children))
        .with_state(state)
}

async fn list_users(State(state): State<AppState>, FilterQuery(raw): FilterQuery) -> Result<Response, Response> {
    respond(&state, user_query(), &raw).await
}

async fn list_children(
    State(state): State<AppState>,
    Path(parents): Path<HashMap<String, String>>,
    FilterQuery(raw): FilterQuery,
) -> Result<Response, Response> {
    let mut query = user_query();
    scope_related(&mut query, &**state.filters.meta(), &parents).map_err(IntoResponse::into_response)?;
    respond(&state, query, &raw).await
}

async fn respond(state: &AppState, query: SeaQuery, raw: &RawQuery) -> Result<Response, Response> {
    state.filters.validate(raw).map_err(IntoResponse::into_response)?;

    let Some(query) = state
        .filters
        .paginate_query(query, raw)
        .map_err(IntoResponse::into_response)?
    else {
        return Ok(axum::Json(json!([])).into_response());
    };

    let backend = state.db.get_database_backend();
    let rows = state
        .db
        .query_all(backend.build(&query.into_statement(USERS)))
        .await
        .map_err(internal)?;

    let users = rows
        .iter()
        .map(|row| {
            Ok(json!({
                "id": row.try_get::<i64>("", "id")?,
                "name": row.try_get::<String>("", "name")?,
                "email": row.try_get::<String>("", "email")?,
                "age": row.try_get::<i64>("", "age")?,
            }))
        })
        .collect::<Result<Vec<Value>, DbErr>>()
        .map_err(internal)?;

    let mut count = Query::select();
    count
        .expr_as(Expr::cust("COUNT(*)"), Alias::new("total"))
        .from(Alias::new(USERS));
    let condition = query.condition();
    if !condition.is_empty() {
        count.cond_where(condition);
    }
    let total = state
        .db
        .query_one(backend.build(&count))
        .await
        .map_err(internal)?
        .map(|row| row.try_get::<i64>("", "total"))
        .transpose()
        .map_err(internal)?
        .unwrap_or_default();

    let request = state
        .filters
        .resolve_pagination(raw)
        .map_err(IntoResponse::into_response)?
        .unwrap_or(PageRequest::Offset { page: 1, per_page: 15 });
    let pagination = Pagination::for_request(&request, u64::try_from(total).unwrap_or_default());

    Ok((pagination_headers(&pagination), axum::Json(users)).into_response())
}

fn internal(err: DbErr) -> Response {
    tracing::error!(error = %err, "Database query failed");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
}
