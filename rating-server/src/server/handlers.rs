// HTTP request handlers
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::Json;
use rating_engine::{AuthProvider, DEFAULT_TOP_WRITEUPS};
use rating_shared::types::{
    CastOutcome, ItemId, NewWriteup, Principal, VoteDirection, VoteValue, Writeup, WriteupSort,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::server::error::ApiError;
use crate::server::extract::{ApiJson, ApiPath, ApiQuery};
use crate::server::state::AppState;

/// Upper bound on `limit` for list requests.
pub const MAX_LIST_LIMIT: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub sort: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopQuery {
    pub count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    pub value: i64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CurrentVoteResponse {
    pub value: Option<VoteValue>,
}

/// Resolve the `Authorization: Bearer <token>` header to a principal.
///
/// A missing header, a non-bearer scheme or an unknown token all yield
/// `None`; the services decide whether that is acceptable.
pub async fn resolve_caller(
    auth: &dyn AuthProvider,
    headers: &HeaderMap,
) -> Result<Option<Principal>, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    match token {
        Some(token) => Ok(auth.authenticate(token).await?),
        None => Ok(None),
    }
}

fn parse_sort(sort: Option<&str>) -> Result<WriteupSort, ApiError> {
    match sort {
        None => Ok(WriteupSort::default()),
        Some(value) => match value.to_lowercase().as_str() {
            "rating" => Ok(WriteupSort::Rating),
            "newest" => Ok(WriteupSort::Newest),
            _ => Err(ApiError::bad_request(format!(
                "sort must be 'rating' or 'newest', got '{value}'"
            ))),
        },
    }
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

pub async fn list_writeups(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<Writeup>>, ApiError> {
    let sort = parse_sort(query.sort.as_deref())?;
    let limit = query.limit.map(|limit| limit.min(MAX_LIST_LIMIT));

    let writeups = state.content.list_writeups(sort, limit).await?;
    Ok(Json(writeups))
}

/// Highest rated writeups, as shown on the landing page
pub async fn top_writeups(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TopQuery>,
) -> Result<Json<Vec<Writeup>>, ApiError> {
    let count = query
        .count
        .unwrap_or(DEFAULT_TOP_WRITEUPS)
        .min(MAX_LIST_LIMIT);

    Ok(Json(state.content.top_writeups(count).await?))
}

pub async fn get_writeup(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ItemId>,
) -> Result<Json<Writeup>, ApiError> {
    Ok(Json(state.content.get_writeup(id).await?))
}

pub async fn create_writeup(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<NewWriteup>,
) -> Result<(StatusCode, Json<Writeup>), ApiError> {
    let caller = resolve_caller(state.auth.as_ref(), &headers).await?;
    let created = state.content.create_writeup(caller.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_writeup(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<ItemId>,
) -> Result<StatusCode, ApiError> {
    let caller = resolve_caller(state.auth.as_ref(), &headers).await?;
    state.content.delete_writeup(caller.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Cast endpoint - applies an up (1) or down (-1) vote for the caller
pub async fn cast_vote(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<ItemId>,
    ApiJson(payload): ApiJson<CastVoteRequest>,
) -> Result<Json<CastOutcome>, ApiError> {
    let caller = resolve_caller(state.auth.as_ref(), &headers).await?;
    let direction = VoteDirection::try_from(payload.value)
        .map_err(|_| ApiError::bad_request("value must be 1 or -1"))?;

    debug!(writeup_id = %id, value = payload.value, "Received vote request");
    let outcome = state.voting.cast_vote(caller.as_ref(), id, direction).await?;
    Ok(Json(outcome))
}

pub async fn current_vote(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<ItemId>,
) -> Result<Json<CurrentVoteResponse>, ApiError> {
    let caller = resolve_caller(state.auth.as_ref(), &headers).await?;
    let value = state.voting.current_vote(caller.as_ref(), id).await?;
    Ok(Json(CurrentVoteResponse { value }))
}
