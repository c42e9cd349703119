//! HTTP handlers.
//!
//! Handlers only translate HTTP: they pick the lock, pass the actor, body
//! and clock to [`quill_core::Blog`], and choose the success status.
//!
//! Reads take [`CurrentUser`] too, so bad credentials get 401 everywhere.

use super::AppState;
use super::error::ApiError;
use super::extract::{CurrentUser, JsonBody};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use quill_core::{CommentId, CommentView, PostDetail, PostId, PostSummary};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Route ids are plain digit runs; anything else does not match a route.
fn parse_id(raw: &str) -> Result<u64, ApiError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::RouteNotFound);
    }
    raw.parse().map_err(|_| ApiError::RouteNotFound)
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}

// =============================================================================
// POSTS
// =============================================================================

pub async fn list_posts(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<PostSummary>>, ApiError> {
    let blog = state.blog().read().await;
    Ok(Json(blog.list_posts()?))
}

pub async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(body): JsonBody,
) -> Result<(StatusCode, Json<PostDetail>), ApiError> {
    let detail = state
        .blog()
        .write()
        .await
        .create_post(user.actor(), body, Utc::now())?;
    debug!(post = %detail.id, author = %detail.author.username, "post created");
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn post_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    _user: CurrentUser,
) -> Result<Json<PostDetail>, ApiError> {
    let id = PostId(parse_id(&id)?);
    let blog = state.blog().read().await;
    Ok(Json(blog.post_detail(id)?))
}

async fn update_post(
    state: AppState,
    user: CurrentUser,
    id: &str,
    body: JsonBody,
    partial: bool,
) -> Result<Json<PostDetail>, ApiError> {
    let id = PostId(parse_id(id)?);
    let detail = state
        .blog()
        .write()
        .await
        .update_post(user.actor(), id, body, partial, Utc::now())?;
    debug!(post = %id, partial, "post updated");
    Ok(Json(detail))
}

pub async fn replace_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
    body: JsonBody,
) -> Result<Json<PostDetail>, ApiError> {
    update_post(state, user, &id, body, false).await
}

pub async fn patch_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
    body: JsonBody,
) -> Result<Json<PostDetail>, ApiError> {
    update_post(state, user, &id, body, true).await
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> Result<StatusCode, ApiError> {
    let id = PostId(parse_id(&id)?);
    state.blog().write().await.delete_post(user.actor(), id)?;
    debug!(post = %id, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// COMMENTS
// =============================================================================

pub async fn list_comments(
    State(state): State<AppState>,
    Path(post): Path<String>,
    _user: CurrentUser,
) -> Result<Json<Vec<CommentView>>, ApiError> {
    let post = PostId(parse_id(&post)?);
    let blog = state.blog().read().await;
    Ok(Json(blog.list_comments(post)?))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Path(post): Path<String>,
    user: CurrentUser,
    JsonBody(body): JsonBody,
) -> Result<(StatusCode, Json<CommentView>), ApiError> {
    let post = PostId(parse_id(&post)?);
    let comment = state
        .blog()
        .write()
        .await
        .create_comment(user.actor(), post, body, Utc::now())?;
    debug!(post = %post, comment = %comment.id, "comment created");
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
    JsonBody(body): JsonBody,
) -> Result<Json<CommentView>, ApiError> {
    let id = CommentId(parse_id(&id)?);
    let comment = state
        .blog()
        .write()
        .await
        .update_comment(user.actor(), id, body)?;
    debug!(comment = %id, "comment updated");
    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> Result<StatusCode, ApiError> {
    let id = CommentId(parse_id(&id)?);
    state.blog().write().await.delete_comment(user.actor(), id)?;
    debug!(comment = %id, "comment deleted");
    Ok(StatusCode::NO_CONTENT)
}
