//! Blog API Endpoints
//! Mission: CRUD handlers for posts and their comments

use crate::blog::models::{Comment, CommentData, Page, PageParams, Post, PostData};
use crate::blog::store::BlogStore;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;

/// Shared blog state
#[derive(Clone)]
pub struct BlogState {
    pub store: Arc<BlogStore>,
}

// ===== Post Handlers =====

/// Create post - POST /api/v1/posts
pub async fn create_post(
    State(state): State<BlogState>,
    Json(payload): Json<PostData>,
) -> Result<(StatusCode, Json<Post>), BlogApiError> {
    validate_post(&payload)?;
    let post = state.store.create_post(&payload)?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// List posts - GET /api/v1/posts
pub async fn list_posts(
    State(state): State<BlogState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Post>>, BlogApiError> {
    Ok(Json(state.store.list_posts(&params)?))
}

/// Get post - GET /api/v1/posts/:id
pub async fn get_post(
    State(state): State<BlogState>,
    Path(id): Path<i64>,
) -> Result<Json<Post>, BlogApiError> {
    state
        .store
        .get_post(id)?
        .map(Json)
        .ok_or(BlogApiError::PostNotFound(id))
}

/// Update post - PUT /api/v1/posts/:id
pub async fn update_post(
    State(state): State<BlogState>,
    Path(id): Path<i64>,
    Json(payload): Json<PostData>,
) -> Result<Json<Post>, BlogApiError> {
    validate_post(&payload)?;
    state
        .store
        .update_post(id, &payload)?
        .map(Json)
        .ok_or(BlogApiError::PostNotFound(id))
}

/// Delete post - DELETE /api/v1/posts/:id
pub async fn delete_post(
    State(state): State<BlogState>,
    Path(id): Path<i64>,
) -> Result<&'static str, BlogApiError> {
    if !state.store.delete_post(id)? {
        return Err(BlogApiError::PostNotFound(id));
    }
    Ok("Post deleted successfully!")
}

// ===== Comment Handlers =====

/// Create comment - POST /api/v1/posts/:post_id/comments
pub async fn create_comment(
    State(state): State<BlogState>,
    Path(post_id): Path<i64>,
    Json(payload): Json<CommentData>,
) -> Result<(StatusCode, Json<Comment>), BlogApiError> {
    validate_comment(&payload)?;
    if !state.store.post_exists(post_id)? {
        return Err(BlogApiError::PostNotFound(post_id));
    }

    let comment = state.store.create_comment(post_id, &payload)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// List comments - GET /api/v1/posts/:post_id/comments
pub async fn list_comments(
    State(state): State<BlogState>,
    Path(post_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Comment>>, BlogApiError> {
    if !state.store.post_exists(post_id)? {
        return Err(BlogApiError::PostNotFound(post_id));
    }
    Ok(Json(state.store.list_comments(post_id, &params)?))
}

/// Get comment - GET /api/v1/posts/:post_id/comments/:comment_id
pub async fn get_comment(
    State(state): State<BlogState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Json<Comment>, BlogApiError> {
    let comment = fetch_owned_comment(&state, post_id, comment_id)?;
    Ok(Json(comment))
}

/// Update comment - PUT /api/v1/posts/:post_id/comments/:comment_id
pub async fn update_comment(
    State(state): State<BlogState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    Json(payload): Json<CommentData>,
) -> Result<Json<Comment>, BlogApiError> {
    validate_comment(&payload)?;
    fetch_owned_comment(&state, post_id, comment_id)?;

    state
        .store
        .update_comment(comment_id, &payload)?
        .map(Json)
        .ok_or(BlogApiError::CommentNotFound(comment_id))
}

/// Delete comment - DELETE /api/v1/posts/:post_id/comments/:comment_id
pub async fn delete_comment(
    State(state): State<BlogState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<&'static str, BlogApiError> {
    fetch_owned_comment(&state, post_id, comment_id)?;

    state.store.delete_comment(comment_id)?;
    Ok("Comment deleted successfully!")
}

/// Post existence, comment existence, then ownership, in that order.
fn fetch_owned_comment(
    state: &BlogState,
    post_id: i64,
    comment_id: i64,
) -> Result<Comment, BlogApiError> {
    if !state.store.post_exists(post_id)? {
        return Err(BlogApiError::PostNotFound(post_id));
    }

    let comment = state
        .store
        .get_comment(comment_id)?
        .ok_or(BlogApiError::CommentNotFound(comment_id))?;

    if comment.post_id != post_id {
        return Err(BlogApiError::CommentMismatch);
    }

    Ok(comment)
}

fn validate_post(payload: &PostData) -> Result<(), BlogApiError> {
    if payload.title.trim().is_empty() {
        return Err(BlogApiError::Validation("Post title must not be empty"));
    }
    if payload.content.trim().is_empty() {
        return Err(BlogApiError::Validation("Post content must not be empty"));
    }
    Ok(())
}

fn validate_comment(payload: &CommentData) -> Result<(), BlogApiError> {
    if payload.name.trim().is_empty() {
        return Err(BlogApiError::Validation("Comment name must not be empty"));
    }
    if payload.body.trim().is_empty() {
        return Err(BlogApiError::Validation("Comment body must not be empty"));
    }
    if !payload.email.contains('@') {
        return Err(BlogApiError::Validation("Comment email is not valid"));
    }
    Ok(())
}

// ===== Error Handling =====

#[derive(Debug)]
pub enum BlogApiError {
    PostNotFound(i64),
    CommentNotFound(i64),
    CommentMismatch,
    Validation(&'static str),
    Database(anyhow::Error),
}

impl From<anyhow::Error> for BlogApiError {
    fn from(err: anyhow::Error) -> Self {
        BlogApiError::Database(err)
    }
}

impl IntoResponse for BlogApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            BlogApiError::PostNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Post not found with id: {id}"))
            }
            BlogApiError::CommentNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Comment not found with id: {id}"),
            ),
            BlogApiError::CommentMismatch => (
                StatusCode::BAD_REQUEST,
                "Comment does not belong to post".to_string(),
            ),
            BlogApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
            BlogApiError::Database(err) => {
                tracing::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
