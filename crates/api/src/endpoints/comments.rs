//! Comment endpoints.

use axum::{Json, Router, extract::State, routing::post};
use folio_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    endpoints::parse_target, extractors::AuthUser, response::ApiResponse, state::AppState,
};

/// Create comment request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub target_type: String,
    pub target_id: String,
    #[validate(length(min = 1, max = 8192))]
    pub content: String,
    pub parent_id: Option<String>,
}

/// Comment response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub user_id: String,
    pub target_type: String,
    pub target_id: String,
    pub content: String,
    pub parent_id: Option<String>,
    pub created_at: String,
}

impl From<folio_db::entities::comment::Model> for CommentResponse {
    fn from(model: folio_db::entities::comment::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            target_type: model.target_type.as_str().to_string(),
            target_id: model.target_id,
            content: model.content,
            parent_id: model.parent_id,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// Post a comment or reply.
async fn create(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    req.validate()?;
    let target = parse_target(&req.target_type, req.target_id)?;

    let created = state
        .comment_service
        .create(&target, &user_id, &req.content, req.parent_id.as_deref())
        .await?;

    Ok(ApiResponse::ok(created.into()))
}

/// Delete comment request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCommentRequest {
    pub comment_id: String,
}

/// Remove a comment.
async fn delete(
    AuthUser(_user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DeleteCommentRequest>,
) -> AppResult<ApiResponse<()>> {
    let removed = state.comment_service.delete(&req.comment_id).await?;
    if !removed {
        return Err(AppError::CommentNotFound(req.comment_id));
    }
    Ok(ApiResponse::ok(()))
}

/// Paginated comment listing request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentsRequest {
    pub target_type: String,
    pub target_id: String,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

const fn default_page() -> u64 {
    1
}

const fn default_per_page() -> u64 {
    10
}

/// One page of comments with the total count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    pub comments: Vec<CommentResponse>,
    pub total: i64,
    pub page: u64,
    pub per_page: u64,
}

/// List top-level comments on a target.
async fn list(
    State(state): State<AppState>,
    Json(req): Json<ListCommentsRequest>,
) -> AppResult<ApiResponse<CommentPage>> {
    let target = parse_target(&req.target_type, req.target_id)?;
    let page = req.page.max(1);
    let per_page = req.per_page.clamp(1, 100);

    let comments = state
        .comment_service
        .get_comments(&target, page, per_page)
        .await?;
    let total = state.comment_service.comments_count(&target).await?;

    Ok(ApiResponse::ok(CommentPage {
        comments: comments.into_iter().map(Into::into).collect(),
        total,
        page,
        per_page,
    }))
}

/// Paginated reply listing request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRepliesRequest {
    pub parent_id: String,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

/// List replies under a parent comment.
async fn replies(
    State(state): State<AppState>,
    Json(req): Json<ListRepliesRequest>,
) -> AppResult<ApiResponse<CommentPage>> {
    let page = req.page.max(1);
    let per_page = req.per_page.clamp(1, 100);

    let comments = state
        .comment_service
        .get_replies(&req.parent_id, page, per_page)
        .await?;
    let total = state.comment_service.replies_count(&req.parent_id).await?;

    Ok(ApiResponse::ok(CommentPage {
        comments: comments.into_iter().map(Into::into).collect(),
        total,
        page,
        per_page,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/delete", post(delete))
        .route("/list", post(list))
        .route("/replies", post(replies))
}
