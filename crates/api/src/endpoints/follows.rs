//! Follow endpoints.

use axum::{Json, Router, extract::State, routing::post};
use folio_common::AppResult;
use serde::{Deserialize, Serialize};

use crate::{
    endpoints::parse_target, extractors::AuthUser, response::ApiResponse, state::AppState,
};

/// Follow request addressing one target.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub target_type: String,
    pub target_id: String,
}

/// Result of a follow mutation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowChanged {
    pub changed: bool,
}

/// Follow a target.
async fn create(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FollowRequest>,
) -> AppResult<ApiResponse<FollowChanged>> {
    let target = parse_target(&req.target_type, req.target_id)?;
    let changed = state.follow_service.follow(&user_id, &target).await?;
    Ok(ApiResponse::ok(FollowChanged { changed }))
}

/// Unfollow a target.
async fn delete(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FollowRequest>,
) -> AppResult<ApiResponse<FollowChanged>> {
    let target = parse_target(&req.target_type, req.target_id)?;
    let changed = state.follow_service.unfollow(&user_id, &target).await?;
    Ok(ApiResponse::ok(FollowChanged { changed }))
}

/// List following request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFollowingRequest {
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
}

const fn default_limit() -> u64 {
    10
}

/// Followed target response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowingResponse {
    pub id: String,
    pub target_type: String,
    pub target_id: String,
    pub created_at: String,
}

/// List everything the requesting user follows.
async fn following(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListFollowingRequest>,
) -> AppResult<ApiResponse<Vec<FollowingResponse>>> {
    let limit = req.limit.min(100);
    let rows = state
        .follow_service
        .following(&user_id, limit, req.until_id.as_deref())
        .await?;

    Ok(ApiResponse::ok(
        rows.into_iter()
            .map(|row| FollowingResponse {
                id: row.id,
                target_type: row.target_type.as_str().to_string(),
                target_id: row.target_id,
                created_at: row.created_at.to_rfc3339(),
            })
            .collect(),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/delete", post(delete))
        .route("/list", post(following))
}
