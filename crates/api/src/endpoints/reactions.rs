//! Reaction endpoints.

use axum::{Json, Router, extract::State, routing::post};
use folio_common::AppResult;
use folio_db::entities::reaction::ReactionKind;
use serde::{Deserialize, Serialize};

use crate::{
    endpoints::parse_target,
    extractors::{AuthUser, MaybeAuthUser},
    response::ApiResponse,
    state::AppState,
};

/// Reaction request addressing one target.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRequest {
    pub target_type: String,
    pub target_id: String,
}

/// Result of a reaction mutation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionChanged {
    /// Whether the ledger actually changed (false on repeats).
    pub changed: bool,
}

/// Like a target, retracting any dislike.
async fn like(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TargetRequest>,
) -> AppResult<ApiResponse<ReactionChanged>> {
    let target = parse_target(&req.target_type, req.target_id)?;
    let changed = state.reaction_service.like(&target, &user_id).await?;
    Ok(ApiResponse::ok(ReactionChanged { changed }))
}

/// Remove a like.
async fn unlike(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TargetRequest>,
) -> AppResult<ApiResponse<ReactionChanged>> {
    let target = parse_target(&req.target_type, req.target_id)?;
    let changed = state.reaction_service.unlike(&target, &user_id).await?;
    Ok(ApiResponse::ok(ReactionChanged { changed }))
}

/// Dislike a target, retracting any like.
async fn dislike(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TargetRequest>,
) -> AppResult<ApiResponse<ReactionChanged>> {
    let target = parse_target(&req.target_type, req.target_id)?;
    let changed = state.reaction_service.dislike(&target, &user_id).await?;
    Ok(ApiResponse::ok(ReactionChanged { changed }))
}

/// Remove a dislike.
async fn undislike(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TargetRequest>,
) -> AppResult<ApiResponse<ReactionChanged>> {
    let target = parse_target(&req.target_type, req.target_id)?;
    let changed = state.reaction_service.undislike(&target, &user_id).await?;
    Ok(ApiResponse::ok(ReactionChanged { changed }))
}

/// Save (bookmark) a target.
async fn save(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TargetRequest>,
) -> AppResult<ApiResponse<ReactionChanged>> {
    let target = parse_target(&req.target_type, req.target_id)?;
    let changed = state.reaction_service.save(&target, &user_id).await?;
    Ok(ApiResponse::ok(ReactionChanged { changed }))
}

/// Remove a save.
async fn unsave(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TargetRequest>,
) -> AppResult<ApiResponse<ReactionChanged>> {
    let target = parse_target(&req.target_type, req.target_id)?;
    let changed = state.reaction_service.unsave(&target, &user_id).await?;
    Ok(ApiResponse::ok(ReactionChanged { changed }))
}

/// Engagement summary for one target.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementSummary {
    pub likes: i64,
    pub dislikes: i64,
    pub saves: i64,
    pub followers: i64,
    pub comments: i64,
    /// Viewer membership flags; absent for anonymous requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer: Option<ViewerFlags>,
}

/// The requesting user's relation to the target.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerFlags {
    pub liked: bool,
    pub disliked: bool,
    pub saved: bool,
    pub followed: bool,
    pub commented: bool,
}

/// Counts plus viewer flags, the per-view payload of a content page.
async fn summary(
    MaybeAuthUser(user_id): MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<TargetRequest>,
) -> AppResult<ApiResponse<EngagementSummary>> {
    let target = parse_target(&req.target_type, req.target_id)?;

    let likes = state
        .reaction_service
        .count(ReactionKind::Like, &target)
        .await?;
    let dislikes = state
        .reaction_service
        .count(ReactionKind::Dislike, &target)
        .await?;
    let saves = state
        .reaction_service
        .count(ReactionKind::Save, &target)
        .await?;
    let followers = state.follow_service.followers_count(&target).await?;
    let comments = state.comment_service.comments_count(&target).await?;

    let viewer = match user_id {
        Some(user_id) => Some(ViewerFlags {
            liked: state
                .reaction_service
                .check(ReactionKind::Like, &target, &user_id)
                .await?,
            disliked: state
                .reaction_service
                .check(ReactionKind::Dislike, &target, &user_id)
                .await?,
            saved: state
                .reaction_service
                .check(ReactionKind::Save, &target, &user_id)
                .await?,
            followed: state.follow_service.is_following(&user_id, &target).await?,
            commented: state.comment_service.has_commented(&target, &user_id).await?,
        }),
        None => None,
    };

    Ok(ApiResponse::ok(EngagementSummary {
        likes,
        dislikes,
        saves,
        followers,
        comments,
        viewer,
    }))
}

/// List saved content request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSavedRequest {
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
}

const fn default_limit() -> u64 {
    10
}

/// Saved item response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedItemResponse {
    pub id: String,
    pub target_type: String,
    pub target_id: String,
    pub created_at: String,
}

/// List the requesting user's saved content.
async fn saved(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListSavedRequest>,
) -> AppResult<ApiResponse<Vec<SavedItemResponse>>> {
    let limit = req.limit.min(100);
    let rows = state
        .reaction_service
        .saved_by_user(&user_id, limit, req.until_id.as_deref())
        .await?;

    Ok(ApiResponse::ok(
        rows.into_iter()
            .map(|row| SavedItemResponse {
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
        .route("/like", post(like))
        .route("/unlike", post(unlike))
        .route("/dislike", post(dislike))
        .route("/undislike", post(undislike))
        .route("/save", post(save))
        .route("/unsave", post(unsave))
        .route("/summary", post(summary))
        .route("/saved", post(saved))
}
