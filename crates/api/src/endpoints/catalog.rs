//! Recommender catalog endpoints.
//!
//! Invoked by the back office when content or accounts change, keeping the
//! recommender's catalogs in step with the local tables.

use axum::{Json, Router, extract::State, routing::post};
use folio_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{
    endpoints::parse_target, extractors::AuthUser, response::ApiResponse, state::AppState,
};

/// Content sync request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncItemRequest {
    pub target_type: String,
    pub target_id: String,
}

/// Outcome of a best-effort catalog call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    /// Whether the recommender accepted the call.
    pub synced: bool,
}

/// Push one content item into the recommender catalog.
async fn sync_item(
    AuthUser(_user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SyncItemRequest>,
) -> AppResult<ApiResponse<SyncOutcome>> {
    let synced = match req.target_type.as_str() {
        "article" => state.catalog_service.sync_article(&req.target_id).await?,
        "news" => state.catalog_service.sync_news(&req.target_id).await?,
        other => {
            return Err(AppError::BadRequest(format!(
                "Unsupported catalog content type: {other}"
            )));
        }
    };

    Ok(ApiResponse::ok(SyncOutcome { synced }))
}

/// Remove one content item from the recommender catalog.
async fn remove_item(
    AuthUser(_user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SyncItemRequest>,
) -> AppResult<ApiResponse<SyncOutcome>> {
    let target = parse_target(&req.target_type, req.target_id)?;
    let synced = state.catalog_service.remove(&target).await;
    Ok(ApiResponse::ok(SyncOutcome { synced }))
}

/// User registration request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    /// Interest labels seeding the user's profile.
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Register the requesting user with the recommender.
async fn register_user(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<RegisterUserRequest>,
) -> AppResult<ApiResponse<SyncOutcome>> {
    let synced = state
        .catalog_service
        .register_user(&user_id, req.labels)
        .await;
    Ok(ApiResponse::ok(SyncOutcome { synced }))
}

/// Remove the requesting user from the recommender.
async fn remove_user(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<SyncOutcome>> {
    let synced = state.catalog_service.remove_user(&user_id).await;
    Ok(ApiResponse::ok(SyncOutcome { synced }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items/sync", post(sync_item))
        .route("/items/remove", post(remove_item))
        .route("/users/register", post(register_user))
        .route("/users/remove", post(remove_user))
}
