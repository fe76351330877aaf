//! Feed and popularity endpoints.

use axum::{Json, Router, extract::State, routing::post};
use folio_common::AppResult;
use folio_core::{FeedItem, FeedQuery};
use folio_db::repositories::{PopularityRow, TrendingContentRow};
use serde::Deserialize;

use crate::{extractors::AuthUser, response::ApiResponse, state::AppState};

/// Feed request parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRequest {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

impl FeedRequest {
    fn query(&self) -> FeedQuery {
        FeedQuery {
            category: self.category.clone(),
            tag: self.tag.clone(),
        }
    }
}

/// Personalized feed for the requesting user.
async fn personalized(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FeedRequest>,
) -> AppResult<ApiResponse<Vec<FeedItem>>> {
    let limit = req.limit.min(100);
    let items = state
        .feed_service
        .personalized(&user_id, &req.query(), limit, req.offset)
        .await?;
    Ok(ApiResponse::ok(items))
}

/// Named non-personalized feed request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedFeedRequest {
    #[serde(default = "default_list")]
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

fn default_list() -> String {
    "latest".to_string()
}

/// Anonymous/cohort feed (`latest`, `popular`, ...).
async fn non_personalized(
    State(state): State<AppState>,
    Json(req): Json<NamedFeedRequest>,
) -> AppResult<ApiResponse<Vec<FeedItem>>> {
    let limit = req.limit.min(100);
    let query = FeedQuery {
        category: req.category.clone(),
        tag: req.tag.clone(),
    };
    let items = state
        .feed_service
        .non_personalized(&req.name, &query, limit, req.offset)
        .await?;
    Ok(ApiResponse::ok(items))
}

/// Trending categories.
async fn popular_categories(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<PopularityRow>>> {
    Ok(ApiResponse::ok(state.popularity_service.categories().await?))
}

/// Trending tags.
async fn popular_tags(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<PopularityRow>>> {
    Ok(ApiResponse::ok(state.popularity_service.tags().await?))
}

/// Most-liked content.
async fn popular_articles(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<TrendingContentRow>>> {
    Ok(ApiResponse::ok(state.popularity_service.articles().await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/personalized", post(personalized))
        .route("/non-personalized", post(non_personalized))
        .route("/popularity/categories", post(popular_categories))
        .route("/popularity/tags", post(popular_tags))
        .route("/popularity/articles", post(popular_articles))
}
