//! API integration tests.
//!
//! These tests drive the real router over mock infrastructure: a sea-orm
//! `MockDatabase` for the ledger and the in-memory counter store for the
//! cache, with the recommender integration disabled.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use folio_api::{AppState, router as api_router};
use folio_common::{CounterStore, MemoryCounterStore, config::GorseConfig};
use folio_core::{
    CatalogService, CommentService, FeedService, FollowService, GorseClient, PopularityService,
    ReactionService,
};
use folio_db::entities::{article, reaction, target::TargetKind};
use folio_db::repositories::{
    CommentRepository, ContentRepository, FollowRepository, PopularityRepository,
    ReactionRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Gorse client pointing nowhere: every call yields `None`.
fn offline_gorse() -> Arc<GorseClient> {
    Arc::new(
        GorseClient::new(&GorseConfig {
            enabled: false,
            url: "http://localhost:8087".to_string(),
            api_key: None,
            timeout_secs: 1,
        })
        .unwrap(),
    )
}

/// Build the router over one mock connection shared by every repository.
fn test_router(db: DatabaseConnection) -> Router {
    let db = Arc::new(db);
    let counters: CounterStore = Arc::new(MemoryCounterStore::new());
    let gorse = offline_gorse();
    let content_repo = ContentRepository::new(Arc::clone(&db));

    let state = AppState {
        reaction_service: ReactionService::new(
            ReactionRepository::new(Arc::clone(&db)),
            counters.clone(),
        ),
        follow_service: FollowService::new(FollowRepository::new(Arc::clone(&db)), counters.clone()),
        comment_service: CommentService::new(CommentRepository::new(Arc::clone(&db)), counters),
        feed_service: FeedService::new(gorse.clone(), content_repo.clone()),
        popularity_service: PopularityService::new(
            PopularityRepository::new(Arc::clone(&db)),
            Arc::new(MemoryCounterStore::new()),
        ),
        catalog_service: CatalogService::new(gorse, content_repo),
    };

    api_router().with_state(state)
}

fn post_json(uri: &str, user_id: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json");
    if let Some(user_id) = user_id {
        builder = builder.header("x-user-id", user_id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn test_reaction(id: &str, user_id: &str, kind: reaction::ReactionKind) -> reaction::Model {
    reaction::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        target_type: TargetKind::Article,
        target_id: "42".to_string(),
        kind,
        created_at: Utc::now().into(),
    }
}

fn test_article(id: &str, title: &str) -> article::Model {
    article::Model {
        id: id.to_string(),
        title: title.to_string(),
        slug: title.to_lowercase().replace(' ', "-"),
        category: "engineering".to_string(),
        tags: serde_json::json!(["rust"]),
        published_at: Some(Utc::now().into()),
        created_at: Utc::now().into(),
    }
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = test_router(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nonexistent/endpoint")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_like_without_auth_returns_401() {
    let app = test_router(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(post_json(
            "/reactions/like",
            None,
            r#"{"targetType":"article","targetId":"42"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_like_records_reaction() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // dislike membership miss, like membership miss, insert
        .append_query_results([Vec::<reaction::Model>::new()])
        .append_query_results([Vec::<reaction::Model>::new()])
        .append_query_results([[test_reaction("r1", "user1", reaction::ReactionKind::Like)]])
        .into_connection();

    let app = test_router(db);

    let response = app
        .oneshot(post_json(
            "/reactions/like",
            Some("user1"),
            r#"{"targetType":"article","targetId":"42"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["changed"], true);
}

#[tokio::test]
async fn test_like_unknown_target_type_returns_400() {
    let app = test_router(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(post_json(
            "/reactions/like",
            Some("user1"),
            r#"{"targetType":"widget","targetId":"42"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_comment_reply_on_other_target_returns_404() {
    // Parent comment belongs to article 9, the reply addresses article 7.
    let parent = folio_db::entities::comment::Model {
        id: "c1".to_string(),
        user_id: "user1".to_string(),
        target_type: TargetKind::Article,
        target_id: "9".to_string(),
        content: "parent".to_string(),
        parent_id: None,
        created_at: Utc::now().into(),
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[parent]])
        .into_connection();

    let app = test_router(db);

    let response = app
        .oneshot(post_json(
            "/comments/create",
            Some("user2"),
            r#"{"targetType":"article","targetId":"7","content":"a reply","parentId":"c1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feed_falls_back_without_recommender() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[test_article("a1", "Fallback Article")]])
        .append_query_results([Vec::<folio_db::entities::news::Model>::new()])
        .into_connection();

    let app = test_router(db);

    // The recommender is down (disabled); the feed serves latest content
    // instead of erroring.
    let response = app
        .oneshot(post_json("/feed/non-personalized", None, "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"][0]["title"], "Fallback Article");
}

#[tokio::test]
async fn test_invalid_json_returns_client_error() {
    let app = test_router(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(post_json(
            "/reactions/like",
            Some("user1"),
            "invalid json",
        ))
        .await
        .unwrap();

    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}
