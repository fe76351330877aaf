//! Folio server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use folio_api::{AppState, router as api_router};
use folio_common::{Config, CounterStore, RedisCounterStore};
use folio_core::{
    CatalogService, CommentService, FeedService, FollowService, GorseClient, PopularityService,
    ReactionService,
};
use folio_db::repositories::{
    CommentRepository, ContentRepository, FollowRepository, PopularityRepository,
    ReactionRepository,
};
use fred::prelude::*;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting folio server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = folio_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    folio_db::migrate(&db).await?;
    info!("Migrations completed");

    // Connect the counter store to Redis
    info!("Connecting to Redis...");
    let redis_config = fred::types::config::Config::from_url(&config.redis.url)?;
    let redis_client = Client::new(redis_config, None, None, None);
    redis_client.connect();
    redis_client.wait_for_connect().await?;
    let counters: CounterStore = Arc::new(RedisCounterStore::new(
        Arc::new(redis_client),
        config.redis.prefix.clone(),
    ));
    info!("Connected to Redis counter store");

    // Recommendation engine client
    let gorse = Arc::new(GorseClient::new(&config.gorse)?);
    if config.gorse.enabled {
        info!(url = %config.gorse.url, "Recommender integration enabled");
    } else {
        info!("Recommender integration disabled, feeds fall back to latest content");
    }

    // Initialize repositories
    let db = Arc::new(db);
    let reaction_repo = ReactionRepository::new(Arc::clone(&db));
    let follow_repo = FollowRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let content_repo = ContentRepository::new(Arc::clone(&db));
    let popularity_repo = PopularityRepository::new(Arc::clone(&db));

    // Initialize services
    let reaction_service = if config.gorse.enabled {
        ReactionService::with_gorse(reaction_repo, counters.clone(), gorse.clone())
    } else {
        ReactionService::new(reaction_repo, counters.clone())
    };
    let follow_service = FollowService::new(follow_repo, counters.clone());
    let comment_service = CommentService::new(comment_repo, counters.clone());
    let feed_service = FeedService::new(gorse.clone(), content_repo.clone());
    let popularity_service = PopularityService::new(popularity_repo, counters);
    let catalog_service = CatalogService::new(gorse, content_repo);

    // Create app state
    let state = AppState {
        reaction_service,
        follow_service,
        comment_service,
        feed_service,
        popularity_service,
        catalog_service,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
