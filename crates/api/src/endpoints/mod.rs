//! API endpoints.

mod catalog;
mod comments;
mod feed;
mod follows;
mod reactions;

use axum::Router;
use folio_common::{AppError, AppResult};
use folio_db::entities::target::{Target, TargetKind};

use crate::state::AppState;

/// Parse a wire-format target reference.
fn parse_target(target_type: &str, target_id: String) -> AppResult<Target> {
    let kind = TargetKind::parse(target_type)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown target type: {target_type}")))?;

    if target_id.is_empty() {
        return Err(AppError::BadRequest("Target ID cannot be empty".to_string()));
    }

    Ok(Target::new(kind, target_id))
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/reactions", reactions::router())
        .nest("/follows", follows::router())
        .nest("/comments", comments::router())
        .nest("/feed", feed::router())
        .nest("/catalog", catalog::router())
}
