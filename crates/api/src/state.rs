//! Application state shared by all handlers.

#![allow(missing_docs)]

use folio_core::{
    CatalogService, CommentService, FeedService, FollowService, PopularityService, ReactionService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub reaction_service: ReactionService,
    pub follow_service: FollowService,
    pub comment_service: CommentService,
    pub feed_service: FeedService,
    pub popularity_service: PopularityService,
    pub catalog_service: CatalogService,
}
