//! Business logic services.

#![allow(missing_docs)]

pub mod catalog;
pub mod comment;
pub mod feed;
pub mod follow;
pub mod gorse;
pub mod popularity;
pub mod reaction;

pub use catalog::CatalogService;
pub use comment::CommentService;
pub use feed::{ContentResolver, FeedItem, FeedQuery, FeedService};
pub use follow::FollowService;
pub use gorse::{Feedback, GorseClient, GorseItem, GorseUser};
pub use popularity::PopularityService;
pub use reaction::ReactionService;
