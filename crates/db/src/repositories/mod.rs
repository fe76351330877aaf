//! Database repositories.

pub mod comment;
pub mod content;
pub mod follow;
pub mod popularity;
pub mod reaction;

pub use comment::CommentRepository;
pub use content::ContentRepository;
pub use follow::FollowRepository;
pub use popularity::{PopularityRepository, PopularityRow, TrendingContentRow};
pub use reaction::ReactionRepository;
