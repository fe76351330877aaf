//! Reaction repository.

use std::sync::Arc;

use crate::entities::{Reaction, reaction, target::Target};
use folio_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Reaction repository for ledger operations.
#[derive(Clone)]
pub struct ReactionRepository {
    db: Arc<DatabaseConnection>,
}

impl ReactionRepository {
    /// Create a new reaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append a reaction row to the ledger.
    pub async fn create(&self, model: reaction::ActiveModel) -> AppResult<reaction::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a user's reaction of one kind on a target.
    ///
    /// Returns how many rows were removed (0 when the user had no such
    /// reaction).
    pub async fn delete_by_user_and_target(
        &self,
        user_id: &str,
        target: &Target,
        kind: reaction::ReactionKind,
    ) -> AppResult<u64> {
        let result = Reaction::delete_many()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::TargetType.eq(target.kind))
            .filter(reaction::Column::TargetId.eq(target.id.as_str()))
            .filter(reaction::Column::Kind.eq(kind))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Check whether a user has a reaction of one kind on a target.
    pub async fn exists(
        &self,
        user_id: &str,
        target: &Target,
        kind: reaction::ReactionKind,
    ) -> AppResult<bool> {
        Ok(Reaction::find()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::TargetType.eq(target.kind))
            .filter(reaction::Column::TargetId.eq(target.id.as_str()))
            .filter(reaction::Column::Kind.eq(kind))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .is_some())
    }

    /// Count reactions of one kind on a target.
    pub async fn count_by_target(
        &self,
        target: &Target,
        kind: reaction::ReactionKind,
    ) -> AppResult<u64> {
        Reaction::find()
            .filter(reaction::Column::TargetType.eq(target.kind))
            .filter(reaction::Column::TargetId.eq(target.id.as_str()))
            .filter(reaction::Column::Kind.eq(kind))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user's reactions of one kind, newest first (keyset-paginated).
    pub async fn find_by_user(
        &self,
        user_id: &str,
        kind: reaction::ReactionKind,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<reaction::Model>> {
        let mut query = Reaction::find()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::Kind.eq(kind))
            .order_by_desc(reaction::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(reaction::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
