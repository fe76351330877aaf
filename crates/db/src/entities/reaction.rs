//! Reaction entity (likes, dislikes and saves on content).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::target::TargetKind;

/// Reaction kinds sharing the ledger table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    #[sea_orm(string_value = "like")]
    Like,
    #[sea_orm(string_value = "dislike")]
    Dislike,
    #[sea_orm(string_value = "save")]
    Save,
}

impl ReactionKind {
    /// Counter-store metric holding the aggregate count for this kind.
    #[must_use]
    pub const fn count_metric(self) -> &'static str {
        match self {
            Self::Like => "likes",
            Self::Dislike => "dislikes",
            Self::Save => "saves",
        }
    }

    /// Counter-store flag recording per-user membership for this kind.
    #[must_use]
    pub const fn membership_flag(self) -> &'static str {
        match self {
            Self::Like => "liked",
            Self::Dislike => "disliked",
            Self::Save => "saved",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reaction")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user who reacted
    pub user_id: String,

    /// Kind of the reacted-to entity
    pub target_type: TargetKind,

    /// Entity identifier within that kind
    pub target_id: String,

    /// Which reaction this row records
    pub kind: ReactionKind,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_distinct_from_flags() {
        for kind in [ReactionKind::Like, ReactionKind::Dislike, ReactionKind::Save] {
            assert_ne!(kind.count_metric(), kind.membership_flag());
        }
    }
}
