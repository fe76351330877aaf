//! Polymorphic reaction target references.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of entity that can receive a reaction.
///
/// Stored as a lowercase string column; the same string is the first segment
/// of counter-store keys and of composite recommendation IDs (`"article:42"`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    #[sea_orm(string_value = "article")]
    Article,
    #[sea_orm(string_value = "news")]
    News,
    #[sea_orm(string_value = "course")]
    Course,
    #[sea_orm(string_value = "lesson")]
    Lesson,
    #[sea_orm(string_value = "entry")]
    Entry,
    #[sea_orm(string_value = "comment")]
    Comment,
    #[sea_orm(string_value = "user")]
    User,
}

impl TargetKind {
    /// Lowercase name used in cache keys and composite IDs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::News => "news",
            Self::Course => "course",
            Self::Lesson => "lesson",
            Self::Entry => "entry",
            Self::Comment => "comment",
            Self::User => "user",
        }
    }

    /// Parse the lowercase name back into a kind.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "article" => Some(Self::Article),
            "news" => Some(Self::News),
            "course" => Some(Self::Course),
            "lesson" => Some(Self::Lesson),
            "entry" => Some(Self::Entry),
            "comment" => Some(Self::Comment),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed reference to a reactable entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Which entity kind is referenced.
    pub kind: TargetKind,
    /// Entity identifier within that kind.
    pub id: String,
}

impl Target {
    /// Create a target reference.
    pub fn new(kind: TargetKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// The composite `"{type}:{id}"` form used by the recommender.
    #[must_use]
    pub fn composite_id(&self) -> String {
        format!("{}:{}", self.kind, self.id)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            TargetKind::Article,
            TargetKind::News,
            TargetKind::Course,
            TargetKind::Lesson,
            TargetKind::Entry,
            TargetKind::Comment,
            TargetKind::User,
        ] {
            assert_eq!(TargetKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(TargetKind::parse("page"), None);
        assert_eq!(TargetKind::parse("Article"), None);
    }

    #[test]
    fn test_composite_id() {
        let target = Target::new(TargetKind::Article, "42");
        assert_eq!(target.composite_id(), "article:42");
    }
}
