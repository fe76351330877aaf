//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250415_000001_create_article_table;
mod m20250415_000002_create_news_table;
mod m20250415_000003_create_reaction_table;
mod m20250415_000004_create_follow_table;
mod m20250415_000005_create_comment_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250415_000001_create_article_table::Migration),
            Box::new(m20250415_000002_create_news_table::Migration),
            Box::new(m20250415_000003_create_reaction_table::Migration),
            Box::new(m20250415_000004_create_follow_table::Migration),
            Box::new(m20250415_000005_create_comment_table::Migration),
        ]
    }
}
