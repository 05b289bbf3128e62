pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20260301_000001_accounts;
mod m20260301_000002_catalog;
mod m20260301_000003_recipes;
mod m20260301_000004_relations;
mod m20260301_000005_short_links;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_accounts::Migration),
            Box::new(m20260301_000002_catalog::Migration),
            Box::new(m20260301_000003_recipes::Migration),
            Box::new(m20260301_000004_relations::Migration),
            Box::new(m20260301_000005_short_links::Migration),
        ]
    }
}
