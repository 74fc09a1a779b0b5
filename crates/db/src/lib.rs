pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{DemoCatalog, DemoUser, SeedResult, VerificationResult, DEMO_USERS};
pub use repositories::{
    CatalogRepository, InMemoryCatalogStore, RepositoryError, SqlCatalogStore,
};
