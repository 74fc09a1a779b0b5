pub mod config;
pub mod domain;
pub mod errors;
pub mod recommendations;

pub use domain::item::{Item, ItemId, Rating, PLACEHOLDER_IMAGE_URL};
pub use domain::order::{Order, OrderId, OrderLine};
pub use domain::user::UserId;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use recommendations::{
    CatalogStore, Recommendation, RecommendationEngine, RecommendationOutcome, SessionContext,
};
