pub mod models;
pub mod repository;
pub mod source;

pub use models::{Cart, CartLine, Product, TierOrder, TierUpdate};
pub use repository::{CartRepository, ProductRepository, TierRepository};
pub use source::active_tiers_or_empty;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Rejected: {0}")]
    Rejected(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
