pub mod app_config;
pub mod database;
pub mod memory;
pub mod seed;
pub mod tier_repo;
pub mod product_repo;
pub mod cart_repo;

pub use database::DbClient;
pub use memory::{InMemoryCartRepository, InMemoryProductRepository, InMemoryTierRepository};
pub use tier_repo::PgTierRepository;
pub use product_repo::PgProductRepository;
pub use cart_repo::PgCartRepository;
