//! HTTP API handlers for katalog-media

pub mod health;
pub mod migration;
pub mod photos;

pub use health::health_routes;
pub use migration::migration_routes;
pub use photos::photo_routes;
