pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod models;

// Re-export commonly used types
pub use api::server::{create_app, create_store, AppState};
pub use auth::{get_address_from_did, AuthContext, DidError};
pub use config::AppConfig;
pub use db::{DatabaseError, MemoryStampStore, PgStampStore, StampStore};
pub use domain::DomainError;
pub use models::{
    CacheStampPayload, CachedStamp, CachedStampResponse, DeleteStampPayload,
    MAX_BULK_CACHE_SIZE,
};
