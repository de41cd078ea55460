// Domain layer - stamp cache rules with no HTTP concerns

pub mod stamps;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<crate::db::DatabaseError> for DomainError {
    fn from(e: crate::db::DatabaseError) -> Self {
        DomainError::Database(e.to_string())
    }
}

pub use stamps::{bulk_delete_stamps, bulk_upsert_stamps, get_stamps};
