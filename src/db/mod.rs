pub mod ceramic_cache;
pub mod connection;
pub mod errors;
pub mod memory;

use async_trait::async_trait;

use crate::models::{CacheStampPayload, CachedStamp, DeleteStampPayload};

pub use ceramic_cache::PgStampStore;
pub use connection::*;
pub use errors::*;
pub use memory::MemoryStampStore;

/// Storage for cached stamps, keyed by (address, provider)
///
/// Every bulk method applies its whole batch in one transaction: either all
/// items are written or none are.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StampStore: Send + Sync {
    /// Insert or replace the stamp for each (address, item.provider), in order.
    /// Returns the row state written by each item, one entry per input item.
    async fn bulk_upsert(
        &self,
        address: &str,
        items: &[CacheStampPayload],
    ) -> Result<Vec<CachedStamp>>;

    /// Delete the rows matching each (item.address, item.provider) pair owned
    /// by `owner`. Returns the number of rows removed.
    async fn bulk_delete(&self, owner: &str, items: &[DeleteStampPayload]) -> Result<u64>;

    /// All stamps for an address, newest first
    async fn get_stamps(&self, address: &str) -> Result<Vec<CachedStamp>>;
}
