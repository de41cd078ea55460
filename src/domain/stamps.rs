use tracing::{info, warn};

use crate::db::StampStore;
use crate::models::{CacheStampPayload, CachedStamp, DeleteStampPayload, MAX_BULK_CACHE_SIZE};
use super::DomainError;

pub const TOO_MANY_STAMPS: &str = "You have submitted too many stamps.";
pub const NOTHING_TO_DELETE: &str = "Unable to find stamp to delete.";

/// Insert or update the stamps of `address`, one record per payload item
///
/// Batches over the size limit are rejected before the store is touched.
#[tracing::instrument(skip(store, payload), fields(address = %address, stamp_count = payload.len()))]
pub async fn bulk_upsert_stamps(
    store: &dyn StampStore,
    address: &str,
    payload: &[CacheStampPayload],
) -> Result<Vec<CachedStamp>, DomainError> {
    if payload.len() > MAX_BULK_CACHE_SIZE {
        warn!(limit = MAX_BULK_CACHE_SIZE, "Rejecting oversized stamp batch");
        return Err(DomainError::Validation(TOO_MANY_STAMPS.to_string()));
    }

    if let Some(item) = payload.iter().find(|item| !item.stamp.is_object()) {
        warn!(provider = %item.provider, "Rejecting stamp that is not a JSON object");
        return Err(DomainError::Validation(format!(
            "Stamp for provider '{}' must be a JSON object.",
            item.provider
        )));
    }

    let written = store.bulk_upsert(address, payload).await?;

    info!(written = written.len(), "Stamps upserted");
    Ok(written)
}

/// Delete the listed stamps owned by `address`
///
/// Items that match nothing are skipped; the call only fails when no item
/// matched at all.
#[tracing::instrument(skip(store, payload), fields(address = %address, stamp_count = payload.len()))]
pub async fn bulk_delete_stamps(
    store: &dyn StampStore,
    address: &str,
    payload: &[DeleteStampPayload],
) -> Result<u64, DomainError> {
    let foreign = payload
        .iter()
        .filter(|item| !item.address.eq_ignore_ascii_case(address))
        .count();
    if foreign > 0 {
        warn!(foreign, "Ignoring delete items for another address");
    }

    let deleted = store.bulk_delete(address, payload).await?;
    if deleted == 0 {
        return Err(DomainError::NotFound(NOTHING_TO_DELETE.to_string()));
    }

    info!(deleted, requested = payload.len(), "Stamps deleted");
    Ok(deleted)
}

pub async fn get_stamps(store: &dyn StampStore, address: &str) -> Result<Vec<CachedStamp>, DomainError> {
    Ok(store.get_stamps(&address.to_lowercase()).await?)
}
