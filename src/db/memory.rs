use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

use crate::db::errors::Result;
use crate::db::StampStore;
use crate::models::{CacheStampPayload, CachedStamp, DeleteStampPayload};

#[derive(Default)]
struct Inner {
    next_id: i64,
    // keyed by (lowercased address, provider)
    rows: HashMap<(String, String), CachedStamp>,
}

/// In-process stamp store used when no database is configured
///
/// A batch holds the lock for its whole duration, which gives the same
/// all-or-nothing visibility as a database transaction.
#[derive(Default)]
pub struct MemoryStampStore {
    inner: Mutex<Inner>,
}

impl MemoryStampStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StampStore for MemoryStampStore {
    async fn bulk_upsert(
        &self,
        address: &str,
        items: &[CacheStampPayload],
    ) -> Result<Vec<CachedStamp>> {
        let address = address.to_lowercase();
        let mut inner = self.inner.lock().await;

        let mut written = Vec::with_capacity(items.len());
        for item in items {
            let now = Utc::now();
            let key = (address.clone(), item.provider.clone());

            let row = match inner.rows.get_mut(&key) {
                Some(existing) => {
                    existing.stamp = item.stamp.clone();
                    existing.updated_at = now;
                    existing.clone()
                }
                None => {
                    inner.next_id += 1;
                    let row = CachedStamp {
                        id: inner.next_id,
                        address: address.clone(),
                        provider: item.provider.clone(),
                        stamp: item.stamp.clone(),
                        created_at: now,
                        updated_at: now,
                    };
                    inner.rows.insert(key, row.clone());
                    row
                }
            };
            written.push(row);
        }

        debug!(address = %address, count = written.len(), "Upserted stamps in memory");
        Ok(written)
    }

    async fn bulk_delete(&self, owner: &str, items: &[DeleteStampPayload]) -> Result<u64> {
        let owner = owner.to_lowercase();
        let mut inner = self.inner.lock().await;

        let mut deleted = 0;
        for item in items {
            let address = item.address.to_lowercase();
            if address != owner {
                continue;
            }
            if inner.rows.remove(&(address, item.provider.clone())).is_some() {
                deleted += 1;
            }
        }

        debug!(owner = %owner, deleted, "Deleted stamps in memory");
        Ok(deleted)
    }

    async fn get_stamps(&self, address: &str) -> Result<Vec<CachedStamp>> {
        let address = address.to_lowercase();
        let inner = self.inner.lock().await;

        let mut stamps: Vec<CachedStamp> = inner
            .rows
            .values()
            .filter(|row| row.address == address)
            .cloned()
            .collect();
        stamps.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(stamps)
    }
}
