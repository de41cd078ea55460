use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, info};

use crate::db::connection::with_retry;
use crate::db::errors::{DatabaseError, Result};
use crate::db::StampStore;
use crate::models::{CacheStampPayload, CachedStamp, DeleteStampPayload};

const MAX_RETRIES: u8 = 3;

/// Schema for the stamp cache table, applied idempotently at startup
const SCHEMA: &str = include_str!("../../migrations/0001_ceramic_cache_stamp.sql");

/// Postgres-backed stamp store
#[derive(Clone)]
pub struct PgStampStore {
    pool: PgPool,
}

impl PgStampStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the stamp table and its unique index if they don't exist yet
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::QueryError)?;
        info!("Stamp cache schema ready");
        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionError(format!("Failed to start transaction: {}", e)))
    }

    async fn try_bulk_upsert(
        &self,
        address: &str,
        items: &[CacheStampPayload],
    ) -> Result<Vec<CachedStamp>> {
        let mut tx = self.begin().await?;

        let mut written = Vec::with_capacity(items.len());
        for item in items {
            written.push(upsert_stamp(address, item, &mut tx).await?);
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::TransactionError(format!("Failed to commit transaction: {}", e)))?;

        Ok(written)
    }

    async fn try_bulk_delete(&self, owner: &str, items: &[DeleteStampPayload]) -> Result<u64> {
        let mut tx = self.begin().await?;

        let mut deleted = 0;
        for item in items {
            deleted += delete_stamp(owner, item, &mut tx).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::TransactionError(format!("Failed to commit transaction: {}", e)))?;

        Ok(deleted)
    }
}

#[async_trait]
impl StampStore for PgStampStore {
    #[tracing::instrument(
        skip(self, items),
        fields(address = %address, stamp_count = items.len())
    )]
    async fn bulk_upsert(
        &self,
        address: &str,
        items: &[CacheStampPayload],
    ) -> Result<Vec<CachedStamp>> {
        debug!("Upserting {} stamps", items.len());

        let written = with_retry(MAX_RETRIES, || self.try_bulk_upsert(address, items)).await?;

        info!("Upserted {} stamps", written.len());
        Ok(written)
    }

    #[tracing::instrument(
        skip(self, items),
        fields(owner = %owner, stamp_count = items.len())
    )]
    async fn bulk_delete(&self, owner: &str, items: &[DeleteStampPayload]) -> Result<u64> {
        debug!("Deleting up to {} stamps", items.len());

        let deleted = with_retry(MAX_RETRIES, || self.try_bulk_delete(owner, items)).await?;

        info!("Deleted {} stamps", deleted);
        Ok(deleted)
    }

    #[tracing::instrument(skip(self), fields(address = %address))]
    async fn get_stamps(&self, address: &str) -> Result<Vec<CachedStamp>> {
        let rows = sqlx::query(
            r#"
            SELECT id, address, provider, stamp, created_at, updated_at
            FROM ceramic_cache_stamp
            WHERE address = LOWER($1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(address)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::QueryError)?;

        let stamps: Vec<CachedStamp> = rows.iter().map(cached_stamp_from_row).collect();

        info!("Found {} stamps in cache for address {}", stamps.len(), address);
        Ok(stamps)
    }
}

/// Insert a stamp or replace the payload of the existing (address, provider) row
async fn upsert_stamp(
    address: &str,
    item: &CacheStampPayload,
    tx: &mut Transaction<'_, Postgres>,
) -> Result<CachedStamp> {
    let row = sqlx::query(
        r#"
        INSERT INTO ceramic_cache_stamp (address, provider, stamp, created_at, updated_at)
        VALUES (LOWER($1), $2, $3, NOW(), NOW())
        ON CONFLICT (address, provider)
        DO UPDATE SET
            stamp = EXCLUDED.stamp,
            updated_at = NOW()
        RETURNING id, address, provider, stamp, created_at, updated_at
        "#,
    )
    .bind(address)
    .bind(&item.provider)
    .bind(&item.stamp)
    .fetch_one(&mut **tx)
    .await
    .map_err(DatabaseError::QueryError)?;

    Ok(cached_stamp_from_row(&row))
}

/// Delete the row for (item.address, item.provider) if it belongs to `owner`
async fn delete_stamp(
    owner: &str,
    item: &DeleteStampPayload,
    tx: &mut Transaction<'_, Postgres>,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM ceramic_cache_stamp
        WHERE address = LOWER($1)
          AND address = LOWER($2)
          AND provider = $3
        "#,
    )
    .bind(owner)
    .bind(&item.address)
    .bind(&item.provider)
    .execute(&mut **tx)
    .await
    .map_err(DatabaseError::QueryError)?;

    Ok(result.rows_affected())
}

fn cached_stamp_from_row(row: &PgRow) -> CachedStamp {
    CachedStamp {
        id: row.get("id"),
        address: row.get("address"),
        provider: row.get("provider"),
        stamp: row.get("stamp"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ADDRESS: &str = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045";

    fn payload(provider: &str, stamp: serde_json::Value) -> CacheStampPayload {
        CacheStampPayload {
            provider: provider.to_string(),
            stamp,
        }
    }

    // These tests need a Postgres instance behind DATABASE_URL
    #[sqlx::test]
    #[ignore]
    async fn test_upsert_replaces_payload(pool: PgPool) -> sqlx::Result<()> {
        let store = PgStampStore::new(pool);
        store.ensure_schema().await.unwrap();

        let created = store
            .bulk_upsert(ADDRESS, &[payload("Google", json!({"v": 1}))])
            .await
            .unwrap();
        let updated = store
            .bulk_upsert(ADDRESS, &[payload("Google", json!({"v": 2}))])
            .await
            .unwrap();

        assert_eq!(created[0].id, updated[0].id);
        assert_eq!(updated[0].stamp, json!({"v": 2}));
        assert_eq!(store.get_stamps(ADDRESS).await.unwrap().len(), 1);
        Ok(())
    }

    #[sqlx::test]
    #[ignore]
    async fn test_delete_counts_only_matches(pool: PgPool) -> sqlx::Result<()> {
        let store = PgStampStore::new(pool);
        store.ensure_schema().await.unwrap();

        store
            .bulk_upsert(ADDRESS, &[payload("Google", json!({})), payload("Github", json!({}))])
            .await
            .unwrap();

        let items = vec![
            DeleteStampPayload {
                address: ADDRESS.to_uppercase().replace("0X", "0x"),
                provider: "Google".to_string(),
            },
            DeleteStampPayload {
                address: ADDRESS.to_string(),
                provider: "not-a-provider".to_string(),
            },
        ];

        assert_eq!(store.bulk_delete(ADDRESS, &items).await.unwrap(), 1);
        assert_eq!(store.get_stamps(ADDRESS).await.unwrap().len(), 1);
        Ok(())
    }
}
