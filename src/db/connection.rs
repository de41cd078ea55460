use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

use crate::db::errors::{DatabaseError, Result};

/// Create the connection pool for the stamp store
///
/// Appends `sslmode=require` when the URL doesn't carry an sslmode of its own.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    let database_url = with_ssl_mode(database_url);

    info!("Creating database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&database_url)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("Failed to create pool: {}", e)))?;

    info!("Database connection pool created successfully");
    Ok(pool)
}

fn with_ssl_mode(database_url: &str) -> String {
    if database_url.contains("sslmode=") {
        return database_url.to_string();
    }
    let separator = if database_url.contains('?') { "&" } else { "?" };
    format!("{}{}sslmode=require", database_url, separator)
}

/// Execute a function with retry logic for handling transient errors
///
/// The operation must be safe to replay from scratch, i.e. it opens and
/// commits its own transaction.
pub async fn with_retry<F, Fut, T>(max_retries: u8, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt: u8 = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < max_retries => {
                warn!(
                    attempt = attempt,
                    max_retries = max_retries,
                    error = %e,
                    "Retryable error occurred, retrying..."
                );
                tokio::time::sleep(backoff(attempt)).await;
            }
            Err(e) if e.is_retryable() => {
                return Err(DatabaseError::RetryLimitExceeded { attempts: max_retries });
            }
            Err(e) => return Err(e),
        }
    }
}

/// Exponential backoff capped at one second, plus up to 50ms of jitter
fn backoff(attempt: u8) -> Duration {
    let base_ms = (50 * 2_u64.pow(u32::from(attempt.saturating_sub(1)))).min(1000);
    let jitter_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_nanos()) % 50)
        .unwrap_or(0);
    Duration::from_millis(base_ms + jitter_ms)
}
