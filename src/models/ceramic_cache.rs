use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of stamps accepted by a single bulk create/update request
pub const MAX_BULK_CACHE_SIZE: usize = 100;

/// One item of a bulk create/update request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStampPayload {
    pub provider: String,
    pub stamp: Value,
}

/// One item of a bulk delete request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteStampPayload {
    pub address: String,
    pub provider: String,
}

/// A stamp as stored in the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedStamp {
    pub id: i64,
    pub address: String,
    pub provider: String,
    pub stamp: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Record shape returned by the bulk and listing endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedStampResponse {
    pub id: i64,
    pub address: String,
    pub provider: String,
    pub stamp: Value,
}

impl From<CachedStamp> for CachedStampResponse {
    fn from(stamp: CachedStamp) -> Self {
        Self {
            id: stamp.id,
            address: stamp.address,
            provider: stamp.provider,
            stamp: stamp.stamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetStampResponse {
    pub success: bool,
    pub stamps: Vec<CachedStampResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteStampResponse {
    pub status: String,
}

impl DeleteStampResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}
