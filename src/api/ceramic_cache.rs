use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::api::utils::is_valid_eth_address;
use crate::auth::AuthContext;
use crate::domain;
use crate::models::{
    CacheStampPayload, CachedStampResponse, DeleteStampPayload, DeleteStampResponse,
    GetStampResponse,
};

/// POST /ceramic-cache/stamps/bulk
/// Creates or replaces stamps for the authenticated address.
/// Returns 201 with one record per payload item, in payload order.
#[tracing::instrument(
    skip(state, auth, payload),
    fields(
        endpoint = "ceramic_cache_stamps_bulk",
        address = %auth.address,
        stamp_count = tracing::field::Empty
    )
)]
pub async fn ceramic_cache_add_stamps(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<Vec<CacheStampPayload>>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Vec<CachedStampResponse>>)> {
    let Json(payload) = payload?;
    tracing::Span::current().record("stamp_count", payload.len());
    info!("Processing ceramic-cache add stamps request");

    let written =
        domain::bulk_upsert_stamps(state.store.as_ref(), &auth.address, &payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(written.into_iter().map(CachedStampResponse::from).collect()),
    ))
}

/// DELETE /ceramic-cache/stamps/bulk
/// Deletes the listed stamps of the authenticated address.
/// 200 when at least one stamp was removed, 404 when none matched.
#[tracing::instrument(
    skip(state, auth, payload),
    fields(
        endpoint = "ceramic_cache_delete_stamps",
        address = %auth.address,
        stamp_count = tracing::field::Empty
    )
)]
pub async fn ceramic_cache_delete_stamps(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<Vec<DeleteStampPayload>>, JsonRejection>,
) -> ApiResult<Json<DeleteStampResponse>> {
    let Json(payload) = payload?;
    tracing::Span::current().record("stamp_count", payload.len());
    info!("Processing ceramic-cache delete stamps request");

    domain::bulk_delete_stamps(state.store.as_ref(), &auth.address, &payload).await?;

    Ok(Json(DeleteStampResponse::success()))
}

#[derive(Debug, Deserialize)]
pub struct StampQuery {
    pub address: String,
}

/// GET /ceramic-cache/stamp?address=0x...
#[tracing::instrument(skip(state, query), fields(endpoint = "ceramic_cache_get_stamps"))]
pub async fn ceramic_cache_get_stamps(
    State(state): State<AppState>,
    query: Result<Query<StampQuery>, QueryRejection>,
) -> ApiResult<Json<GetStampResponse>> {
    let Query(StampQuery { address }) = query?;

    if !is_valid_eth_address(&address) {
        return Err(ApiError::BadRequest(
            "Invalid Ethereum address format".to_string(),
        ));
    }

    let stamps = domain::get_stamps(state.store.as_ref(), &address).await?;

    info!(stamp_count = stamps.len(), "Retrieved stamps");

    Ok(Json(GetStampResponse {
        success: true,
        stamps: stamps.into_iter().map(CachedStampResponse::from).collect(),
    }))
}
