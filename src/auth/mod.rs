pub mod did;
pub mod jwt;

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::api::utils::is_valid_eth_address;

pub use did::{get_address_from_did, DidError};
pub use jwt::{extract_jwt_from_header, validate_jwt_and_extract_address, Claims};

/// Identity of the caller, resolved from the bearer token for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub address: String,
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());
        let token = extract_jwt_from_header(auth_header)?;
        let address = validate_jwt_and_extract_address(token, &state.jwt_secret)?;

        if !is_valid_eth_address(&address) {
            return Err(ApiError::Unauthorized(
                "Invalid Ethereum address format in JWT".to_string(),
            ));
        }

        tracing::info!(address = %address, "JWT validated, extracted address");
        Ok(Self { address })
    }
}
