use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::auth::did::get_address_from_did;

/// JWT claims issued to a wallet after sign-in.
/// The `did` claim has the form did:pkh:eip155:1:0xADDRESS
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub did: String,
    pub exp: i64,
}

/// Validate an HS256 JWT and return the lowercased address from its DID
pub fn validate_jwt_and_extract_address(token: &str, secret: &str) -> Result<String, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_aud = false;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::warn!("JWT validation failed: {}", e);
        ApiError::Unauthorized(format!("Invalid JWT token: {}", e))
    })?;

    let address = get_address_from_did(&token_data.claims.did).map_err(|e| {
        tracing::warn!(did = %token_data.claims.did, "Rejected DID: {}", e);
        ApiError::Unauthorized(format!("Invalid DID in JWT: {}", e))
    })?;

    Ok(address.to_lowercase())
}

/// Extract JWT token from Authorization header
/// Expected format: "Bearer <token>"
pub fn extract_jwt_from_header(auth_header: Option<&str>) -> Result<&str, ApiError> {
    let auth_value = auth_header.ok_or_else(|| {
        ApiError::Unauthorized("Missing Authorization header".to_string())
    })?;

    let token = auth_value.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::Unauthorized(
            "Invalid Authorization header format, expected 'Bearer <token>'".to_string(),
        )
    })?;

    if token.trim().is_empty() {
        return Err(ApiError::Unauthorized("Empty bearer token".to_string()));
    }
    Ok(token.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token_for(did: &str, exp: i64, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &Claims {
                did: did.to_string(),
                exp,
            },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_one_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_extract_jwt_from_header_valid() {
        let header = "Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.test.token";
        assert_eq!(
            extract_jwt_from_header(Some(header)).unwrap(),
            "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.test.token"
        );
    }

    #[test]
    fn test_extract_jwt_from_header_missing() {
        match extract_jwt_from_header(None) {
            Err(ApiError::Unauthorized(msg)) => {
                assert!(msg.contains("Missing Authorization header"));
            }
            _ => panic!("Expected Unauthorized error"),
        }
    }

    #[test]
    fn test_extract_jwt_from_header_invalid_format() {
        match extract_jwt_from_header(Some("Token abc")) {
            Err(ApiError::Unauthorized(msg)) => {
                assert!(msg.contains("Invalid Authorization header format"));
            }
            _ => panic!("Expected Unauthorized error"),
        }
    }

    #[test]
    fn test_extract_jwt_from_header_no_token() {
        assert!(matches!(
            extract_jwt_from_header(Some("Bearer ")),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_valid_token_yields_lowercased_address() {
        let token = token_for(
            "did:pkh:eip155:1:0xD8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
            in_one_hour(),
            SECRET,
        );
        assert_eq!(
            validate_jwt_and_extract_address(&token, SECRET).unwrap(),
            "0xd8da6bf26964af9d7eed9e03e53415d37aa96045"
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = token_for("did:pkh:eip155:1:0xabc", in_one_hour(), "other-secret");
        assert!(matches!(
            validate_jwt_and_extract_address(&token, SECRET),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = token_for("did:pkh:eip155:1:0xabc", chrono::Utc::now().timestamp() - 3600, SECRET);
        assert!(matches!(
            validate_jwt_and_extract_address(&token, SECRET),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_malformed_did_rejected() {
        let token = token_for("did:pkh:eip155:1:", in_one_hour(), SECRET);
        assert!(matches!(
            validate_jwt_and_extract_address(&token, SECRET),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
