//! API key authentication for the HTTP surface.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{AuthError, AuthRequest, Authenticator, Principal};

/// Principal id assigned to callers presenting the shared API key.
pub const API_KEY_PRINCIPAL: &str = "api_key_user";

/// Authenticator that validates requests against a configured API key.
///
/// Accepts the key in either:
/// - `Authorization: Bearer <key>` header
/// - `X-API-Key: <key>` header
pub struct ApiKeyAuthenticator {
    expected_digest: [u8; 32],
}

impl ApiKeyAuthenticator {
    pub fn new(api_key: impl AsRef<str>) -> Self {
        Self {
            expected_digest: Sha256::digest(api_key.as_ref().as_bytes()).into(),
        }
    }

    fn extract_key(request: &AuthRequest) -> Option<&str> {
        if let Some(header) = request.headers.get("authorization") {
            let key = header
                .strip_prefix("Bearer ")
                .or_else(|| header.strip_prefix("bearer "));
            if key.is_some() {
                return key;
            }
        }

        request.headers.get("x-api-key").map(String::as_str)
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Principal, AuthError> {
        let provided = Self::extract_key(request).ok_or(AuthError::NotAuthenticated)?;

        // Digests have equal length, so the fold runs over every byte.
        let provided_digest: [u8; 32] = Sha256::digest(provided.as_bytes()).into();
        let diff = provided_digest
            .iter()
            .zip(self.expected_digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));

        if diff == 0 {
            Ok(Principal::new(API_KEY_PRINCIPAL, self.method_name()))
        } else {
            Err(AuthError::InvalidCredentials("Invalid API key".to_string()))
        }
    }

    fn method_name(&self) -> &'static str {
        "api_key"
    }
}
