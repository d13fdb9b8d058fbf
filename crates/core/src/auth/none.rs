use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Principal};

/// Authenticator that accepts every request as the anonymous principal.
/// Must be selected explicitly in the configuration.
#[derive(Debug, Default)]
pub struct NoneAuthenticator;

impl NoneAuthenticator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Authenticator for NoneAuthenticator {
    async fn authenticate(&self, _request: &AuthRequest) -> Result<Principal, AuthError> {
        Ok(Principal::anonymous())
    }

    fn method_name(&self) -> &'static str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::IpAddr;

    #[tokio::test]
    async fn test_none_authenticator_returns_anonymous() {
        let auth = NoneAuthenticator::new();
        let request = AuthRequest {
            headers: HashMap::new(),
            source_ip: "127.0.0.1".parse::<IpAddr>().unwrap(),
        };

        let principal = auth.authenticate(&request).await.unwrap();
        assert!(principal.is_anonymous());
        assert_eq!(auth.method_name(), "none");
    }
}
