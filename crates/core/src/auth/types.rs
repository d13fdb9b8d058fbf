use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

/// Marker recorded in audit entries when no principal is known.
pub const ANONYMOUS_PRINCIPAL: &str = "anonymous";

/// Request information for authentication
#[derive(Debug, Clone)]
pub struct AuthRequest {
    /// Header names are expected in lower case.
    pub headers: HashMap<String, String>,
    pub source_ip: IpAddr,
}

/// The authenticated caller on whose behalf conversions run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    /// Authentication method that produced this principal.
    pub method: String,
}

impl Principal {
    pub fn new(id: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(ANONYMOUS_PRINCIPAL, "none")
    }

    pub fn is_anonymous(&self) -> bool {
        self.id == ANONYMOUS_PRINCIPAL
    }
}
