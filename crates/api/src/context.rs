//! Per-request values placed in request extensions by middleware.

use userhub_auth::Principal;

/// Correlation id for a request.
///
/// Set by the `request_id` middleware and echoed in the `x-request-id` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// A fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RequestId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authenticated caller for a request (inserted by the `auth` middleware).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext(Principal);

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self(principal)
    }

    pub fn principal(&self) -> &Principal {
        &self.0
    }
}
