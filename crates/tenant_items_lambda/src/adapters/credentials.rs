use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tenant_items_core::policy::PolicyDocument;

use crate::error::CredentialError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleRequest {
    pub role_arn: String,
    pub session_name: String,
    pub policy_json: String,
    pub duration: Duration,
}

#[derive(Clone, PartialEq, Eq)]
pub struct TemporaryCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for TemporaryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemporaryCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Credentials restricted to one tenant's keys, plus the policy they were
/// issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedSession {
    pub tenant_id: String,
    pub region: String,
    pub credentials: TemporaryCredentials,
    pub policy: PolicyDocument,
}

/// The identity service's "assume role with inline policy" primitive.
#[async_trait]
pub trait RoleAssumer: Send + Sync {
    async fn assume_role(
        &self,
        request: &AssumeRoleRequest,
    ) -> Result<TemporaryCredentials, CredentialError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_secrets() {
        let credentials = TemporaryCredentials {
            access_key_id: "ASIAEXAMPLE".to_string(),
            secret_access_key: "very-secret".to_string(),
            session_token: "token-value".to_string(),
            expires_at: Utc::now(),
        };
        let rendered = format!("{credentials:?}");

        assert!(rendered.contains("ASIAEXAMPLE"));
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("token-value"));
    }
}
