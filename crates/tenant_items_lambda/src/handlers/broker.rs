use std::sync::Arc;
use std::time::Duration;

use tenant_items_core::policy::build_policy;
use tracing::{info, warn};

use crate::adapters::credentials::{AssumeRoleRequest, RoleAssumer, ScopedSession};
use crate::config::ServiceConfig;
use crate::error::CredentialError;

/// Exchanges a tenant ID for credentials that can only touch that tenant's
/// keys. A fresh session is issued on every call; nothing is cached.
pub struct CredentialBroker {
    assumer: Arc<dyn RoleAssumer>,
    role_arn: String,
    session_name: String,
    table_arn: String,
    region: String,
    duration: Duration,
}

impl CredentialBroker {
    pub fn new(assumer: Arc<dyn RoleAssumer>, config: &ServiceConfig) -> Self {
        Self {
            assumer,
            role_arn: config.assume_role_arn.clone(),
            session_name: config.session_name.clone(),
            table_arn: config.table_arn.clone(),
            region: config.region.clone(),
            duration: config.credential_duration,
        }
    }

    pub async fn scope_to_tenant(&self, tenant_id: &str) -> Result<ScopedSession, CredentialError> {
        let policy = build_policy(tenant_id, &self.table_arn);
        let request = AssumeRoleRequest {
            role_arn: self.role_arn.clone(),
            session_name: self.session_name.clone(),
            policy_json: policy.to_json(),
            duration: self.duration,
        };

        match self.assumer.assume_role(&request).await {
            Ok(credentials) => {
                info!(
                    component = "credential_broker",
                    event = "session_scoped",
                    tenant_id,
                    policy_fingerprint = %policy.fingerprint(),
                    expires_at = %credentials.expires_at.to_rfc3339(),
                );
                Ok(ScopedSession {
                    tenant_id: tenant_id.to_string(),
                    region: self.region.clone(),
                    credentials,
                    policy,
                })
            }
            Err(error) => {
                warn!(
                    component = "credential_broker",
                    event = "session_scoping_failed",
                    tenant_id,
                    role_arn = %self.role_arn,
                    error = %error,
                );
                Err(error)
            }
        }
    }
}
