use async_trait::async_trait;
use aws_sdk_sts::error::DisplayErrorContext;
use chrono::{DateTime, Utc};

use crate::adapters::credentials::{AssumeRoleRequest, RoleAssumer, TemporaryCredentials};
use crate::error::CredentialError;

pub struct StsRoleAssumer {
    client: aws_sdk_sts::Client,
}

impl StsRoleAssumer {
    pub fn new(client: aws_sdk_sts::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RoleAssumer for StsRoleAssumer {
    async fn assume_role(
        &self,
        request: &AssumeRoleRequest,
    ) -> Result<TemporaryCredentials, CredentialError> {
        let duration_seconds = i32::try_from(request.duration.as_secs()).map_err(|_| {
            CredentialError::new(format!(
                "session duration {:?} is out of range",
                request.duration
            ))
        })?;

        let output = self
            .client
            .assume_role()
            .role_arn(&request.role_arn)
            .role_session_name(&request.session_name)
            .policy(&request.policy_json)
            .duration_seconds(duration_seconds)
            .send()
            .await
            .map_err(|error| {
                CredentialError::new(format!(
                    "failed to assume role {}: {}",
                    request.role_arn,
                    DisplayErrorContext(&error)
                ))
            })?;

        let Some(credentials) = output.credentials() else {
            return Err(CredentialError::new(
                "AssumeRole response did not include credentials",
            ));
        };

        let expiration = credentials.expiration();
        let expires_at = DateTime::<Utc>::from_timestamp(expiration.secs(), expiration.subsec_nanos())
            .ok_or_else(|| {
                CredentialError::new(format!(
                    "AssumeRole returned an unrepresentable expiration: {expiration:?}"
                ))
            })?;

        Ok(TemporaryCredentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expires_at,
        })
    }
}
