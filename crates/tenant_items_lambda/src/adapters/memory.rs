//! In-memory stand-ins for the identity service and the item table.
//!
//! [`MemoryBackend`] issues credentials the way STS does and remembers the
//! inline policy each access key was issued under. Every scoped read or write
//! is checked against that policy, so a session for tenant A touching tenant
//! B's keys is refused exactly where DynamoDB would refuse it.
//!
//! Partition queries are unscoped, like the function's own role. Individual
//! partitions can be made to fail or stall to exercise fan-out error handling.
//!
//! Data lives for as long as the backend and all of its clones.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tenant_items_core::contract::Item;
use tenant_items_core::policy::{PolicyDocument, GET_ITEM_ACTION, PUT_ITEM_ACTION};

use crate::adapters::credentials::{
    AssumeRoleRequest, RoleAssumer, ScopedSession, TemporaryCredentials,
};
use crate::adapters::item_store::{PartitionReader, ScopedItemTable, ScopedTableFactory};
use crate::error::{CredentialError, StoreError};

#[derive(Debug, Clone)]
struct SessionGrant {
    policy: PolicyDocument,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryState {
    items: BTreeMap<(String, String), Item>,
    grants: HashMap<String, SessionGrant>,
    assume_role_requests: Vec<AssumeRoleRequest>,
    failing_partitions: HashMap<String, String>,
    slow_partitions: HashMap<String, Duration>,
    role_rejection: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MemoryBackend {
    table_arn: String,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new(table_arn: impl Into<String>) -> Self {
        Self {
            table_arn: table_arn.into(),
            state: Arc::new(Mutex::new(MemoryState::default())),
        }
    }

    /// Writes an item without any policy check.
    pub fn insert_item(&self, item: Item) {
        self.state
            .lock()
            .items
            .insert((item.shard_id.clone(), item.product_id.clone()), item);
    }

    pub fn items(&self) -> Vec<Item> {
        self.state.lock().items.values().cloned().collect()
    }

    pub fn assume_role_requests(&self) -> Vec<AssumeRoleRequest> {
        self.state.lock().assume_role_requests.clone()
    }

    pub fn fail_partition(&self, shard_id: impl Into<String>, reason: impl Into<String>) {
        self.state
            .lock()
            .failing_partitions
            .insert(shard_id.into(), reason.into());
    }

    pub fn delay_partition(&self, shard_id: impl Into<String>, delay: Duration) {
        self.state
            .lock()
            .slow_partitions
            .insert(shard_id.into(), delay);
    }

    pub fn reject_role_assumption(&self, reason: impl Into<String>) {
        self.state.lock().role_rejection = Some(reason.into());
    }

    /// Moves every issued session past its expiry.
    pub fn expire_sessions(&self) {
        let expired_at = Utc::now() - chrono::Duration::seconds(1);
        for grant in self.state.lock().grants.values_mut() {
            grant.expires_at = expired_at;
        }
    }

    fn authorize(&self, access_key_id: &str, action: &str, shard_id: &str) -> Result<(), StoreError> {
        let state = self.state.lock();
        let Some(grant) = state.grants.get(access_key_id) else {
            return Err(StoreError::AccessDenied(
                "The security token included in the request is invalid".to_string(),
            ));
        };
        if grant.expires_at <= Utc::now() {
            return Err(StoreError::AccessDenied(
                "The security token included in the request is expired".to_string(),
            ));
        }
        if !grant.policy.permits(action, &self.table_arn, shard_id) {
            return Err(StoreError::AccessDenied(format!(
                "User is not authorized to perform: {action} on resource: {} because no session policy allows the {action} action",
                self.table_arn
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RoleAssumer for MemoryBackend {
    async fn assume_role(
        &self,
        request: &AssumeRoleRequest,
    ) -> Result<TemporaryCredentials, CredentialError> {
        let mut state = self.state.lock();
        state.assume_role_requests.push(request.clone());

        if let Some(reason) = &state.role_rejection {
            return Err(CredentialError::new(reason.clone()));
        }

        let policy: PolicyDocument = serde_json::from_str(&request.policy_json)
            .map_err(|error| CredentialError::new(format!("MalformedPolicyDocument: {error}")))?;
        let lifetime = chrono::Duration::from_std(request.duration)
            .map_err(|error| CredentialError::new(format!("invalid session duration: {error}")))?;

        let serial = state.assume_role_requests.len();
        let credentials = TemporaryCredentials {
            access_key_id: format!("ASIAMEMORY{serial:010}"),
            secret_access_key: format!("memory-secret-{serial}"),
            session_token: format!("memory-session-{serial}"),
            expires_at: Utc::now() + lifetime,
        };
        state.grants.insert(
            credentials.access_key_id.clone(),
            SessionGrant {
                policy,
                expires_at: credentials.expires_at,
            },
        );
        Ok(credentials)
    }
}

#[async_trait]
impl PartitionReader for MemoryBackend {
    async fn query_partition(&self, shard_id: &str) -> Result<Vec<Item>, StoreError> {
        let delay = {
            let state = self.state.lock();
            if let Some(reason) = state.failing_partitions.get(shard_id) {
                return Err(StoreError::Backend(reason.clone()));
            }
            state.slow_partitions.get(shard_id).copied()
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Ok(self
            .state
            .lock()
            .items
            .values()
            .filter(|item| item.shard_id == shard_id)
            .cloned()
            .collect())
    }
}

impl ScopedTableFactory for MemoryBackend {
    fn open(&self, session: &ScopedSession) -> Box<dyn ScopedItemTable> {
        Box::new(MemoryScopedTable {
            backend: self.clone(),
            access_key_id: session.credentials.access_key_id.clone(),
        })
    }
}

pub struct MemoryScopedTable {
    backend: MemoryBackend,
    access_key_id: String,
}

#[async_trait]
impl ScopedItemTable for MemoryScopedTable {
    async fn get_item(
        &self,
        shard_id: &str,
        product_id: &str,
    ) -> Result<Option<Item>, StoreError> {
        self.backend
            .authorize(&self.access_key_id, GET_ITEM_ACTION, shard_id)?;
        Ok(self
            .backend
            .state
            .lock()
            .items
            .get(&(shard_id.to_string(), product_id.to_string()))
            .cloned())
    }

    async fn put_item(&self, item: &Item) -> Result<(), StoreError> {
        self.backend
            .authorize(&self.access_key_id, PUT_ITEM_ACTION, &item.shard_id)?;
        self.backend.insert_item(item.clone());
        Ok(())
    }
}
