use serde::{Deserialize, Serialize};

pub const PARTITION_KEY_ATTRIBUTE: &str = "ShardID";
pub const SORT_KEY_ATTRIBUTE: &str = "ProductId";
pub const PAYLOAD_ATTRIBUTE: &str = "data";

pub const DEFAULT_SEED_ITEMS_PER_REQUEST: usize = 3;
pub const SAMPLE_PAYLOAD: &str = "{sample data}";
pub const ITEM_NOT_FOUND_MESSAGE: &str =
    "But, There is no Item found in the DB for the given input values";

/// One stored record, keyed by `(shard_id, product_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Item {
    #[serde(rename = "ShardID")]
    pub shard_id: String,
    #[serde(rename = "ProductId")]
    pub product_id: String,
    #[serde(rename = "data")]
    pub payload: String,
}

impl Item {
    pub fn new(
        shard_id: impl Into<String>,
        product_id: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            shard_id: shard_id.into(),
            product_id: product_id.into(),
            payload: payload.into(),
        }
    }
}

/// Items returned by a single shard query. Never empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemGroup {
    pub shard_id: String,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShardFailure {
    pub shard_id: String,
    pub reason: String,
}

/// Business outcome of one dispatched request.
///
/// Rendered to the text envelope only at the transport boundary; the tags
/// match what existing clients parse out of the response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Success(String),
    LookupSucceeded(String),
    Failed(String),
    NotSupported(String),
}

impl OperationOutcome {
    pub fn status_tag(&self) -> &'static str {
        match self {
            Self::Success(_) => "Success",
            Self::LookupSucceeded(_) => "Successful",
            Self::Failed(_) => "Failed",
            Self::NotSupported(_) => "Not Supported",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success(message)
            | Self::LookupSucceeded(message)
            | Self::Failed(message)
            | Self::NotSupported(message) => message,
        }
    }

    pub fn render_body(&self) -> String {
        format!("\nOperation {}. {}\n\n", self.status_tag(), self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn stable_contract_json(value: impl Serialize) -> String {
    serde_json::to_string(&value).expect("serialization of contract value should not fail")
}
