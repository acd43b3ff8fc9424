pub mod credentials;
pub mod dynamodb;
pub mod item_store;
pub mod memory;
pub mod sts;
