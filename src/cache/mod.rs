//! Durable state: key/value stores and the alert deduplication cache.

pub mod dedup;
pub mod error;
pub mod file;
pub mod redis_store;
pub mod store;

pub use dedup::DedupCache;
pub use error::StoreError;
pub use file::JsonFileStore;
pub use redis_store::RedisStore;
pub use store::{KeyValueStore, MemoryStore};
