//! # Memory Bridge
//!
//! Shared memory is the persistence seam of the engine: `remember`, `recall`,
//! and memory-block reads route through an injected [`SharedMemory`] backend
//! so the interpreter itself holds no state across calls.
//!
//! The engine never caches memory values — every operation is a fresh round
//! trip, so two concurrent executions against the same key observe
//! last-write-wins with no ordering guarantee from the engine itself.
//! Callers needing strict consistency supply a backend with per-key
//! serialization.

pub mod in_memory;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::eval::expression::Value;

pub use in_memory::InMemorySharedMemory;

/// Errors reported by a shared-memory backend.
#[derive(Debug, Error, Clone)]
pub enum MemoryError {
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Externally supplied key-value store backing `remember`/`recall` and
/// memory-block variables.
#[async_trait]
pub trait SharedMemory: Send + Sync {
    /// Retrieve a value by key; `None` if the key has never been set.
    async fn get(&self, key: &str) -> Result<Option<Value>, MemoryError>;

    /// Store a value under a key, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> Result<(), MemoryError>;

    /// Append a value under a key, promoting non-list values to a list.
    async fn append(&self, key: &str, value: Value) -> Result<(), MemoryError>;
}

/// Thin pass-through between the interpreter and the injected backend.
///
/// Exists so the interpreter speaks one narrow surface: tracing on every
/// round trip and nothing else — no caching, no batching.
pub struct MemoryBridge {
    backend: Arc<dyn SharedMemory>,
}

impl MemoryBridge {
    pub fn new(backend: Arc<dyn SharedMemory>) -> Self {
        Self { backend }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get(&self, key: &str) -> Result<Option<Value>, MemoryError> {
        let value = self.backend.get(key).await?;
        debug!(hit = value.is_some(), "memory get");
        Ok(value)
    }

    #[tracing::instrument(level = "debug", skip(self, value))]
    pub async fn set(&self, key: &str, value: Value) -> Result<(), MemoryError> {
        self.backend.set(key, value).await
    }

    #[tracing::instrument(level = "debug", skip(self, value))]
    pub async fn append(&self, key: &str, value: Value) -> Result<(), MemoryError> {
        self.backend.append(key, value).await
    }
}

/// Scoped key under which a memory-block variable is stored:
/// `session:{bot_id}:{name}` or `user:{user_id}:{name}`.
pub fn scoped_key(scope: &crate::ast::MemoryScope, owner: &str, name: &str) -> String {
    format!("{}:{}:{}", scope, owner, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::MemoryScope;

    #[test]
    fn test_scoped_key_format() {
        assert_eq!(
            scoped_key(&MemoryScope::Session, "bot-1", "count"),
            "session:bot-1:count"
        );
        assert_eq!(
            scoped_key(&MemoryScope::User, "user-9", "name"),
            "user:user-9:name"
        );
    }

    #[tokio::test]
    async fn test_bridge_round_trip() {
        let bridge = MemoryBridge::new(Arc::new(InMemorySharedMemory::new()));
        bridge
            .set("k", Value::String("v".to_string()))
            .await
            .unwrap();
        assert_eq!(
            bridge.get("k").await.unwrap(),
            Some(Value::String("v".to_string()))
        );
        assert_eq!(bridge.get("missing").await.unwrap(), None);
    }
}
