//! In-process shared-memory backend.
//!
//! The default backend for hosts without persistence and for tests. Keys are
//! process-local; values survive across engine calls but not restarts.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{MemoryError, SharedMemory};
use crate::eval::expression::Value;

#[derive(Default)]
pub struct InMemorySharedMemory {
    entries: DashMap<String, Value>,
}

impl InMemorySharedMemory {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SharedMemory for InMemorySharedMemory {
    async fn get(&self, key: &str) -> Result<Option<Value>, MemoryError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), MemoryError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn append(&self, key: &str, value: Value) -> Result<(), MemoryError> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => match occupied.get_mut() {
                Value::List(items) => items.push(value),
                other => {
                    let prior = std::mem::replace(other, Value::Null);
                    *occupied.get_mut() = Value::List(vec![prior, value]);
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(Value::List(vec![value]));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get() {
        let memory = InMemorySharedMemory::new();
        memory.set("k", Value::Number(1.0)).await.unwrap();
        assert_eq!(memory.get("k").await.unwrap(), Some(Value::Number(1.0)));
        memory.set("k", Value::Number(2.0)).await.unwrap();
        assert_eq!(memory.get("k").await.unwrap(), Some(Value::Number(2.0)));
    }

    #[tokio::test]
    async fn test_append_creates_list() {
        let memory = InMemorySharedMemory::new();
        memory.append("log", Value::Number(1.0)).await.unwrap();
        memory.append("log", Value::Number(2.0)).await.unwrap();
        assert_eq!(
            memory.get("log").await.unwrap(),
            Some(Value::List(vec![Value::Number(1.0), Value::Number(2.0)]))
        );
    }

    #[tokio::test]
    async fn test_append_promotes_scalar() {
        let memory = InMemorySharedMemory::new();
        memory.set("k", Value::String("a".to_string())).await.unwrap();
        memory.append("k", Value::String("b".to_string())).await.unwrap();
        assert_eq!(
            memory.get("k").await.unwrap(),
            Some(Value::List(vec![
                Value::String("a".to_string()),
                Value::String("b".to_string()),
            ]))
        );
    }
}
