use std::{collections::BTreeMap, ops::RangeBounds, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::backend::{KeyValue, StorageBackend, StorageError, StorageResult, Transaction};

type Store = Arc<RwLock<BTreeMap<Vec<u8>, Bytes>>>;

/// In-memory storage backend
///
/// Clones share the same underlying map, so handlers and repositories can
/// hold independent handles over one store. Data is lost on restart.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    data: Store,
}

impl MemoryBackend {
    /// Create a new, empty backend
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        Ok(self.data.read().get(key).cloned())
    }

    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        self.data.write().insert(key, Bytes::from(value));
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.data.write().remove(key);
        Ok(())
    }

    async fn get_range<R>(&self, range: R) -> StorageResult<Vec<KeyValue>>
    where
        R: RangeBounds<Vec<u8>> + Send,
    {
        let data = self.data.read();
        Ok(data
            .range(range)
            .map(|(k, v)| KeyValue { key: Bytes::from(k.clone()), value: v.clone() })
            .collect())
    }

    async fn transaction(&self) -> StorageResult<Box<dyn Transaction>> {
        Ok(Box::new(MemoryTransaction { store: Arc::clone(&self.data), ops: Vec::new() }))
    }

    async fn compare_and_set(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new_value: Vec<u8>,
    ) -> StorageResult<()> {
        let mut data = self.data.write();
        let current = data.get(key).map(|b| b.as_ref());
        if current != expected {
            return Err(StorageError::CasConflict);
        }
        data.insert(key.to_vec(), Bytes::from(new_value));
        Ok(())
    }
}

enum Op {
    Set(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// Write set over a [`MemoryBackend`], applied under one write lock
struct MemoryTransaction {
    store: Store,
    ops: Vec<Op>,
}

#[async_trait]
impl Transaction for MemoryTransaction {
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(Op::Set(key, value));
    }

    fn delete(&mut self, key: Vec<u8>) {
        self.ops.push(Op::Delete(key));
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        let mut data = self.store.write();
        for op in self.ops {
            match op {
                Op::Set(key, value) => {
                    data.insert(key, Bytes::from(value));
                },
                Op::Delete(key) => {
                    data.remove(&key);
                },
            }
        }
        Ok(())
    }
}
