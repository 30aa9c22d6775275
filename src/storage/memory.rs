use super::StorageEngine;
use crate::core::{Result, StateError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Rows kept in process memory. Nothing survives a restart.
pub struct MemoryEngine {
    rows: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
    closed: AtomicBool,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StateError::StoreClosed);
        }
        Ok(())
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageEngine for MemoryEngine {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn init(&self) -> Result<()> {
        self.ensure_open()
    }

    async fn fetch(&self, row_id: &[u8]) -> Result<Option<Vec<u8>>> {
        self.ensure_open()?;
        Ok(self.rows.read().await.get(row_id).cloned())
    }

    async fn upsert(&self, row_id: &[u8], blob: Vec<u8>) -> Result<u64> {
        self.ensure_open()?;
        self.rows.write().await.insert(row_id.to_vec(), blob);
        Ok(1)
    }

    async fn row_count(&self) -> Result<usize> {
        self.ensure_open()?;
        Ok(self.rows.read().await.len())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
