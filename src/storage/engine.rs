use crate::core::Result;
use async_trait::async_trait;

/// Storage engine trait - one implementation per place player rows can live.
///
/// Engines work on opaque row ids (see [`super::key`]) and opaque state
/// blobs (see [`super::codec`]); they never see players or worlds. Calls may
/// run on any runtime thread, completions are routed back to the session
/// thread by [`super::EngineStore`].
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Short engine name used in logs and config.
    fn name(&self) -> &'static str;

    /// Prepare the backing storage (create directories, tables, ...)
    async fn init(&self) -> Result<()>;

    /// Fetch the blob stored under `row_id`, `None` if the row does not exist
    async fn fetch(&self, row_id: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Insert or replace the row, returning the number of rows affected
    async fn upsert(&self, row_id: &[u8], blob: Vec<u8>) -> Result<u64>;

    /// Number of stored rows
    async fn row_count(&self) -> Result<usize>;

    /// Release the underlying resources. Later calls fail with `StoreClosed`.
    async fn close(&self) -> Result<()>;
}
