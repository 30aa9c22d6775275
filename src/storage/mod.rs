pub mod backing;
pub mod codec;
pub mod config;
pub mod engine;
pub mod file;
pub mod key;
pub mod memory;

pub use backing::{BackingStore, EngineStore, OnLoad, OnSave};
pub use config::{EngineKind, StoreConfig};
pub use engine::StorageEngine;
pub use file::FileEngine;
pub use memory::MemoryEngine;

use crate::core::Result;
use std::rc::Rc;
use tracing::info;

/// Opens the store selected by `config`.
///
/// Must be called from inside a `tokio::task::LocalSet`.
pub async fn open_store(config: &StoreConfig) -> Result<Rc<dyn BackingStore>> {
    config.validate()?;
    let store: Rc<dyn BackingStore> = match &config.engine {
        EngineKind::Memory => Rc::new(EngineStore::open(MemoryEngine::new()).await?),
        EngineKind::File { path } => Rc::new(EngineStore::open(FileEngine::new(path)).await?),
    };
    info!(store = %config.to_url(), "player state store ready");
    Ok(store)
}
