// ============================================================================
// PerWorld Library
// ============================================================================

//! Per-world player state.
//!
//! A [`Session`] per online player lazily loads the player's state for each
//! world from a [`BackingStore`], keeps the last few worlds in memory, merges
//! concurrent requests for the same world into one store call and saves in
//! the background.
//!
//! ```no_run
//! use perworld::{Partition, PartitionState, Sessions, StoreConfig, open_store};
//! use std::rc::Rc;
//!
//! # async fn run() -> perworld::Result<()> {
//! let store = open_store(&StoreConfig::file("players")).await?;
//! let sessions = Sessions::new(store);
//!
//! let steve = sessions.open("Steve");
//! steve.load_partition(
//!     &Partition::new("nether"),
//!     Rc::new(|state: Rc<PartitionState>| println!("health in the nether: {}", state.health)),
//! );
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod session;
pub mod storage;

pub use core::{
    EffectInstance, GameMode, IdentityId, Inventory, ItemStack, LockToken, Partition,
    PartitionState, Result, SaveCause, StateError,
};
pub use session::{
    LoadWaiter, LockManager, PARTITION_CACHE_CAPACITY, PartitionCache, Session, Sessions,
    UnlockWaiter,
};
pub use storage::{BackingStore, EngineKind, EngineStore, StoreConfig, open_store};
