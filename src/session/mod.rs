//! Per-player world state sessions
//!
//! All types here are single-threaded (`Rc`/`RefCell`) and expect to be
//! driven from one thread, typically inside a `tokio::task::LocalSet`.
//! Continuations may call back into any session operation: no internal
//! borrow is held while one runs.

pub mod cache;
pub mod coalescer;
pub mod coordinator;
pub mod lock;
pub mod registry;

pub use cache::{PARTITION_CACHE_CAPACITY, PartitionCache};
pub use coalescer::{JoinOutcome, LoadCoalescer, LoadWaiter};
pub use coordinator::Session;
pub use lock::{LockManager, UnlockWaiter};
pub use registry::Sessions;
