use super::StorageEngine;
use super::codec::{decode_state, encode_state};
use super::key::encode_row_id;
use crate::core::{Partition, PartitionState, Result, SaveCause};
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// Receives the state of a load. Invoked at most once.
pub type OnLoad = Box<dyn FnOnce(PartitionState)>;

/// Receives `true` iff a save wrote at least one row. Invoked exactly once.
pub type OnSave = Box<dyn FnOnce(bool)>;

/// Asynchronous load/save contract the session layer talks to.
///
/// Completions of accepted operations are delivered later, on the session
/// thread. A save rejected up front may report `false` before `save` returns.
#[async_trait(?Send)]
pub trait BackingStore {
    /// Loads the state `identity` holds in `partition`. A player with no row
    /// yet receives [`PartitionState::empty`].
    fn load(&self, identity: &str, partition: &Partition, on_load: OnLoad);

    fn save(
        &self,
        identity: &str,
        partition: &Partition,
        state: Rc<PartitionState>,
        cause: SaveCause,
        on_save: OnSave,
    );

    /// Waits for outstanding operations, then releases the engine.
    async fn close(&self) -> Result<()>;
}

/// [`BackingStore`] over any [`StorageEngine`].
///
/// Engine calls run as local tasks, so this must be used from inside a
/// `tokio::task::LocalSet`. Dropping the store without [`BackingStore::close`]
/// aborts operations still in flight.
pub struct EngineStore<E: StorageEngine> {
    engine: Arc<E>,
    tasks: RefCell<JoinSet<()>>,
    closed: Cell<bool>,
}

impl<E: StorageEngine + 'static> EngineStore<E> {
    /// Initializes `engine` and wraps it.
    pub async fn open(engine: E) -> Result<Self> {
        engine.init().await?;
        debug!(engine = engine.name(), "store opened");
        Ok(Self {
            engine: Arc::new(engine),
            tasks: RefCell::new(JoinSet::new()),
            closed: Cell::new(false),
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Operations issued but not yet completed.
    pub fn outstanding(&self) -> usize {
        let mut tasks = self.tasks.borrow_mut();
        while tasks.try_join_next().is_some() {}
        tasks.len()
    }

    fn spawn<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + 'static,
    {
        let mut tasks = self.tasks.borrow_mut();
        // Reap finished operations so the set only tracks live ones.
        while tasks.try_join_next().is_some() {}
        tasks.spawn_local(task);
    }
}

#[async_trait(?Send)]
impl<E: StorageEngine + 'static> BackingStore for EngineStore<E> {
    fn load(&self, identity: &str, partition: &Partition, on_load: OnLoad) {
        if self.closed.get() {
            error!(identity, world = partition.name(), "load issued after store close");
            return;
        }

        let row_id = match encode_row_id(identity, partition) {
            Ok(row_id) => row_id,
            Err(err) => {
                error!(identity, world = partition.name(), error = %err, "cannot address row");
                return;
            }
        };

        let engine = self.engine.clone();
        let identity = identity.to_string();
        let world = partition.name().to_string();
        self.spawn(async move {
            let fetched = engine
                .fetch(&row_id)
                .await
                .and_then(|blob| blob.map(|blob| decode_state(&blob)).transpose());
            match fetched {
                Ok(Some(state)) => on_load(state),
                Ok(None) => on_load(PartitionState::empty()),
                // No error channel: the load stays unresolved.
                Err(err) => error!(
                    identity = %identity,
                    world = %world,
                    error = %err,
                    "failed to load partition state"
                ),
            }
        });
    }

    fn save(
        &self,
        identity: &str,
        partition: &Partition,
        state: Rc<PartitionState>,
        cause: SaveCause,
        on_save: OnSave,
    ) {
        if self.closed.get() {
            error!(
                identity,
                world = partition.name(),
                cause = cause.code(),
                "save issued after store close"
            );
            on_save(false);
            return;
        }

        let prepared = encode_row_id(identity, partition)
            .and_then(|row_id| Ok((row_id, encode_state(&state)?)));
        let (row_id, blob) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                debug!(identity, world = partition.name(), error = %err, "save rejected before reaching engine");
                on_save(false);
                return;
            }
        };

        let engine = self.engine.clone();
        self.spawn(async move {
            let success = match engine.upsert(&row_id, blob).await {
                Ok(affected) => affected > 0,
                Err(err) => {
                    debug!(error = %err, cause = cause.code(), "engine save failed");
                    false
                }
            };
            on_save(success);
        });
    }

    async fn close(&self) -> Result<()> {
        self.closed.set(true);
        let mut tasks = std::mem::take(&mut *self.tasks.borrow_mut());
        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "store operation aborted during close");
            }
        }
        self.engine.close().await?;
        debug!(engine = self.engine.name(), "store closed");
        Ok(())
    }
}
