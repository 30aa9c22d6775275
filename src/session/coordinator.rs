use super::cache::PartitionCache;
use super::coalescer::{JoinOutcome, LoadCoalescer, LoadWaiter};
use super::lock::{LockManager, UnlockWaiter};
use super::registry::Sessions;
use crate::core::{IdentityId, LockToken, Partition, PartitionState, SaveCause};
use crate::storage::BackingStore;
use std::cell::Cell;
use std::rc::{Rc, Weak};
use tracing::{Span, debug, debug_span, error};

/// Per-player coordinator of world state.
///
/// Owns the player's lock set, the cache of recently used worlds and the
/// loads currently in flight. It never keeps itself alive across a store
/// round trip: completions look the session up again by [`IdentityId`] and
/// are dropped if the player has gone in the meantime.
pub struct Session {
    id: IdentityId,
    name: String,
    span: Span,
    store: Rc<dyn BackingStore>,
    sessions: Weak<Sessions>,
    locks: LockManager,
    cache: PartitionCache,
    loads: LoadCoalescer,
    closed: Cell<bool>,
}

impl Session {
    pub(crate) fn new(
        id: IdentityId,
        name: String,
        store: Rc<dyn BackingStore>,
        sessions: Weak<Sessions>,
    ) -> Self {
        let span = debug_span!("session", identity = %name, id = %id);
        Self {
            id,
            name,
            span,
            store,
            sessions,
            locks: LockManager::new(),
            cache: PartitionCache::new(),
            loads: LoadCoalescer::new(),
            closed: Cell::new(false),
        }
    }

    pub fn id(&self) -> IdentityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn locks(&self) -> &LockManager {
        &self.locks
    }

    pub fn cache(&self) -> &PartitionCache {
        &self.cache
    }

    pub fn is_loading(&self, partition: &Partition) -> bool {
        self.loads.is_pending(partition.name())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Delivers the player's state in `partition` to `waiter`.
    ///
    /// A cached world is delivered before this returns. Otherwise the waiter
    /// joins the load already in flight for the world, or starts one once the
    /// session holds no locks. Each waiter runs at most once; never if the
    /// session is closed first.
    pub fn load_partition(&self, partition: &Partition, waiter: LoadWaiter) {
        let _enter = self.span.enter();
        if self.closed.get() {
            debug!(world = partition.name(), "ignoring load on closed session");
            return;
        }

        let key = partition.name();
        if let Some(state) = self.cache.get(key) {
            debug!(world = key, "loaded data from memory");
            waiter(state);
            return;
        }

        if self.loads.join(key, waiter) == JoinOutcome::Joined {
            return;
        }

        let fetch: UnlockWaiter = {
            let sessions = self.sessions.clone();
            let id = self.id;
            let partition = partition.clone();
            Rc::new(move || {
                let Some(session) = resolve(&sessions, id) else {
                    return;
                };
                let token = session.locks.acquire();
                let sessions = sessions.clone();
                let key = partition.name().to_string();
                session.store.load(
                    &session.name,
                    &partition,
                    Box::new(move |state: PartitionState| match resolve(&sessions, id) {
                        Some(session) => session.finish_load(&key, state, token),
                        None => debug!(world = %key, %id, "dropping load for departed player"),
                    }),
                );
            })
        };
        self.locks.on_unlocked(fetch);
    }

    fn finish_load(&self, key: &str, state: PartitionState, token: LockToken) {
        let _enter = self.span.enter();
        if self.closed.get() {
            debug!(world = key, "dropping load for closed session");
            return;
        }
        debug!(world = key, "loaded data from store");

        let state = Rc::new(state);
        if let Some(evicted) = self.cache.put(key, state.clone()) {
            debug!(world = key, evicted = %evicted, "evicted cached world");
        }
        self.loads.resolve(key, &state);
        self.locks.release(token);
    }

    /// Caches `state` for `partition` at once and writes it to the store in
    /// the background. The outcome is only logged.
    ///
    /// A load for the same world that is already in flight still overwrites
    /// the cached state when it completes.
    pub fn save_partition(
        &self,
        partition: &Partition,
        state: impl Into<Rc<PartitionState>>,
        cause: SaveCause,
    ) {
        let _enter = self.span.enter();
        let state = state.into();
        let world = partition.name().to_string();
        self.cache.put(&world, state.clone());

        debug!(world = %world, cause = cause.code(), "saving data");
        let span = self.span.clone();
        self.store.save(
            &self.name,
            partition,
            state,
            cause,
            Box::new(move |success: bool| {
                let _enter = span.enter();
                if success {
                    debug!(world = %world, "data successfully saved");
                } else {
                    error!(world = %world, cause = cause.code(), "data failed to save");
                }
            }),
        );
    }

    /// Drops every pending load waiter and queued unlock waiter without
    /// running them.
    ///
    /// Held lock tokens are not released and store calls are not cancelled;
    /// their completions find the session gone and do nothing.
    pub fn close(&self) {
        let _enter = self.span.enter();
        self.closed.set(true);
        self.loads.clear();
        self.locks.clear_queue();
        debug!(locks = self.locks.held(), "session closed");
    }
}

fn resolve(sessions: &Weak<Sessions>, id: IdentityId) -> Option<Rc<Session>> {
    sessions.upgrade()?.get(id)
}
