use super::coordinator::Session;
use crate::core::IdentityId;
use crate::storage::BackingStore;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use tracing::debug;

/// Live sessions, keyed by the activation id of their player.
///
/// This is the only place a [`Session`] is owned. Asynchronous completions
/// resolve their session through [`Sessions::get`], so once a player is
/// closed here nothing issued on its behalf can reach it again.
pub struct Sessions {
    store: Rc<dyn BackingStore>,
    active: RefCell<HashMap<IdentityId, Rc<Session>>>,
    next_id: Cell<u64>,
    this: Weak<Sessions>,
}

impl Sessions {
    pub fn new(store: Rc<dyn BackingStore>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            store,
            active: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
            this: this.clone(),
        })
    }

    /// Starts a session for a player that just became active.
    ///
    /// Every call allocates a fresh [`IdentityId`], also for a name that has
    /// been seen before.
    pub fn open(&self, name: impl Into<String>) -> Rc<Session> {
        let id = IdentityId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let session = Rc::new(Session::new(
            id,
            name.into(),
            self.store.clone(),
            self.this.clone(),
        ));
        self.active.borrow_mut().insert(id, session.clone());
        debug!(identity = session.name(), %id, "session opened");
        session
    }

    pub fn get(&self, id: IdentityId) -> Option<Rc<Session>> {
        self.active.borrow().get(&id).cloned()
    }

    /// Active session of the player called `name`, compared case-insensitively.
    pub fn find(&self, name: &str) -> Option<Rc<Session>> {
        self.active
            .borrow()
            .values()
            .filter(|session| session.name().eq_ignore_ascii_case(name))
            .max_by_key(|session| session.id())
            .cloned()
    }

    /// Ends the session of `id`. Returns `false` if it was not active.
    pub fn close(&self, id: IdentityId) -> bool {
        let removed = self.active.borrow_mut().remove(&id);
        match removed {
            Some(session) => {
                session.close();
                true
            }
            None => false,
        }
    }

    /// Ends every active session.
    pub fn close_all(&self) {
        let drained: Vec<_> = self.active.borrow_mut().drain().map(|(_, s)| s).collect();
        for session in drained {
            session.close();
        }
    }

    pub fn len(&self) -> usize {
        self.active.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.borrow().is_empty()
    }

    pub fn store(&self) -> &Rc<dyn BackingStore> {
        &self.store
    }
}
