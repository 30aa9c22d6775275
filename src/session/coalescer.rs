use crate::core::PartitionState;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Continuation expecting the state of one world.
///
/// Identity is the `Rc` allocation, so the same handle joins a pending load
/// at most once.
pub type LoadWaiter = Rc<dyn Fn(Rc<PartitionState>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// No load was pending; the caller must start one.
    Started,
    /// A load is already pending and the waiter was attached to it.
    Joined,
}

/// Waiters per world for loads that are in flight.
///
/// The existence of an entry is what marks a load as pending: at most one
/// store request is issued per key until [`LoadCoalescer::resolve`] removes it.
pub struct LoadCoalescer {
    waiters: RefCell<HashMap<String, Vec<LoadWaiter>>>,
}

impl LoadCoalescer {
    pub fn new() -> Self {
        Self {
            waiters: RefCell::new(HashMap::new()),
        }
    }

    pub fn join(&self, key: &str, waiter: LoadWaiter) -> JoinOutcome {
        let mut waiters = self.waiters.borrow_mut();
        match waiters.get_mut(key) {
            Some(pending) => {
                if !pending.iter().any(|existing| Rc::ptr_eq(existing, &waiter)) {
                    pending.push(waiter);
                }
                JoinOutcome::Joined
            }
            None => {
                waiters.insert(key.to_string(), vec![waiter]);
                JoinOutcome::Started
            }
        }
    }

    /// Hands `state` to every waiter of `key` in registration order and
    /// forgets the pending load. Returns the number of waiters notified.
    pub fn resolve(&self, key: &str, state: &Rc<PartitionState>) -> usize {
        let pending = self.waiters.borrow_mut().remove(key).unwrap_or_default();
        for waiter in &pending {
            waiter(state.clone());
        }
        pending.len()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.waiters.borrow().contains_key(key)
    }

    pub fn waiting(&self, key: &str) -> usize {
        self.waiters.borrow().get(key).map_or(0, Vec::len)
    }

    pub fn pending_keys(&self) -> Vec<String> {
        self.waiters.borrow().keys().cloned().collect()
    }

    /// Forgets every pending load without notifying anyone.
    pub fn clear(&self) {
        let discarded = std::mem::take(&mut *self.waiters.borrow_mut());
        drop(discarded);
    }
}

impl Default for LoadCoalescer {
    fn default() -> Self {
        Self::new()
    }
}
