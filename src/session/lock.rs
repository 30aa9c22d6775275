use crate::core::LockToken;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;
use tracing::debug;

/// Continuation run once a session holds no locks.
///
/// Identity is the `Rc` allocation: queueing the same handle twice keeps the
/// first registration only.
pub type UnlockWaiter = Rc<dyn Fn()>;

/// Advisory lock set of one session.
///
/// A held token means "some asynchronous work on this session has not settled
/// yet". Work that must run after everything settles registers through
/// [`LockManager::on_unlocked`] and is drained, oldest first, whenever the set
/// becomes empty.
pub struct LockManager {
    next_token: Cell<u64>,
    held: RefCell<BTreeSet<LockToken>>,
    on_release: RefCell<VecDeque<UnlockWaiter>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self {
            next_token: Cell::new(0),
            held: RefCell::new(BTreeSet::new()),
            on_release: RefCell::new(VecDeque::new()),
        }
    }

    /// Allocates a fresh token and marks it held.
    pub fn acquire(&self) -> LockToken {
        let token = LockToken(self.next_token.get());
        self.next_token.set(token.0 + 1);
        self.held.borrow_mut().insert(token);
        token
    }

    /// Releases `token`. Releasing a token that is not held does nothing.
    ///
    /// When the set becomes empty, queued waiters run in registration order
    /// until the queue is empty or one of them acquires a lock again. Waiters
    /// left in the queue at that point wait for the next full release.
    pub fn release(&self, token: LockToken) {
        if !self.held.borrow_mut().remove(&token) {
            return;
        }

        // Checked before every pop: a waiter that re-locks halts the drain.
        while !self.is_locked() {
            let next = self.on_release.borrow_mut().pop_front();
            match next {
                Some(waiter) => waiter(),
                None => break,
            }
        }
    }

    pub fn is_locked(&self) -> bool {
        !self.held.borrow().is_empty()
    }

    /// Runs `waiter` now if unlocked, otherwise queues it.
    pub fn on_unlocked(&self, waiter: UnlockWaiter) {
        if !self.is_locked() {
            waiter();
            return;
        }

        let mut queue = self.on_release.borrow_mut();
        if queue.iter().any(|queued| Rc::ptr_eq(queued, &waiter)) {
            return;
        }
        queue.push_back(waiter);
        debug!(
            locks = self.held.borrow().len(),
            position = queue.len(),
            "waiting for locks to free"
        );
    }

    /// Number of tokens currently held.
    pub fn held(&self) -> usize {
        self.held.borrow().len()
    }

    /// Number of waiters queued for the next full release.
    pub fn queued(&self) -> usize {
        self.on_release.borrow().len()
    }

    /// Discards queued waiters without running them. Held tokens stay held.
    pub(crate) fn clear_queue(&self) {
        // Dropped outside the borrow: a waiter's captures may own other handles.
        let discarded = std::mem::take(&mut *self.on_release.borrow_mut());
        drop(discarded);
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> UnlockWaiter) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let make = move |name: &'static str| -> UnlockWaiter {
            let sink = sink.clone();
            Rc::new(move || sink.borrow_mut().push(name))
        };
        (log, make)
    }

    #[test]
    fn test_tokens_strictly_increase() {
        let locks = LockManager::new();
        let a = locks.acquire();
        locks.release(a);
        let b = locks.acquire();
        let c = locks.acquire();
        assert!(a < b && b < c);
        assert_eq!(locks.held(), 2);
    }

    #[test]
    fn test_unlocked_waiter_runs_immediately() {
        let locks = LockManager::new();
        let (log, make) = recorder();
        locks.on_unlocked(make("now"));
        assert_eq!(*log.borrow(), vec!["now"]);
        assert_eq!(locks.queued(), 0);
    }

    #[test]
    fn test_release_drains_in_registration_order() {
        let locks = LockManager::new();
        let (log, make) = recorder();
        let token = locks.acquire();
        locks.on_unlocked(make("a"));
        locks.on_unlocked(make("b"));
        locks.on_unlocked(make("c"));
        assert!(log.borrow().is_empty());

        locks.release(token);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert_eq!(locks.queued(), 0);
        assert!(!locks.is_locked());
    }

    #[test]
    fn test_drain_waits_for_last_lock() {
        let locks = LockManager::new();
        let (log, make) = recorder();
        let first = locks.acquire();
        let second = locks.acquire();
        locks.on_unlocked(make("a"));

        locks.release(first);
        assert!(log.borrow().is_empty());
        locks.release(second);
        assert_eq!(*log.borrow(), vec!["a"]);
    }

    #[test]
    fn test_duplicate_registration_runs_once() {
        let locks = LockManager::new();
        let (log, make) = recorder();
        let token = locks.acquire();
        let waiter = make("once");
        locks.on_unlocked(waiter.clone());
        locks.on_unlocked(waiter);
        assert_eq!(locks.queued(), 1);

        locks.release(token);
        assert_eq!(*log.borrow(), vec!["once"]);
    }

    #[test]
    fn test_relocking_waiter_halts_drain() {
        let locks = Rc::new(LockManager::new());
        let (log, make) = recorder();
        let relocked = Rc::new(Cell::new(None));

        let token = locks.acquire();
        let relock: UnlockWaiter = {
            let locks = locks.clone();
            let relocked = relocked.clone();
            let sink = log.clone();
            Rc::new(move || {
                sink.borrow_mut().push("relock");
                relocked.set(Some(locks.acquire()));
            })
        };
        locks.on_unlocked(make("a"));
        locks.on_unlocked(relock);
        locks.on_unlocked(make("c"));
        locks.on_unlocked(make("d"));

        locks.release(token);
        assert_eq!(*log.borrow(), vec!["a", "relock"]);
        assert!(locks.is_locked());
        assert_eq!(locks.queued(), 2);

        locks.release(relocked.get().unwrap());
        assert_eq!(*log.borrow(), vec!["a", "relock", "c", "d"]);
        assert_eq!(locks.queued(), 0);
    }

    #[test]
    fn test_waiter_releasing_its_own_lock_continues_drain_once() {
        let locks = Rc::new(LockManager::new());
        let (log, make) = recorder();

        let inner: UnlockWaiter = {
            let locks = locks.clone();
            let sink = log.clone();
            Rc::new(move || {
                sink.borrow_mut().push("inner");
                let nested = locks.acquire();
                locks.release(nested);
            })
        };

        let token = locks.acquire();
        locks.on_unlocked(inner);
        locks.on_unlocked(make("b"));

        locks.release(token);
        assert_eq!(*log.borrow(), vec!["inner", "b"]);
        assert_eq!(locks.queued(), 0);
    }

    #[test]
    fn test_unknown_token_release_is_noop() {
        let locks = LockManager::new();
        let (log, make) = recorder();
        let token = locks.acquire();
        locks.on_unlocked(make("a"));

        locks.release(LockToken(99));
        assert!(locks.is_locked());
        assert!(log.borrow().is_empty());
        locks.release(token);
        assert_eq!(*log.borrow(), vec!["a"]);
    }

    #[test]
    fn test_clear_queue_discards_without_running() {
        let locks = LockManager::new();
        let (log, make) = recorder();
        let token = locks.acquire();
        locks.on_unlocked(make("a"));
        locks.clear_queue();
        assert_eq!(locks.queued(), 0);

        locks.release(token);
        assert!(log.borrow().is_empty());
    }
}
