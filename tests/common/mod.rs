#![allow(dead_code)]

use async_trait::async_trait;
use perworld::storage::{OnLoad, OnSave};
use perworld::{BackingStore, Partition, PartitionState, Result, SaveCause};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct PendingLoad {
    identity: String,
    partition: Partition,
    on_load: OnLoad,
}

pub struct RecordedSave {
    pub identity: String,
    pub partition: Partition,
    pub state: Rc<PartitionState>,
    pub cause: SaveCause,
    on_save: Option<OnSave>,
}

/// Store that records every call and completes them only when told to.
#[derive(Default)]
pub struct ManualStore {
    loads: RefCell<Vec<PendingLoad>>,
    load_calls: RefCell<Vec<String>>,
    saves: RefCell<Vec<RecordedSave>>,
    closed: Cell<bool>,
}

impl ManualStore {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// World names passed to `load`, in call order.
    pub fn load_calls(&self) -> Vec<String> {
        self.load_calls.borrow().clone()
    }

    pub fn pending_loads(&self) -> usize {
        self.loads.borrow().len()
    }

    /// Completes the oldest pending load of `world`. Returns `false` if none.
    pub fn complete_load(&self, world: &str, state: PartitionState) -> bool {
        let pending = {
            let mut loads = self.loads.borrow_mut();
            match loads.iter().position(|load| load.partition.name() == world) {
                Some(index) => loads.remove(index),
                None => return false,
            }
        };
        (pending.on_load)(state);
        true
    }

    /// Identity the oldest pending load of `world` was issued for.
    pub fn load_identity(&self, world: &str) -> Option<String> {
        self.loads
            .borrow()
            .iter()
            .find(|load| load.partition.name() == world)
            .map(|load| load.identity.clone())
    }

    pub fn save_count(&self) -> usize {
        self.saves.borrow().len()
    }

    pub fn with_save<R>(&self, index: usize, inspect: impl FnOnce(&RecordedSave) -> R) -> R {
        inspect(&self.saves.borrow()[index])
    }

    /// Reports the outcome of the `index`th save.
    pub fn complete_save(&self, index: usize, success: bool) {
        let on_save = self.saves.borrow_mut()[index]
            .on_save
            .take()
            .expect("save already completed");
        on_save(success);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

#[async_trait(?Send)]
impl BackingStore for ManualStore {
    fn load(&self, identity: &str, partition: &Partition, on_load: OnLoad) {
        self.load_calls.borrow_mut().push(partition.name().to_string());
        self.loads.borrow_mut().push(PendingLoad {
            identity: identity.to_string(),
            partition: partition.clone(),
            on_load,
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
        self.saves.borrow_mut().push(RecordedSave {
            identity: identity.to_string(),
            partition: partition.clone(),
            state,
            cause,
            on_save: Some(on_save),
        });
    }

    async fn close(&self) -> Result<()> {
        self.closed.set(true);
        Ok(())
    }
}

/// Waiter that records every state it receives.
pub fn recording_waiter() -> (perworld::LoadWaiter, Rc<RefCell<Vec<Rc<PartitionState>>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let waiter: perworld::LoadWaiter =
        Rc::new(move |state: Rc<PartitionState>| sink.borrow_mut().push(state));
    (waiter, seen)
}

pub fn state_with_xp(experience: i32) -> PartitionState {
    PartitionState {
        experience,
        ..PartitionState::empty()
    }
}
