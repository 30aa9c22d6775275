pub mod error;
pub mod types;

pub use error::{Result, StateError};
pub use types::{
    EffectInstance, GameMode, IdentityId, Inventory, ItemStack, LockToken, Partition,
    PartitionState, SaveCause,
};
