//! Blob format of a stored [`PartitionState`]: one version byte followed by
//! the state as a MessagePack map.

use crate::core::{PartitionState, Result, StateError};

const FORMAT_VERSION: u8 = 1;

pub fn encode_state(state: &PartitionState) -> Result<Vec<u8>> {
    let mut blob = vec![FORMAT_VERSION];
    blob.extend(rmp_serde::to_vec_named(state)?);
    Ok(blob)
}

pub fn decode_state(blob: &[u8]) -> Result<PartitionState> {
    match blob.split_first() {
        Some((&FORMAT_VERSION, body)) => Ok(rmp_serde::from_slice(body)?),
        Some((version, _)) => Err(StateError::Codec(format!(
            "unsupported state format version {}",
            version
        ))),
        None => Err(StateError::Codec("empty state blob".to_string())),
    }
}
