//! Row identity of one player in one world.
//!
//! ```text
//! byte 0    length of the lowercased player name (0..=255)
//! bytes     the lowercased player name
//! byte      1 if the world belongs to a bundle, else 0
//! rest      the bundle name if flagged, else the world name (no length prefix)
//! ```
//!
//! Worlds of the same bundle therefore share one row.

use crate::core::{Partition, Result, StateError};

pub fn encode_row_id(identity: &str, partition: &Partition) -> Result<Vec<u8>> {
    let name = identity.to_ascii_lowercase();
    let name_len =
        u8::try_from(name.len()).map_err(|_| StateError::IdentityNameTooLong(name.len()))?;

    let (flag, target) = match partition.bundle() {
        Some(bundle) => (1u8, bundle),
        None => (0u8, partition.name()),
    };

    let mut row_id = Vec::with_capacity(2 + name.len() + target.len());
    row_id.push(name_len);
    row_id.extend_from_slice(name.as_bytes());
    row_id.push(flag);
    row_id.extend_from_slice(target.as_bytes());
    Ok(row_id)
}

/// Parsed form of a row id, for tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowId {
    pub identity: String,
    pub bundled: bool,
    /// Bundle name if `bundled`, world name otherwise.
    pub target: String,
}

pub fn decode_row_id(row_id: &[u8]) -> Result<RowId> {
    let (&name_len, rest) = row_id
        .split_first()
        .ok_or_else(|| StateError::InvalidRowId("empty row id".to_string()))?;
    let name_len = name_len as usize;
    if rest.len() < name_len + 1 {
        return Err(StateError::InvalidRowId(format!(
            "row id of {} bytes cannot hold a {} byte name and bundle flag",
            row_id.len(),
            name_len
        )));
    }

    let (name, rest) = rest.split_at(name_len);
    let bundled = match rest[0] {
        0 => false,
        1 => true,
        other => {
            return Err(StateError::InvalidRowId(format!(
                "bundle flag must be 0 or 1, got {}",
                other
            )));
        }
    };

    let utf8 = |bytes: &[u8]| {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| StateError::InvalidRowId(format!("not UTF-8: {}", e)))
    };

    Ok(RowId {
        identity: utf8(name)?,
        bundled,
        target: utf8(&rest[1..])?,
    })
}
