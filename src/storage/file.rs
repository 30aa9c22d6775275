//! File-per-row storage engine
//!
//! Every row lives in `<dir>/<hex row id>.state`. A hex id longer than
//! [`MAX_SEGMENT_LEN`] is split into nested directories of that many digits,
//! the last segment naming the file, so any valid row id maps to exactly one
//! path within the usual 255 byte file name limit. Writes go through a temp
//! file in the row's directory that is synced and renamed over the target, so
//! a reader never observes a half-written row.

use super::StorageEngine;
use crate::core::{Result, StateError};
use async_trait::async_trait;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::NamedTempFile;

const ROW_EXTENSION: &str = "state";

/// Hex digits per path segment.
pub const MAX_SEGMENT_LEN: usize = 200;

pub struct FileEngine {
    dir: PathBuf,
    closed: AtomicBool,
}

impl FileEngine {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `row_id`.
    pub fn row_path(&self, row_id: &[u8]) -> PathBuf {
        let encoded = hex::encode(row_id);
        let mut path = self.dir.clone();
        let mut rest = encoded.as_str();
        while rest.len() > MAX_SEGMENT_LEN {
            let (segment, tail) = rest.split_at(MAX_SEGMENT_LEN);
            path.push(segment);
            rest = tail;
        }
        path.push(format!("{}.{}", rest, ROW_EXTENSION));
        path
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StateError::StoreClosed);
        }
        Ok(())
    }
}

/// Runs blocking file I/O off the runtime's worker threads.
async fn blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| StateError::Engine(format!("File task failed: {}", e)))?
}

fn write_row(path: &Path, blob: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| StateError::Engine(format!("Row path '{}' has no parent", path.display())))?;
    fs::create_dir_all(dir)?;
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(blob)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| StateError::Io(e.error))?;
    Ok(())
}

#[async_trait]
impl StorageEngine for FileEngine {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn init(&self) -> Result<()> {
        self.ensure_open()?;
        let dir = self.dir.clone();
        blocking(move || {
            fs::create_dir_all(&dir).map_err(|e| {
                StateError::Engine(format!(
                    "Failed to create data directory '{}': {}",
                    dir.display(),
                    e
                ))
            })
        })
        .await
    }

    async fn fetch(&self, row_id: &[u8]) -> Result<Option<Vec<u8>>> {
        self.ensure_open()?;
        let path = self.row_path(row_id);
        blocking(move || match fs::read(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StateError::Io(e)),
        })
        .await
    }

    async fn upsert(&self, row_id: &[u8], blob: Vec<u8>) -> Result<u64> {
        self.ensure_open()?;
        let path = self.row_path(row_id);
        blocking(move || {
            write_row(&path, &blob)?;
            Ok(1)
        })
        .await
    }

    async fn row_count(&self) -> Result<usize> {
        self.ensure_open()?;
        let dir = self.dir.clone();
        blocking(move || {
            let mut count = 0;
            let mut pending = vec![dir];
            while let Some(dir) = pending.pop() {
                for entry in fs::read_dir(&dir)? {
                    let entry = entry?;
                    let path = entry.path();
                    if entry.file_type()?.is_dir() {
                        pending.push(path);
                    } else if path.extension().is_some_and(|ext| ext == ROW_EXTENSION) {
                        count += 1;
                    }
                }
            }
            Ok(count)
        })
        .await
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
