//! Typed store errors.
//!
//! The opener's copy fallback must trigger on exactly the lock-timeout
//! condition, so that case is a distinct variant rather than message text.
//! Everything above the engine wraps these with anyhow context.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Another process held the file lock past the acquisition deadline.
    #[error("timeout waiting for store lock on {path}")]
    LockTimeout { path: PathBuf },

    /// The handle was closed; no further operations may succeed.
    #[error("store handle is closed")]
    Closed,

    /// Write attempted through a read-only handle.
    #[error("store is read-only")]
    ReadOnly,

    /// A bucket path names a plain value where a bucket is required, or
    /// the other way around.
    #[error("invalid bucket path: {0}")]
    InvalidPath(String),

    /// Bad magic, failed CRC, unsupported version, out-of-range page ids.
    #[error("corrupt store: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
