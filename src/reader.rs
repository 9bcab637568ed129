//! reader — resilient store opener and handle lifecycle.
//!
//! Opening tries a plain read-only open first (shared lock, ~1 s timeout).
//! If that fails with exactly the lock-timeout condition (a snapshotter
//! daemon holding the exclusive lock), fall back to a point-in-time copy:
//! stream the file into a uniquely named temp file, flush it durably, and
//! open the copy instead. The temp file is tracked and deleted on close and
//! on every error path; it is never left behind.
//!
//! Any other open failure (missing file, permissions, corrupt header) is
//! surfaced directly with the path named. The fallback is a single strategy
//! switch for contention, not a generic retry loop.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::errors::StoreError;
use crate::store::Store;

/// How long `open` waits for the shared lock before copying.
pub const OPEN_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

static NEXT_COPY_ID: AtomicU64 = AtomicU64::new(1);

/// Read-only handle on a metadata store. Owns the connection and, when the
/// copy fallback fired, the temp file backing it.
///
/// Not safe for close-while-in-use; finish operations before closing.
/// Multiple independent readers (each possibly with its own temp copy) may
/// coexist.
#[derive(Debug)]
pub struct MetaReader {
    store: Option<Store>,
    temp_path: Option<PathBuf>,
}

impl MetaReader {
    /// Open the store at `path` read-only, copying it aside first if a
    /// writer holds the lock.
    pub fn open(path: &Path) -> Result<MetaReader> {
        match Store::open_ro(path, OPEN_LOCK_TIMEOUT) {
            Ok(store) => {
                debug!("opened store {} directly", path.display());
                Ok(MetaReader {
                    store: Some(store),
                    temp_path: None,
                })
            }
            Err(StoreError::LockTimeout { .. }) => Self::open_via_copy(path),
            Err(e) => {
                Err(e).with_context(|| format!("open store {}", path.display()))
            }
        }
    }

    fn open_via_copy(path: &Path) -> Result<MetaReader> {
        warn!(
            "store {} is locked by another process, reading from a temporary copy",
            path.display()
        );
        let tmp = temp_copy_path();
        if let Err(e) = copy_store(path, &tmp) {
            let _ = fs::remove_file(&tmp);
            return Err(e).with_context(|| {
                format!("copy locked store {} for reading", path.display())
            });
        }
        // Only this process knows the copy's name; contention is impossible,
        // the timeout is a formality.
        match Store::open_ro(&tmp, OPEN_LOCK_TIMEOUT) {
            Ok(store) => Ok(MetaReader {
                store: Some(store),
                temp_path: Some(tmp),
            }),
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                Err(e).with_context(|| format!("open copied store {}", path.display()))
            }
        }
    }

    /// The temp copy backing this handle, if the fallback fired.
    pub fn temp_copy(&self) -> Option<&Path> {
        self.temp_path.as_deref()
    }

    /// Close the connection and delete the temp copy. A close error is
    /// reported preferentially, but the delete runs regardless. Safe to call
    /// again (a no-op once closed); operations after close fail with
    /// [`StoreError::Closed`].
    pub fn close(&mut self) -> Result<()> {
        let close_res = match self.store.take() {
            Some(store) => store.close().context("close store"),
            None => Ok(()),
        };
        let remove_res = match self.temp_path.take() {
            Some(tmp) => fs::remove_file(&tmp)
                .with_context(|| format!("remove temp copy {}", tmp.display())),
            None => Ok(()),
        };
        close_res.and(remove_res)
    }

    pub(crate) fn store(&self) -> Result<&Store, StoreError> {
        self.store.as_ref().ok_or(StoreError::Closed)
    }
}

impl Drop for MetaReader {
    fn drop(&mut self) {
        // Best-effort cleanup; explicit close reports errors instead.
        let _ = self.close();
    }
}

fn temp_copy_path() -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_COPY_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("metaview-copy-{pid}-{t}-{id}.db"))
}

fn copy_store(src: &Path, dst: &Path) -> Result<()> {
    let mut from = File::open(src).with_context(|| format!("open source {}", src.display()))?;
    let mut to = File::create(dst).with_context(|| format!("create copy {}", dst.display()))?;
    io::copy(&mut from, &mut to).context("copy store contents")?;
    // The copy must be fully on disk before we read through it.
    to.sync_all().context("sync copy")?;
    Ok(())
}
