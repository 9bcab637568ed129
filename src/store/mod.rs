//! store — single-file nested-bucket store.
//!
//! Layout: pages 0/1 are dual meta slots, everything after is node pages.
//! Commits append fresh pages and then flip the alternate meta slot, so
//! existing pages are never rewritten and a read transaction keeps a
//! consistent root for its whole life (snapshot isolation without read
//! locks).
//!
//! File locking (fs2, advisory, on the store file itself): exclusive for
//! read-write handles, shared for read-only handles. Acquisition polls up
//! to a deadline and then fails with the typed [`StoreError::LockTimeout`],
//! so callers can react to contention without string matching.
//!
//! The write path is minimal on purpose: enough to build stores (fixtures,
//! admin tooling). The inspector layers above never write.

pub mod meta;
pub mod node;
pub mod page;
pub mod tx;

pub use node::Entry;
pub use tx::{Bucket, ReadTx, WriteTx};

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt as UnixFileExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::consts::{
    page_payload_capacity, META_SLOTS, META_VERSION, NO_PAGE, PAGE_HDR_SIZE, PAGE_SIZE,
    PAGE_TYPE_NODE,
};
use crate::errors::StoreError;
use meta::{meta_decode, meta_encode, meta_select, Meta};
use node::Node;
use page::{page_read_header, page_update_checksum, page_verify_checksum, page_write_header, PageHdr};

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug)]
pub struct Store {
    file: File,
    path: PathBuf,
    readonly: bool,
}

impl Store {
    /// Create a fresh store at `path` (error if the file exists) and return
    /// a read-write handle holding the exclusive lock.
    pub fn create(path: &Path) -> Result<Store, StoreError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;
        file.try_lock_exclusive()?;
        let store = Store {
            file,
            path: path.to_path_buf(),
            readonly: false,
        };
        let next = store.write_node_at(META_SLOTS, &Node::default().encode())?;
        let m = Meta {
            version: META_VERSION,
            page_size: PAGE_SIZE as u32,
            root_pid: META_SLOTS,
            page_count: next,
            txid: 0,
        };
        let mut buf = vec![0u8; PAGE_SIZE];
        meta_encode(&mut buf, &m);
        store.write_page(0, &buf)?;
        store.write_page(1, &buf)?;
        store.file.sync_all()?;
        Ok(store)
    }

    /// Open read-write (exclusive lock).
    pub fn open_rw(path: &Path, lock_timeout: Duration) -> Result<Store, StoreError> {
        Self::open_with(path, false, lock_timeout)
    }

    /// Open read-only (shared lock).
    pub fn open_ro(path: &Path, lock_timeout: Duration) -> Result<Store, StoreError> {
        Self::open_with(path, true, lock_timeout)
    }

    fn open_with(path: &Path, readonly: bool, lock_timeout: Duration) -> Result<Store, StoreError> {
        let file = OpenOptions::new().read(true).write(!readonly).open(path)?;
        lock_with_timeout(&file, path, !readonly, lock_timeout)?;
        let store = Store {
            file,
            path: path.to_path_buf(),
            readonly,
        };
        // Validate magic/version/CRC up front so a bad file fails at open,
        // not on the first read.
        store.load_meta()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Begin a snapshot-isolated read transaction.
    pub fn begin(&self) -> Result<ReadTx<'_>, StoreError> {
        ReadTx::new(self)
    }

    /// Begin a write transaction. One at a time per handle; callers must
    /// serialize writers themselves.
    pub fn begin_rw(&self) -> Result<WriteTx<'_>, StoreError> {
        WriteTx::new(self)
    }

    /// Release the file lock and drop the handle.
    pub fn close(self) -> Result<(), StoreError> {
        self.file.unlock()?;
        Ok(())
    }

    // -------- page / meta I/O --------

    pub(crate) fn load_meta(&self) -> Result<Meta, StoreError> {
        let mut slot0 = vec![0u8; PAGE_SIZE];
        self.read_page(0, &mut slot0)?;
        let mut slot1 = vec![0u8; PAGE_SIZE];
        match self.read_page(1, &mut slot1) {
            Ok(()) => meta_select(&slot0, &slot1),
            // A copy truncated after the first meta page still opens.
            Err(_) => meta_decode(&slot0),
        }
    }

    pub(crate) fn commit_meta(&self, m: &Meta) -> Result<(), StoreError> {
        let mut buf = vec![0u8; PAGE_SIZE];
        meta_encode(&mut buf, m);
        self.write_page(m.slot(), &buf)?;
        self.file.sync_all()?;
        Ok(())
    }

    pub(crate) fn sync(&self) -> Result<(), StoreError> {
        self.file.sync_all()?;
        Ok(())
    }

    fn read_page(&self, pid: u64, buf: &mut [u8]) -> Result<(), StoreError> {
        self.file
            .read_exact_at(buf, pid * PAGE_SIZE as u64)
            .map_err(StoreError::Io)
    }

    fn write_page(&self, pid: u64, buf: &[u8]) -> Result<(), StoreError> {
        if self.readonly {
            return Err(StoreError::ReadOnly);
        }
        self.file.write_all_at(buf, pid * PAGE_SIZE as u64)?;
        Ok(())
    }

    /// Read and decode the node chain starting at `pid`.
    pub(crate) fn read_node(&self, m: &Meta, pid: u64) -> Result<Node, StoreError> {
        let mut payload = Vec::new();
        let mut page = vec![0u8; PAGE_SIZE];
        let mut cur = pid;
        let mut hops: u64 = 0;
        while cur != NO_PAGE {
            if cur < META_SLOTS || cur >= m.page_count {
                return Err(StoreError::Corrupt(format!("page id {cur} out of range")));
            }
            hops += 1;
            if hops > m.page_count {
                return Err(StoreError::Corrupt("node page chain loops".into()));
            }
            self.read_page(cur, &mut page)?;
            if !page_verify_checksum(&page) {
                return Err(StoreError::Corrupt(format!("page {cur} checksum mismatch")));
            }
            let hdr = page_read_header(&page)?;
            if hdr.ptype != PAGE_TYPE_NODE {
                return Err(StoreError::Corrupt(format!(
                    "page {cur} has type {} (expected node)",
                    hdr.ptype
                )));
            }
            if hdr.page_id != cur {
                return Err(StoreError::Corrupt(format!(
                    "page {cur} claims id {}",
                    hdr.page_id
                )));
            }
            let frag = hdr.frag_len as usize;
            if frag > page_payload_capacity(PAGE_SIZE) {
                return Err(StoreError::Corrupt(format!(
                    "page {cur} fragment length {frag} exceeds capacity"
                )));
            }
            payload.extend_from_slice(&page[PAGE_HDR_SIZE..PAGE_HDR_SIZE + frag]);
            cur = hdr.next_page_id;
        }
        Node::decode(&payload)
    }

    /// Write `payload` as a node chain starting at `first_pid`; returns the
    /// next free page id.
    pub(crate) fn write_node_at(&self, first_pid: u64, payload: &[u8]) -> Result<u64, StoreError> {
        let cap = page_payload_capacity(PAGE_SIZE);
        let chunks = payload.len().div_ceil(cap).max(1) as u64;
        let mut page = vec![0u8; PAGE_SIZE];
        for i in 0..chunks {
            let start = i as usize * cap;
            let end = (start + cap).min(payload.len());
            let frag = &payload[start..end];
            let pid = first_pid + i;
            page.iter_mut().for_each(|b| *b = 0);
            page_write_header(
                &mut page,
                &PageHdr {
                    ptype: PAGE_TYPE_NODE,
                    page_id: pid,
                    next_page_id: if i + 1 < chunks { pid + 1 } else { NO_PAGE },
                    frag_len: frag.len() as u32,
                },
            );
            page[PAGE_HDR_SIZE..PAGE_HDR_SIZE + frag.len()].copy_from_slice(frag);
            page_update_checksum(&mut page);
            self.write_page(pid, &page)?;
        }
        Ok(first_pid + chunks)
    }
}

fn lock_with_timeout(
    file: &File,
    path: &Path,
    exclusive: bool,
    timeout: Duration,
) -> Result<(), StoreError> {
    let deadline = Instant::now() + timeout;
    loop {
        let res = if exclusive {
            fs2::FileExt::try_lock_exclusive(file)
        } else {
            fs2::FileExt::try_lock_shared(file)
        };
        match res {
            Ok(()) => return Ok(()),
            Err(e) if is_contended(&e) => {
                if Instant::now() >= deadline {
                    return Err(StoreError::LockTimeout {
                        path: path.to_path_buf(),
                    });
                }
                std::thread::sleep(LOCK_POLL_INTERVAL);
            }
            Err(e) => return Err(StoreError::Io(e)),
        }
    }
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
