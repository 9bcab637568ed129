//! store/tx — read transactions, bucket handles, and the minimal write path.

use std::collections::BTreeMap;

use crate::errors::StoreError;

use super::meta::Meta;
use super::node::{Entry, Node};
use super::Store;

// -------------------- read side --------------------

/// Snapshot-isolated read transaction: the meta captured at `begin` pins the
/// root, and committed pages are never rewritten, so every node loaded
/// through this transaction belongs to one consistent tree.
pub struct ReadTx<'s> {
    store: &'s Store,
    meta: Meta,
}

impl<'s> ReadTx<'s> {
    pub(crate) fn new(store: &'s Store) -> Result<Self, StoreError> {
        Ok(Self {
            meta: store.load_meta()?,
            store,
        })
    }

    pub fn txid(&self) -> u64 {
        self.meta.txid
    }

    /// The root bucket (top-level buckets live here).
    pub fn root(&self) -> Result<Bucket<'_>, StoreError> {
        self.load(self.meta.root_pid)
    }

    /// Shorthand for a top-level bucket lookup.
    pub fn bucket(&self, name: &[u8]) -> Result<Option<Bucket<'_>>, StoreError> {
        self.root()?.bucket(name)
    }

    fn load(&self, pid: u64) -> Result<Bucket<'_>, StoreError> {
        Ok(Bucket {
            tx: self,
            node: self.store.read_node(&self.meta, pid)?,
        })
    }
}

/// A decoded bucket inside a read transaction.
pub struct Bucket<'a> {
    tx: &'a ReadTx<'a>,
    node: Node,
}

impl<'a> Bucket<'a> {
    /// Value stored under `key`. Sub-bucket entries yield `None`.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        match self.node.get(key) {
            Some(Entry::Value(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Child bucket under `name`. Plain value entries yield `Ok(None)`,
    /// mirroring how absent buckets read.
    pub fn bucket(&self, name: &[u8]) -> Result<Option<Bucket<'a>>, StoreError> {
        match self.node.get(name) {
            Some(Entry::Bucket(pid)) => Ok(Some(self.tx.load(*pid)?)),
            _ => Ok(None),
        }
    }

    /// Direct entries in lexicographic key order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &Entry)> {
        self.node.entries.iter().map(|(k, e)| (k.as_slice(), e))
    }

    /// Number of direct keys (values and sub-buckets).
    pub fn key_count(&self) -> u64 {
        self.node.entries.len() as u64
    }
}

// -------------------- write side --------------------

#[derive(Debug, Default)]
struct MemNode {
    entries: BTreeMap<Vec<u8>, MemEntry>,
}

#[derive(Debug)]
enum MemEntry {
    Value(Vec<u8>),
    Bucket(MemNode),
}

/// Write transaction over an in-memory copy of the bucket tree. `commit`
/// serializes the tree bottom-up into appended pages, syncs, then flips the
/// alternate meta slot. Suits metadata-scale stores; the inspector itself
/// never opens one.
pub struct WriteTx<'s> {
    store: &'s Store,
    meta: Meta,
    root: MemNode,
}

impl<'s> WriteTx<'s> {
    pub(crate) fn new(store: &'s Store) -> Result<Self, StoreError> {
        if store.is_readonly() {
            return Err(StoreError::ReadOnly);
        }
        let meta = store.load_meta()?;
        let root = load_mem(store, &meta, meta.root_pid)?;
        Ok(Self { store, meta, root })
    }

    /// Create the bucket at `path`, creating intermediate buckets as needed.
    /// Creating an existing bucket is a no-op.
    pub fn create_bucket(&mut self, path: &[&[u8]]) -> Result<(), StoreError> {
        let mut node = &mut self.root;
        for seg in path {
            node = match node
                .entries
                .entry(seg.to_vec())
                .or_insert_with(|| MemEntry::Bucket(MemNode::default()))
            {
                MemEntry::Bucket(child) => child,
                MemEntry::Value(_) => {
                    return Err(StoreError::InvalidPath(format!(
                        "{} is not a bucket",
                        String::from_utf8_lossy(seg)
                    )))
                }
            };
        }
        Ok(())
    }

    /// Put a value into the bucket at `path`. Every path segment must
    /// already be a bucket.
    pub fn put(&mut self, path: &[&[u8]], key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let node = lookup_mut(&mut self.root, path)?;
        if let Some(MemEntry::Bucket(_)) = node.entries.get(key) {
            return Err(StoreError::InvalidPath(format!(
                "{} already holds a bucket",
                String::from_utf8_lossy(key)
            )));
        }
        node.entries
            .insert(key.to_vec(), MemEntry::Value(value.to_vec()));
        Ok(())
    }

    pub fn commit(self) -> Result<(), StoreError> {
        let mut next_pid = self.meta.page_count;
        let root_pid = write_mem(self.store, &self.root, &mut next_pid)?;
        self.store.sync()?;
        self.store.commit_meta(&Meta {
            version: self.meta.version,
            page_size: self.meta.page_size,
            root_pid,
            page_count: next_pid,
            txid: self.meta.txid + 1,
        })
    }
}

fn lookup_mut<'n>(
    root: &'n mut MemNode,
    path: &[&[u8]],
) -> Result<&'n mut MemNode, StoreError> {
    let mut node = root;
    for seg in path {
        node = match node.entries.get_mut(*seg) {
            Some(MemEntry::Bucket(child)) => child,
            Some(MemEntry::Value(_)) => {
                return Err(StoreError::InvalidPath(format!(
                    "{} is not a bucket",
                    String::from_utf8_lossy(seg)
                )))
            }
            None => {
                return Err(StoreError::InvalidPath(format!(
                    "bucket {} not found",
                    String::from_utf8_lossy(seg)
                )))
            }
        };
    }
    Ok(node)
}

fn load_mem(store: &Store, meta: &Meta, pid: u64) -> Result<MemNode, StoreError> {
    let node = store.read_node(meta, pid)?;
    let mut out = MemNode::default();
    for (key, entry) in node.entries {
        let e = match entry {
            Entry::Value(v) => MemEntry::Value(v),
            Entry::Bucket(child_pid) => MemEntry::Bucket(load_mem(store, meta, child_pid)?),
        };
        out.entries.insert(key, e);
    }
    Ok(out)
}

/// Serialize `node` (children first), returning its page id.
fn write_mem(store: &Store, node: &MemNode, next_pid: &mut u64) -> Result<u64, StoreError> {
    let mut out = Node::default();
    for (key, entry) in &node.entries {
        let e = match entry {
            MemEntry::Value(v) => Entry::Value(v.clone()),
            MemEntry::Bucket(child) => Entry::Bucket(write_mem(store, child, next_pid)?),
        };
        out.entries.push((key.clone(), e));
    }
    let first = *next_pid;
    *next_pid = store.write_node_at(first, &out.encode())?;
    Ok(first)
}
