//! walker — schema-aware read operations on a [`MetaReader`].
//!
//! Every operation opens its own read transaction; none spans calls. List
//! operations never return partial results: one bad record aborts the call
//! with the offending key named.

use anyhow::{anyhow, Context, Result};

use crate::assemble;
use crate::model::{BucketSummary, SnapshotRecord, StorageMappingRecord};
use crate::reader::MetaReader;
use crate::schema;
use crate::store::{Bucket, ReadTx};

impl MetaReader {
    /// All top-level buckets with their direct key counts, in lexicographic
    /// order. An empty store yields an empty list.
    pub fn list_buckets(&self) -> Result<Vec<BucketSummary>> {
        let store = self.store()?;
        let tx = store.begin()?;
        let root = tx.root()?;
        let mut out = Vec::new();
        for (name, entry) in root.iter() {
            if !entry.is_bucket() {
                continue;
            }
            let child = root
                .bucket(name)?
                .ok_or_else(|| anyhow!("bucket {} vanished mid-scan", lossy(name)))?;
            out.push(BucketSummary {
                name: lossy(name),
                key_count: child.key_count(),
            });
        }
        Ok(out)
    }

    /// All snapshot records, in key order.
    pub fn list_snapshots(&self) -> Result<Vec<SnapshotRecord>> {
        let store = self.store()?;
        let tx = store.begin()?;
        let sbkt = snapshots_bucket(&tx)?;
        let mut out = Vec::new();
        for (key, entry) in sbkt.iter() {
            // scalar entries at this level are not snapshot records
            if !entry.is_bucket() {
                continue;
            }
            let child = sbkt
                .bucket(key)?
                .ok_or_else(|| anyhow!("snapshot {} vanished mid-scan", lossy(key)))?;
            let key = lossy(key);
            let rec = assemble::snapshot_from_bucket(&key, &child)
                .with_context(|| format!("read snapshot {key}"))?;
            out.push(rec);
        }
        Ok(out)
    }

    /// A single snapshot record by key.
    pub fn get_snapshot(&self, key: &str) -> Result<SnapshotRecord> {
        let store = self.store()?;
        let tx = store.begin()?;
        let sbkt = snapshots_bucket(&tx)?;
        let child = sbkt
            .bucket(key.as_bytes())?
            .ok_or_else(|| anyhow!("snapshot {key} not found"))?;
        assemble::snapshot_from_bucket(key, &child)
            .with_context(|| format!("read snapshot {key}"))
    }

    /// All storage mappings, in content-id order. A store without the
    /// mapping bucket is a valid empty result; the layer is optional.
    pub fn list_devbox_storage(&self) -> Result<Vec<StorageMappingRecord>> {
        let store = self.store()?;
        let tx = store.begin()?;
        let v1 = version_bucket(&tx)?;
        let dbkt = match v1.bucket(schema::BUCKET_DEVBOX_STORAGE.as_bytes())? {
            Some(b) => b,
            None => return Ok(Vec::new()),
        };
        let mut out = Vec::new();
        for (key, entry) in dbkt.iter() {
            if !entry.is_bucket() {
                continue;
            }
            let child = dbkt
                .bucket(key)?
                .ok_or_else(|| anyhow!("devbox storage {} vanished mid-scan", lossy(key)))?;
            let content_id = lossy(key);
            let rec = assemble::mapping_from_bucket(&content_id, &child)
                .with_context(|| format!("read devbox storage {content_id}"))?;
            out.push(rec);
        }
        Ok(out)
    }

    /// A single storage mapping by content id. Here the mapping bucket is
    /// required: the caller named a key they expect to exist.
    pub fn get_devbox_storage(&self, content_id: &str) -> Result<StorageMappingRecord> {
        let store = self.store()?;
        let tx = store.begin()?;
        let v1 = version_bucket(&tx)?;
        let dbkt = v1
            .bucket(schema::BUCKET_DEVBOX_STORAGE.as_bytes())?
            .ok_or_else(|| anyhow!("{} bucket not found", schema::BUCKET_DEVBOX_STORAGE))?;
        let child = dbkt
            .bucket(content_id.as_bytes())?
            .ok_or_else(|| anyhow!("devbox storage {content_id} not found"))?;
        assemble::mapping_from_bucket(content_id, &child)
            .with_context(|| format!("read devbox storage {content_id}"))
    }

    /// Snapshots matching both filters; an empty filter matches everything.
    /// Linear scan over `list_snapshots`, O(n) per search, fine at
    /// diagnostic volumes.
    pub fn search_snapshots(&self, content_id: &str, path: &str) -> Result<Vec<SnapshotRecord>> {
        let mut snapshots = self.list_snapshots()?;
        snapshots.retain(|s| {
            (content_id.is_empty() || s.content_id == content_id)
                && (path.is_empty() || s.path == path)
        });
        Ok(snapshots)
    }
}

fn version_bucket<'a>(tx: &'a ReadTx<'a>) -> Result<Bucket<'a>> {
    tx.bucket(schema::BUCKET_VERSION.as_bytes())?
        .ok_or_else(|| anyhow!("{} bucket not found", schema::BUCKET_VERSION))
}

fn snapshots_bucket<'a>(tx: &'a ReadTx<'a>) -> Result<Bucket<'a>> {
    version_bucket(tx)?
        .bucket(schema::BUCKET_SNAPSHOTS.as_bytes())?
        .ok_or_else(|| anyhow!("{} bucket not found", schema::BUCKET_SNAPSHOTS))
}

fn lossy(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}
