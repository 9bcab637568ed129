//! assemble — raw record buckets into typed records.
//!
//! Decode policy, applied exactly:
//! - scalar keys are lenient: absent keys leave the zero value, a kind entry
//!   is interpreted only when it is exactly one byte, malformed varints
//!   decode to 0, and string fields decode lossily;
//! - timestamps and labels are strict: present-but-malformed bytes abort the
//!   record with a field-identifying error. Structural absence is normal
//!   data evolution; bad bytes in a present field are corruption and must
//!   not be masked.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use byteorder::{ByteOrder, LittleEndian};
use time::OffsetDateTime;

use crate::model::{SnapshotKind, SnapshotRecord, StorageMappingRecord};
use crate::schema;
use crate::store::{Bucket, Entry};
use crate::varint;

const TIMESTAMP_LEN: usize = 12;
const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Encode a timestamp as stored on disk: [unix seconds i64 LE][nanos u32 LE].
pub fn encode_timestamp(t: OffsetDateTime) -> [u8; TIMESTAMP_LEN] {
    let n = t.unix_timestamp_nanos();
    let secs = n.div_euclid(NANOS_PER_SEC) as i64;
    let nanos = n.rem_euclid(NANOS_PER_SEC) as u32;
    let mut out = [0u8; TIMESTAMP_LEN];
    LittleEndian::write_i64(&mut out[0..8], secs);
    LittleEndian::write_u32(&mut out[8..12], nanos);
    out
}

/// Strict inverse of [`encode_timestamp`].
pub fn decode_timestamp(raw: &[u8]) -> Result<OffsetDateTime> {
    if raw.len() != TIMESTAMP_LEN {
        bail!("timestamp is {} bytes (expected {})", raw.len(), TIMESTAMP_LEN);
    }
    let secs = LittleEndian::read_i64(&raw[0..8]);
    let nanos = LittleEndian::read_u32(&raw[8..12]);
    if i128::from(nanos) >= NANOS_PER_SEC {
        bail!("timestamp nanos {nanos} out of range");
    }
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(secs) * NANOS_PER_SEC + i128::from(nanos))
        .with_context(|| format!("timestamp seconds {secs} out of range"))
}

/// Assemble a snapshot record from its bucket.
pub fn snapshot_from_bucket(key: &str, bkt: &Bucket<'_>) -> Result<SnapshotRecord> {
    let mut rec = SnapshotRecord {
        key: key.to_string(),
        ..Default::default()
    };

    if let Some(raw) = bkt.get(schema::KEY_ID.as_bytes()) {
        rec.id = varint::uvarint(raw);
    }
    if let Some(raw) = bkt.get(schema::KEY_KIND.as_bytes()) {
        if raw.len() == 1 {
            rec.kind = SnapshotKind::from_byte(raw[0]);
        }
    }
    rec.parent = read_string(bkt, schema::KEY_PARENT);

    rec.created_at = read_timestamp(bkt, schema::KEY_CREATED_AT)?;
    rec.updated_at = read_timestamp(bkt, schema::KEY_UPDATED_AT)?;
    rec.labels = read_labels(bkt)?;

    if let Some(raw) = bkt.get(schema::KEY_INODES.as_bytes()) {
        rec.inodes = varint::varint(raw);
    }
    if let Some(raw) = bkt.get(schema::KEY_SIZE.as_bytes()) {
        rec.size = varint::varint(raw);
    }
    rec.content_id = read_string(bkt, schema::KEY_CONTENT_ID);
    rec.path = read_string(bkt, schema::KEY_PATH);

    Ok(rec)
}

/// Assemble a storage mapping record from its bucket.
pub fn mapping_from_bucket(content_id: &str, bkt: &Bucket<'_>) -> Result<StorageMappingRecord> {
    Ok(StorageMappingRecord {
        content_id: content_id.to_string(),
        lv_name: read_string(bkt, schema::KEY_LV_NAME),
        path: read_string(bkt, schema::KEY_PATH),
        status: read_string(bkt, schema::KEY_STATUS),
        snapshot_key: read_string(bkt, schema::KEY_SNAPSHOT_KEY),
    })
}

fn read_string(bkt: &Bucket<'_>, key: &str) -> String {
    bkt.get(key.as_bytes())
        .map(|raw| String::from_utf8_lossy(raw).into_owned())
        .unwrap_or_default()
}

fn read_timestamp(bkt: &Bucket<'_>, key: &str) -> Result<OffsetDateTime> {
    match bkt.get(key.as_bytes()) {
        Some(raw) => decode_timestamp(raw).with_context(|| format!("decode {key}")),
        None => Ok(OffsetDateTime::UNIX_EPOCH),
    }
}

fn read_labels(bkt: &Bucket<'_>) -> Result<BTreeMap<String, String>> {
    if bkt.get(schema::BUCKET_LABELS.as_bytes()).is_some() {
        bail!("labels entry is not a bucket");
    }
    let mut labels = BTreeMap::new();
    if let Some(lb) = bkt.bucket(schema::BUCKET_LABELS.as_bytes())? {
        for (k, entry) in lb.iter() {
            let key = std::str::from_utf8(k)
                .with_context(|| format!("label key {:?} is not valid utf-8", k))?;
            match entry {
                Entry::Value(v) => {
                    let value = std::str::from_utf8(v)
                        .with_context(|| format!("label {key} value is not valid utf-8"))?;
                    labels.insert(key.to_string(), value.to_string());
                }
                Entry::Bucket(_) => bail!("label {key} holds a nested bucket"),
            }
        }
    }
    Ok(labels)
}
