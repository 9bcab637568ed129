//! model — typed records returned by the walker.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::schema;

/// Snapshot lifecycle kind. Unrecognized stored bytes decode to `Unknown`
/// instead of failing the record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    #[default]
    Unknown,
    View,
    Active,
    Committed,
}

impl SnapshotKind {
    pub fn from_byte(b: u8) -> Self {
        match b {
            schema::KIND_VIEW => SnapshotKind::View,
            schema::KIND_ACTIVE => SnapshotKind::Active,
            schema::KIND_COMMITTED => SnapshotKind::Committed,
            _ => SnapshotKind::Unknown,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            SnapshotKind::View => schema::KIND_VIEW,
            SnapshotKind::Active => schema::KIND_ACTIVE,
            SnapshotKind::Committed => schema::KIND_COMMITTED,
            SnapshotKind::Unknown => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SnapshotKind::View => "view",
            SnapshotKind::Active => "active",
            SnapshotKind::Committed => "committed",
            SnapshotKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One snapshot record from the `v1/snapshots` bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub key: String,
    pub id: u64,
    pub kind: SnapshotKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    pub inodes: i64,
    pub size: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
}

impl Default for SnapshotRecord {
    fn default() -> Self {
        Self {
            key: String::new(),
            id: 0,
            kind: SnapshotKind::Unknown,
            parent: String::new(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            labels: BTreeMap::new(),
            inodes: 0,
            size: 0,
            content_id: String::new(),
            path: String::new(),
        }
    }
}

/// One storage mapping from the `v1/devbox_storage_path` bucket. `status`
/// stays empty when absent; placeholders are a rendering concern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageMappingRecord {
    pub content_id: String,
    #[serde(default)]
    pub lv_name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub snapshot_key: String,
}

/// A top-level bucket and its direct key count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSummary {
    pub name: String,
    pub key_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn kind_byte_mapping() {
        assert_eq!(SnapshotKind::from_byte(1), SnapshotKind::View);
        assert_eq!(SnapshotKind::from_byte(2), SnapshotKind::Active);
        assert_eq!(SnapshotKind::from_byte(3), SnapshotKind::Committed);
        assert_eq!(SnapshotKind::from_byte(0), SnapshotKind::Unknown);
        assert_eq!(SnapshotKind::from_byte(0x7f), SnapshotKind::Unknown);
        assert_eq!(SnapshotKind::Active.to_string(), "active");
    }

    #[test]
    fn snapshot_json_shape() {
        let rec = SnapshotRecord {
            key: "snapshot-1".into(),
            id: 1,
            kind: SnapshotKind::Active,
            created_at: datetime!(2024-05-01 12:30:00 UTC),
            updated_at: datetime!(2024-05-01 12:30:00 UTC),
            ..Default::default()
        };
        let v: serde_json::Value = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["key"], "snapshot-1");
        assert_eq!(v["kind"], "active");
        let created = v["created_at"].as_str().unwrap();
        assert!(
            created.starts_with("2024-05-01T12:30:00"),
            "created_at: {created}"
        );
        // empty optionals are omitted
        assert!(v.get("parent").is_none());
        assert!(v.get("labels").is_none());
        assert!(v.get("content_id").is_none());

        let back: SnapshotRecord = serde_json::from_value(v).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn mapping_json_shape() {
        let rec = StorageMappingRecord {
            content_id: "content-123".into(),
            lv_name: "lv-1".into(),
            path: "/mnt/1".into(),
            status: String::new(),
            snapshot_key: String::new(),
        };
        let v: serde_json::Value = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["status"], "");
        assert!(v.get("snapshot_key").is_none());
    }
}
