//! schema — the fixed bucket layout of a snapshotter metadata store.
//!
//! Everything the walker and assembler know about the on-disk layout lives
//! here, so required-vs-optional semantics stay auditable in one place:
//!
//! ```text
//! root
//! └── "v1"                      required by every record operation
//!     ├── "snapshots"           required by snapshot operations
//!     │   └── <key>             one bucket per snapshot record
//!     │       ├── "id"          uvarint            optional, default 0
//!     │       ├── "kind"        single byte        optional, default unknown
//!     │       ├── "parent"      string             optional, default ""
//!     │       ├── "createdat"   12-byte timestamp  optional; malformed = error
//!     │       ├── "updatedat"   12-byte timestamp  optional; malformed = error
//!     │       ├── "labels"      sub-bucket k/v     optional; malformed = error
//!     │       ├── "inodes"      varint             optional, default 0
//!     │       ├── "size"        varint             optional, default 0
//!     │       ├── "content_id"  string             optional, default ""
//!     │       └── "path"        string             optional, default ""
//!     ├── "devbox_storage_path" optional for list, required for get
//!     │   └── <content_id>      one bucket per storage mapping
//!     │       ├── "lv_name"     string             optional, default ""
//!     │       ├── "path"        string             optional, default ""
//!     │       ├── "status"      string             optional, default ""
//!     │       └── "snapshot_key" string            optional, default ""
//!     └── "parents"             reserved, no read path
//! ```

// -------- Buckets --------
pub const BUCKET_VERSION: &str = "v1";
pub const BUCKET_SNAPSHOTS: &str = "snapshots";
pub const BUCKET_PARENTS: &str = "parents";
pub const BUCKET_DEVBOX_STORAGE: &str = "devbox_storage_path";
pub const BUCKET_LABELS: &str = "labels";

// -------- Snapshot record keys --------
pub const KEY_ID: &str = "id";
pub const KEY_KIND: &str = "kind";
pub const KEY_PARENT: &str = "parent";
pub const KEY_CREATED_AT: &str = "createdat";
pub const KEY_UPDATED_AT: &str = "updatedat";
pub const KEY_INODES: &str = "inodes";
pub const KEY_SIZE: &str = "size";
pub const KEY_CONTENT_ID: &str = "content_id";
pub const KEY_PATH: &str = "path";

// -------- Storage mapping keys --------
pub const KEY_LV_NAME: &str = "lv_name";
pub const KEY_STATUS: &str = "status";
pub const KEY_SNAPSHOT_KEY: &str = "snapshot_key";

// -------- Kind codes --------
pub const KIND_VIEW: u8 = 1;
pub const KIND_ACTIVE: u8 = 2;
pub const KIND_COMMITTED: u8 = 3;
