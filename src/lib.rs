// Base modules
pub mod consts;
pub mod errors;
pub mod varint;

// Store engine (folder with mod.rs)
pub mod store; // src/store/{mod,meta,page,node,tx}.rs

// Metadata layer
pub mod schema;
pub mod model;
pub mod assemble;
pub mod reader;
pub mod walker;

// Convenient re-exports
pub use errors::StoreError;
pub use model::{BucketSummary, SnapshotKind, SnapshotRecord, StorageMappingRecord};
pub use reader::MetaReader;
pub use store::{Bucket, Entry, ReadTx, Store, WriteTx};
