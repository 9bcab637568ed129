// tests/locked_fallback.rs
//
// Resilient opener semantics:
// - a writer-held store is read through a temporary copy;
// - the copy is deleted on close and never leaks on error paths;
// - operations after close fail with the closed-handle condition;
// - unlocked stores are opened directly (no temp copy).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use metaview::store::Store;
use metaview::{schema, varint, MetaReader};

fn unique_path(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("metaview-fallback-{prefix}-{pid}-{t}.db"))
}

/// Minimal snapshot fixture: one record with just an id.
fn build_store(path: &Path) -> Result<Store> {
    let store = Store::create(path)?;
    let mut tx = store.begin_rw()?;
    let p: &[&[u8]] = &[
        schema::BUCKET_VERSION.as_bytes(),
        schema::BUCKET_SNAPSHOTS.as_bytes(),
        b"snapshot-1",
    ];
    tx.create_bucket(p)?;
    tx.put(p, schema::KEY_ID.as_bytes(), &varint::uvarint_vec(1))?;
    tx.commit()?;
    Ok(store)
}

#[test]
fn locked_store_is_read_through_a_copy() -> Result<()> {
    let path = unique_path("locked");
    // keep the writer handle open: its exclusive lock stays held
    let writer = build_store(&path)?;

    let mut reader = MetaReader::open(&path)?;
    let tmp = reader
        .temp_copy()
        .expect("fallback must produce a temp copy")
        .to_path_buf();
    assert!(tmp.exists(), "temp copy must exist while the handle is open");
    assert_ne!(tmp, path);

    // reads go through the copy and match the source content
    let snapshots = reader.list_snapshots()?;
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].key, "snapshot-1");
    assert_eq!(snapshots[0].id, 1);

    // close removes the copy
    reader.close()?;
    assert!(!tmp.exists(), "temp copy must be removed by close");

    writer.close()?;
    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn unlocked_store_opens_directly() -> Result<()> {
    let path = unique_path("direct");
    build_store(&path)?.close()?;

    let reader = MetaReader::open(&path)?;
    assert!(reader.temp_copy().is_none());
    assert_eq!(reader.list_snapshots()?.len(), 1);
    drop(reader);
    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn two_readers_share_the_store() -> Result<()> {
    let path = unique_path("shared");
    build_store(&path)?.close()?;

    // shared locks coexist; neither needs the copy fallback
    let a = MetaReader::open(&path)?;
    let b = MetaReader::open(&path)?;
    assert!(a.temp_copy().is_none());
    assert!(b.temp_copy().is_none());
    assert_eq!(a.list_snapshots()?.len(), 1);
    assert_eq!(b.list_snapshots()?.len(), 1);
    drop(a);
    drop(b);
    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn operations_after_close_report_closed_handle() -> Result<()> {
    let path = unique_path("closed");
    build_store(&path)?.close()?;

    let mut reader = MetaReader::open(&path)?;
    reader.close()?;
    // closing again is a no-op
    reader.close()?;

    let err = reader.list_buckets().unwrap_err();
    assert!(
        err.to_string().contains("closed"),
        "expected closed-handle error, got: {err:#}"
    );
    let err = reader.list_snapshots().unwrap_err();
    assert!(err.to_string().contains("closed"), "err: {err:#}");

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn missing_store_fails_without_fallback() -> Result<()> {
    let path = unique_path("missing");
    let err = MetaReader::open(&path).unwrap_err();
    let msg = format!("{err:#}");
    assert!(
        msg.contains(path.to_str().unwrap()),
        "error must name the path, got: {msg}"
    );
    Ok(())
}

#[test]
fn drop_cleans_up_the_temp_copy() -> Result<()> {
    let path = unique_path("drop");
    let writer = build_store(&path)?;

    let tmp = {
        let reader = MetaReader::open(&path)?;
        let tmp = reader.temp_copy().expect("temp copy").to_path_buf();
        assert!(tmp.exists());
        tmp
        // reader dropped here without an explicit close
    };
    assert!(!tmp.exists(), "drop must remove the temp copy");

    writer.close()?;
    fs::remove_file(&path)?;
    Ok(())
}
