// tests/store_smoke.rs
//
// Engine basics: create/open/read-back, lexicographic iteration, chained
// node pages, snapshot isolation, lock timeout, and open failure modes.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use metaview::store::{Entry, Store};
use metaview::StoreError;

fn unique_path(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("metaview-{prefix}-{pid}-{t}.db"))
}

#[test]
fn create_write_reopen_read() -> Result<()> {
    let path = unique_path("smoke");

    // 1) create + populate
    {
        let store = Store::create(&path)?;
        let mut tx = store.begin_rw()?;
        tx.create_bucket(&[b"config"])?;
        tx.put(&[b"config"], b"zeta", b"3")?;
        tx.put(&[b"config"], b"alpha", b"1")?;
        tx.put(&[b"config"], b"mid", b"2")?;
        tx.create_bucket(&[b"config", b"nested"])?;
        tx.put(&[b"config", b"nested"], b"inner", b"x")?;
        tx.commit()?;
        store.close()?;
    }

    // 2) read-only reopen: values, counts, order
    let store = Store::open_ro(&path, Duration::from_secs(1))?;
    let tx = store.begin()?;
    let config = tx.bucket(b"config")?.expect("config bucket must exist");
    assert_eq!(config.key_count(), 4);
    assert_eq!(config.get(b"alpha"), Some(b"1".as_slice()));
    assert_eq!(config.get(b"missing"), None);
    // a sub-bucket entry is not a value
    assert_eq!(config.get(b"nested"), None);

    let keys: Vec<Vec<u8>> = config.iter().map(|(k, _)| k.to_vec()).collect();
    assert_eq!(
        keys,
        vec![
            b"alpha".to_vec(),
            b"mid".to_vec(),
            b"nested".to_vec(),
            b"zeta".to_vec()
        ]
    );

    let nested = config.bucket(b"nested")?.expect("nested bucket");
    assert_eq!(nested.get(b"inner"), Some(b"x".as_slice()));
    // a plain value is not a bucket
    assert!(config.bucket(b"alpha")?.is_none());

    store.close()?;
    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn empty_store_has_empty_root() -> Result<()> {
    let path = unique_path("empty");
    let store = Store::create(&path)?;
    let tx = store.begin()?;
    assert_eq!(tx.root()?.key_count(), 0);
    assert!(tx.bucket(b"anything")?.is_none());
    drop(tx);
    store.close()?;
    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn large_bucket_spans_pages() -> Result<()> {
    let path = unique_path("chain");
    {
        let store = Store::create(&path)?;
        let mut tx = store.begin_rw()?;
        tx.create_bucket(&[b"bulk"])?;
        for i in 0..300u32 {
            let key = format!("key-{i:06}-{}", "x".repeat(24));
            let val = format!("value-{i:06}");
            tx.put(&[b"bulk"], key.as_bytes(), val.as_bytes())?;
        }
        tx.commit()?;
        store.close()?;
    }

    let store = Store::open_ro(&path, Duration::from_secs(1))?;
    let tx = store.begin()?;
    let bulk = tx.bucket(b"bulk")?.expect("bulk bucket");
    assert_eq!(bulk.key_count(), 300);
    let probe = format!("key-{:06}-{}", 123, "x".repeat(24));
    assert_eq!(bulk.get(probe.as_bytes()), Some(b"value-000123".as_slice()));
    drop(tx);
    store.close()?;
    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn read_tx_keeps_its_snapshot() -> Result<()> {
    let path = unique_path("mvcc");
    let store = Store::create(&path)?;

    let mut tx = store.begin_rw()?;
    tx.create_bucket(&[b"items"])?;
    tx.put(&[b"items"], b"a", b"old")?;
    tx.commit()?;

    // snapshot before the second commit
    let snap = store.begin()?;
    let txid0 = snap.txid();

    let mut tx = store.begin_rw()?;
    tx.put(&[b"items"], b"a", b"new")?;
    tx.put(&[b"items"], b"b", b"fresh")?;
    tx.commit()?;

    // the old transaction still reads the old root
    let items = snap.bucket(b"items")?.expect("items");
    assert_eq!(items.get(b"a"), Some(b"old".as_slice()));
    assert_eq!(items.get(b"b"), None);
    assert_eq!(items.key_count(), 1);

    // a fresh transaction sees the new state
    let now = store.begin()?;
    assert_eq!(now.txid(), txid0 + 1);
    let items = now.bucket(b"items")?.expect("items");
    assert_eq!(items.get(b"a"), Some(b"new".as_slice()));
    assert_eq!(items.key_count(), 2);

    drop(snap);
    drop(now);
    store.close()?;
    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn shared_open_times_out_against_exclusive_holder() -> Result<()> {
    let path = unique_path("lock");
    let writer = Store::create(&path)?;

    match Store::open_ro(&path, Duration::from_millis(200)) {
        Err(StoreError::LockTimeout { path: p }) => assert_eq!(p, path),
        Err(other) => panic!("expected LockTimeout, got {other:?}"),
        Ok(_) => panic!("expected LockTimeout, open succeeded"),
    }

    // once the writer is gone, the shared open succeeds
    writer.close()?;
    let reader = Store::open_ro(&path, Duration::from_millis(200))?;
    reader.close()?;
    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn open_failures_are_not_timeouts() -> Result<()> {
    // missing file
    let missing = unique_path("missing");
    match Store::open_ro(&missing, Duration::from_millis(100)) {
        Err(StoreError::Io(_)) => {}
        Err(other) => panic!("expected Io error, got {other:?}"),
        Ok(_) => panic!("open of a missing file succeeded"),
    }

    // garbage file
    let garbage = unique_path("garbage");
    fs::write(&garbage, b"not a store at all")?;
    match Store::open_ro(&garbage, Duration::from_millis(100)) {
        Err(StoreError::Io(_)) | Err(StoreError::Corrupt(_)) => {}
        Err(other) => panic!("expected Io/Corrupt error, got {other:?}"),
        Ok(_) => panic!("open of a garbage file succeeded"),
    }
    fs::remove_file(&garbage)?;
    Ok(())
}

#[test]
fn readonly_handle_rejects_writes() -> Result<()> {
    let path = unique_path("ro");
    Store::create(&path)?.close()?;

    let store = Store::open_ro(&path, Duration::from_secs(1))?;
    match store.begin_rw() {
        Err(StoreError::ReadOnly) => {}
        other => panic!("expected ReadOnly, got {:?}", other.err()),
    }
    store.close()?;
    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn trailing_garbage_does_not_prevent_open() -> Result<()> {
    let path = unique_path("torn");
    {
        let store = Store::create(&path)?;
        let mut tx = store.begin_rw()?;
        tx.create_bucket(&[b"data"])?;
        tx.put(&[b"data"], b"k", b"v")?;
        tx.commit()?;
        store.close()?;
    }

    // a copy taken mid-append may carry a ragged tail past the live meta
    let torn = unique_path("torn-copy");
    let mut bytes = fs::read(&path)?;
    bytes.extend_from_slice(&[0xAB; 1234]);
    fs::write(&torn, &bytes)?;

    let store = Store::open_ro(&torn, Duration::from_secs(1))?;
    let tx = store.begin()?;
    let data = tx.bucket(b"data")?.expect("data bucket");
    assert_eq!(data.get(b"k"), Some(b"v".as_slice()));
    drop(tx);
    store.close()?;

    fs::remove_file(&path)?;
    fs::remove_file(&torn)?;
    Ok(())
}

#[test]
fn entry_kinds_visible_through_iter() -> Result<()> {
    let path = unique_path("entries");
    {
        let store = Store::create(&path)?;
        let mut tx = store.begin_rw()?;
        tx.create_bucket(&[b"mixed", b"sub"])?;
        tx.put(&[b"mixed"], b"plain", b"1")?;
        tx.commit()?;
        store.close()?;
    }

    let store = Store::open_ro(&path, Duration::from_secs(1))?;
    let tx = store.begin()?;
    let mixed = tx.bucket(b"mixed")?.expect("mixed");
    let kinds: Vec<(Vec<u8>, bool)> = mixed
        .iter()
        .map(|(k, e)| (k.to_vec(), matches!(e, Entry::Bucket(_))))
        .collect();
    assert_eq!(
        kinds,
        vec![(b"plain".to_vec(), false), (b"sub".to_vec(), true)]
    );
    drop(tx);
    store.close()?;
    fs::remove_file(&path)?;
    Ok(())
}
