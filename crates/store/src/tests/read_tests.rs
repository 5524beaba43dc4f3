use crate::*;
use anyhow::Result;
use tempfile::tempdir;

// --------------------- get ---------------------

#[test]
fn get_missing_key_is_none_not_error() -> Result<()> {
    let dir = tempdir()?;
    let store = Store::open(dir.path().join("db"))?;

    assert!(store.get(b"nope")?.is_none());
    Ok(())
}

#[test]
fn get_reads_across_sealed_segments() -> Result<()> {
    let dir = tempdir()?;
    let mut store = Store::open_with(dir.path().join("db"), 64)?;

    for i in 0..10u32 {
        store.put(format!("key{}", i).into_bytes(), vec![b'x'; 16])?;
    }
    assert!(store.segment_count() >= 2, "test needs sealed segments");

    // The early keys now live in sealed segments; reads must follow the
    // keydir into them.
    for i in 0..10u32 {
        let key = format!("key{}", i).into_bytes();
        assert_eq!(store.get(&key)?.unwrap(), vec![b'x'; 16]);
    }
    Ok(())
}

#[test]
fn get_returns_latest_of_many_overwrites() -> Result<()> {
    let dir = tempdir()?;
    let mut store = Store::open_with(dir.path().join("db"), 64)?;

    for i in 0..50u32 {
        store.put(b"counter".to_vec(), format!("{}", i).into_bytes())?;
    }
    assert_eq!(store.get(b"counter")?.unwrap(), b"49");
    Ok(())
}

// --------------------- keys ---------------------

#[test]
fn keys_on_fresh_store_is_empty() -> Result<()> {
    let dir = tempdir()?;
    let store = Store::open(dir.path().join("db"))?;

    assert!(store.keys().is_empty());
    assert!(store.is_empty());
    Ok(())
}

#[test]
fn keys_reflects_puts_and_deletes() -> Result<()> {
    let dir = tempdir()?;
    let mut store = Store::open(dir.path().join("db"))?;

    store.put(b"a".to_vec(), b"1".to_vec())?;
    store.put(b"b".to_vec(), b"2".to_vec())?;
    store.put(b"c".to_vec(), b"3".to_vec())?;
    store.delete(b"b".to_vec())?;

    let mut keys = store.keys();
    keys.sort();
    assert_eq!(keys, vec![b"a".to_vec(), b"c".to_vec()]);
    assert_eq!(store.len(), 2);
    Ok(())
}

#[test]
fn keys_ignores_tombstoned_then_rewritten_history() -> Result<()> {
    let dir = tempdir()?;
    let mut store = Store::open(dir.path().join("db"))?;

    store.put(b"k".to_vec(), b"v1".to_vec())?;
    store.delete(b"k".to_vec())?;
    store.put(b"k".to_vec(), b"v2".to_vec())?;

    assert_eq!(store.keys(), vec![b"k".to_vec()]);
    Ok(())
}
