use super::*;
use record::Record;
use tempfile::tempdir;

// -------------------- Helpers --------------------

fn value_rec(key: &[u8], value: &[u8], tstamp: u32) -> Record {
    Record::value(key.to_vec(), value.to_vec(), tstamp)
}

fn scan_all(seg: &Segment) -> Result<Vec<(u64, Record)>, SegmentError> {
    let mut scanner = seg.scan()?;
    let mut out = Vec::new();
    while let Some(pair) = scanner.next_record()? {
        out.push(pair);
    }
    Ok(out)
}

// -------------------- Creation --------------------

#[test]
fn create_makes_empty_file_with_unique_name() {
    let dir = tempdir().unwrap();

    let a = Segment::create(dir.path(), SegmentId(0)).unwrap();
    let b = Segment::create(dir.path(), SegmentId(1)).unwrap();

    assert_ne!(a.path(), b.path());
    assert_eq!(a.size().unwrap(), 0);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

// -------------------- Append & positioned read --------------------

#[test]
fn append_returns_start_offsets() {
    let dir = tempdir().unwrap();
    let seg = Segment::create(dir.path(), SegmentId(0)).unwrap();

    let r1 = value_rec(b"a", b"first", 1);
    let r2 = value_rec(b"bb", b"second", 2);

    let o1 = seg.append(&r1).unwrap();
    let o2 = seg.append(&r2).unwrap();

    assert_eq!(o1, 0);
    assert_eq!(o2, r1.encoded_len() as u64);
    assert_eq!(seg.size().unwrap(), (r1.encoded_len() + r2.encoded_len()) as u64);
}

#[test]
fn read_record_at_offset() {
    let dir = tempdir().unwrap();
    let seg = Segment::create(dir.path(), SegmentId(0)).unwrap();

    let r1 = value_rec(b"a", b"first", 1);
    let r2 = value_rec(b"bb", b"second", 2);
    seg.append(&r1).unwrap();
    let o2 = seg.append(&r2).unwrap();

    let got = seg
        .read_record(o2, r2.key.len(), r2.value.len() as u32)
        .unwrap();
    assert_eq!(got, r2);
}

#[test]
fn read_record_past_eof_is_corruption() {
    let dir = tempdir().unwrap();
    let seg = Segment::create(dir.path(), SegmentId(0)).unwrap();
    seg.append(&value_rec(b"k", b"v", 1)).unwrap();

    let err = seg.read_record(10, 1, 1).unwrap_err();
    assert!(matches!(err, SegmentError::Truncated(10)));
}

// -------------------- Scan --------------------

#[test]
fn scan_yields_records_in_file_order() {
    let dir = tempdir().unwrap();
    let seg = Segment::create(dir.path(), SegmentId(0)).unwrap();

    let recs = vec![
        value_rec(b"a", b"1", 10),
        Record::tombstone(b"a".to_vec(), 11),
        value_rec(b"b", b"2", 12),
    ];
    let mut offsets = Vec::new();
    for r in &recs {
        offsets.push(seg.append(r).unwrap());
    }

    let scanned = scan_all(&seg).unwrap();
    assert_eq!(scanned.len(), 3);
    for (i, (offset, record)) in scanned.iter().enumerate() {
        assert_eq!(*offset, offsets[i]);
        assert_eq!(*record, recs[i]);
    }
}

#[test]
fn scan_empty_segment_terminates_cleanly() {
    let dir = tempdir().unwrap();
    let seg = Segment::create(dir.path(), SegmentId(0)).unwrap();

    assert!(scan_all(&seg).unwrap().is_empty());
}

#[test]
fn scan_detects_torn_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("torn");
    // 7 stray bytes: not even a full header.
    std::fs::write(&path, [0u8; 7]).unwrap();

    let seg = Segment::open(path, SegmentId(0));
    let err = scan_all(&seg).unwrap_err();
    assert!(matches!(err, SegmentError::Truncated(0)));
}

#[test]
fn scan_detects_truncated_payload() {
    let dir = tempdir().unwrap();
    let seg = Segment::create(dir.path(), SegmentId(0)).unwrap();
    seg.append(&value_rec(b"key", b"value", 1)).unwrap();

    // Chop the last value byte off.
    let len = seg.size().unwrap();
    let file = OpenOptions::new().write(true).open(seg.path()).unwrap();
    file.set_len(len - 1).unwrap();

    let err = scan_all(&seg).unwrap_err();
    assert!(matches!(err, SegmentError::Truncated(0)));
}

// -------------------- First record --------------------

#[test]
fn first_record_of_empty_segment_is_none() {
    let dir = tempdir().unwrap();
    let seg = Segment::create(dir.path(), SegmentId(0)).unwrap();

    assert!(Segment::first_record(seg.path()).unwrap().is_none());
}

#[test]
fn first_record_returns_lead_record_only() {
    let dir = tempdir().unwrap();
    let seg = Segment::create(dir.path(), SegmentId(0)).unwrap();

    let first = value_rec(b"a", b"1", 100);
    seg.append(&first).unwrap();
    seg.append(&value_rec(b"b", b"2", 200)).unwrap();

    let got = Segment::first_record(seg.path()).unwrap().unwrap();
    assert_eq!(got, first);
    assert_eq!(got.tstamp, 100);
}
