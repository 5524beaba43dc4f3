/// Cold-start path: enumerate the store directory, order segments by lead
/// timestamp, and replay every record front-to-back into a fresh keydir.
///
/// The sort key is the `tstamp` of each segment's first record — file names
/// are random and carry no ordering. Rotation is time-correlated, so
/// ascending lead timestamps approximate write order and simple in-order
/// replay realizes newest-wins. Same-second ties are broken by file name,
/// which is stable across runs.
use anyhow::{Context, Result};
use keydir::{Keydir, Locator};
use segment::{Segment, SegmentId};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lead timestamp assigned to a zero-length segment so it sorts last: the
/// only empty segment a clean store can hold is a freshly rotated (or
/// freshly created) active tail.
const EMPTY_SEGMENT_LEAD: u32 = u32::MAX;

/// Rebuilds the segment list and keydir from the files in `dir`.
///
/// Returns segments in replay order — the caller designates the last one as
/// the active segment. Recovery is strictly single-threaded; a malformed
/// record aborts the whole open with no partial state exposed.
pub(crate) fn recover(dir: &Path) -> Result<(Vec<Segment>, Keydir)> {
    let mut leads: Vec<(u32, PathBuf)> = Vec::new();

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read store directory {}", dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();

        let lead = Segment::first_record(&path)
            .with_context(|| format!("failed to read lead record of {}", path.display()))?
            .map(|record| record.tstamp)
            .unwrap_or(EMPTY_SEGMENT_LEAD);
        leads.push((lead, path));
    }

    leads.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| a.1.file_name().cmp(&b.1.file_name()))
    });

    let mut keydir = Keydir::new();
    let mut segments = Vec::with_capacity(leads.len());

    for (i, (_, path)) in leads.into_iter().enumerate() {
        let seg = Segment::open(path, SegmentId(i as u64));
        replay_segment(&seg, &mut keydir)?;
        segments.push(seg);
    }

    Ok((segments, keydir))
}

/// Scans one segment front-to-back, applying each record to the keydir:
/// a tombstone removes its key, anything else overwrites the locator.
fn replay_segment(seg: &Segment, keydir: &mut Keydir) -> Result<()> {
    let mut scanner = seg
        .scan()
        .with_context(|| format!("failed to open segment {}", seg.path().display()))?;

    let mut replayed = 0usize;
    while let Some((offset, record)) = scanner
        .next_record()
        .with_context(|| format!("corrupt record in segment {}", seg.path().display()))?
    {
        if record.is_tombstone() {
            keydir.remove(&record.key);
        } else {
            let value_sz = record.value.len() as u32;
            keydir.insert(
                record.key,
                Locator {
                    segment: seg.id(),
                    value_sz,
                    offset,
                    tstamp: record.tstamp,
                },
            );
        }
        replayed += 1;
    }

    debug!(
        segment = %seg.id(),
        path = %seg.path().display(),
        records = replayed,
        "replayed segment"
    );

    Ok(())
}
