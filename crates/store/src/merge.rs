/// Merge: rewrites the sealed segments down to a minimal set holding only
/// the newest live value for each key, then retires the originals.
///
/// The active segment is never compacted. Relocated records keep their
/// ORIGINAL timestamps — a compacted copy stamped with the current time
/// would shadow any write that landed in the active segment while the
/// sealed data was being scanned.
use anyhow::{Context, Result};
use keydir::Locator;
use record::Record;
use segment::{Segment, SegmentId};
use std::collections::{BTreeMap, HashSet};
use tracing::info;

use crate::Store;

impl Store {
    /// Compacts all sealed segments (everything except the active tail).
    ///
    /// A no-op when the store holds a single segment. Returns once the
    /// on-disk state and the keydir are consistent again; retired segment
    /// files are deleted last, after no locator references them.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure, or when a sealed segment holds a
    /// malformed record.
    pub fn merge(&mut self) -> Result<()> {
        if self.segments.len() <= 1 {
            return Ok(());
        }
        let sealed_count = self.segments.len() - 1;

        // Scan the sealed prefix in order, exactly mirroring recovery
        // replay: later records overwrite, tombstones remove.
        let mut live: BTreeMap<Vec<u8>, (Vec<u8>, u32)> = BTreeMap::new();
        for seg in &self.segments[..sealed_count] {
            let mut scanner = seg
                .scan()
                .with_context(|| format!("failed to open segment {}", seg.path().display()))?;
            while let Some((_, record)) = scanner
                .next_record()
                .with_context(|| format!("corrupt record in segment {}", seg.path().display()))?
            {
                if record.is_tombstone() {
                    live.remove(&record.key);
                } else {
                    live.insert(record.key, (record.value, record.tstamp));
                }
            }
        }

        // Rewrite the survivors through a fresh writer under the same
        // rotation rule as the ordinary write path.
        let mut output: Vec<Segment> = Vec::new();
        let mut relocated: Vec<(Vec<u8>, Locator)> = Vec::with_capacity(live.len());
        let mut tail_size = u64::MAX; // forces a fresh segment for the first record
        for (key, (value, tstamp)) in live {
            if tail_size > self.max_segment_size {
                let id = self.fresh_segment_id();
                let seg = Segment::create(&self.dir, id)
                    .context("failed to create merge output segment")?;
                output.push(seg);
                tail_size = 0;
            }
            let out = output
                .last()
                .expect("rotation check just opened an output segment");

            let value_sz = value.len() as u32;
            let record = Record::value(key.clone(), value, tstamp);
            let offset = out.append(&record).with_context(|| {
                format!("failed to append to segment {}", out.path().display())
            })?;
            tail_size = offset + record.encoded_len() as u64;

            relocated.push((
                key,
                Locator {
                    segment: out.id(),
                    value_sz,
                    offset,
                    tstamp,
                },
            ));
        }

        // Swap: the sealed prefix is replaced by the merge output; the
        // untouched active segment stays as the tail.
        let mut old = std::mem::replace(&mut self.segments, output);
        let active = old.pop().expect("segment list holds the active tail");
        self.segments.push(active);
        let retired: HashSet<SegmentId> = old.iter().map(|s| s.id()).collect();

        // Reconcile the keydir. A key still pointing into a retired segment
        // moves to its relocated copy. A key pointing at the active segment
        // was overwritten after the sealed record was laid down, and a key
        // that vanished from the keydir was tombstoned — both keep their
        // current state.
        for (key, locator) in relocated {
            match self.keydir.get(&key) {
                Some(current) if retired.contains(&current.segment) => {
                    self.keydir.insert(key, locator);
                }
                _ => {}
            }
        }

        // No locator references the retired files anymore; deletion is
        // best-effort because leftovers cost space, not correctness.
        for seg in &old {
            let _ = std::fs::remove_file(seg.path());
        }

        info!(
            retired = old.len(),
            segments = self.segments.len(),
            "merge complete"
        );

        Ok(())
    }
}
