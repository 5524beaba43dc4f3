/// Write path: `put()`, `delete()`, and segment rotation.
///
/// Every mutation shares the same prologue: check whether the active
/// segment has outgrown the size bound and rotate if so, then append to the
/// (possibly new) active segment, then update the keydir. The append lands
/// on disk before the index changes, so a failure between the two steps
/// leaves state that recovery rebuilds correctly.
use anyhow::{Context, Result};
use keydir::Locator;
use record::Record;
use segment::Segment;
use tracing::debug;

use crate::{Store, MAX_KEY_SIZE, MAX_VALUE_SIZE};

impl Store {
    /// Records `key -> value` durably. After return, `get(key)` reflects
    /// this value until a later `put` or `delete` supersedes it.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure, or when the key or value falls
    /// outside the accepted size bounds. An empty value is rejected because
    /// a zero-length record is the tombstone encoding on disk.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        anyhow::ensure!(!key.is_empty(), "key must not be empty");
        anyhow::ensure!(
            key.len() <= MAX_KEY_SIZE,
            "key too large: {} bytes (max {})",
            key.len(),
            MAX_KEY_SIZE
        );
        anyhow::ensure!(
            !value.is_empty(),
            "value must not be empty (a zero-length record denotes deletion)"
        );
        anyhow::ensure!(
            value.len() <= MAX_VALUE_SIZE,
            "value too large: {} bytes (max {})",
            value.len(),
            MAX_VALUE_SIZE
        );

        self.rotate_if_needed()?;

        let tstamp = Self::now()?;
        let value_sz = value.len() as u32;
        let record = Record::value(key.clone(), value, tstamp);

        let active = self.active();
        let segment_id = active.id();
        let offset = active.append(&record).with_context(|| {
            format!("failed to append to segment {}", active.path().display())
        })?;

        self.keydir.insert(
            key,
            Locator {
                segment: segment_id,
                value_sz,
                offset,
                tstamp,
            },
        );

        Ok(())
    }

    /// Deletes `key` by appending a tombstone and dropping its keydir entry.
    ///
    /// Deleting a key that is not live is a successful no-op — nothing is
    /// written.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or an out-of-bounds key.
    pub fn delete(&mut self, key: Vec<u8>) -> Result<()> {
        anyhow::ensure!(!key.is_empty(), "key must not be empty");
        anyhow::ensure!(
            key.len() <= MAX_KEY_SIZE,
            "key too large: {} bytes (max {})",
            key.len(),
            MAX_KEY_SIZE
        );

        if !self.keydir.contains_key(&key) {
            return Ok(());
        }

        self.rotate_if_needed()?;

        let tstamp = Self::now()?;
        let record = Record::tombstone(key, tstamp);

        let active = self.active();
        active.append(&record).with_context(|| {
            format!("failed to append to segment {}", active.path().display())
        })?;

        self.keydir.remove(&record.key);

        Ok(())
    }

    /// Rotation prologue shared by every mutating operation.
    ///
    /// The bound is checked post-hoc: a single append may overshoot
    /// `max_segment_size` and rotation fires on the *next* mutating call,
    /// which keeps every record inside one file.
    pub(crate) fn rotate_if_needed(&mut self) -> Result<()> {
        let size = self.active().size()?;
        if size <= self.max_segment_size {
            return Ok(());
        }

        let id = self.fresh_segment_id();
        let seg = Segment::create(&self.dir, id).with_context(|| {
            format!("failed to create segment in {}", self.dir.display())
        })?;
        debug!(segment = %id, sealed_size = size, "rotated active segment");
        self.segments.push(seg);

        Ok(())
    }
}
