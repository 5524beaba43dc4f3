/// Read path: `get()` and `keys()`.
///
/// A point lookup is one keydir probe plus one positioned read. The keydir
/// already knows the value length, so the whole record is fetched in a
/// single read of known size. The stored checksum is not verified here.
use anyhow::{bail, Context, Result};

use crate::Store;

impl Store {
    /// Returns the current value for `key`, or `None` when the key was
    /// never written or has been deleted. Absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only when reading the owning segment file fails or
    /// the record found there does not match the index.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let locator = match self.keydir.get(key) {
            Some(locator) => *locator,
            None => return Ok(None),
        };

        let segment = self.segment(locator.segment)?;
        let record = segment
            .read_record(locator.offset, key.len(), locator.value_sz)
            .with_context(|| {
                format!(
                    "failed to read record at offset {} of {}",
                    locator.offset,
                    segment.path().display()
                )
            })?;

        // The keydir promises this exact key lives at the offset.
        if record.key != key {
            bail!(
                "segment {} offset {}: index points at a mismatching key",
                segment.id(),
                locator.offset
            );
        }

        Ok(Some(record.value))
    }

    /// Every currently live key, in unspecified order.
    #[must_use]
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.keydir.keys().map(|k| k.to_vec()).collect()
    }

    /// Number of currently live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keydir.len()
    }

    /// `true` when no key is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keydir.is_empty()
    }
}
