//! # Store - UndertowKV Storage Engine
//!
//! The central orchestrator that ties together the [`record`], [`segment`],
//! and [`keydir`] crates into a complete Bitcask-style key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                    STORE                      │
//! │                                               │
//! │ write.rs → rotate? → append to active segment │
//! │              |            → keydir insert     │
//! │              |                                │
//! │ read.rs  → keydir lookup → one positioned     │
//! │              read of the owning segment       │
//! │                                               │
//! │ merge.rs → scan sealed segments (newest wins) │
//! │              → rewrite live entries → swap    │
//! │                                               │
//! │ recovery.rs → sort segments by lead tstamp    │
//! │              → replay front-to-back           │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module       | Purpose                                                |
//! |--------------|--------------------------------------------------------|
//! | [`lib.rs`]   | `Store` struct, open/create, accessors, `Debug`        |
//! | [`recovery`] | directory enumeration, lead-timestamp sort, replay     |
//! | [`write`]    | `put()`, `delete()`, segment rotation                  |
//! | [`read`]     | `get()`, `keys()`                                      |
//! | [`merge`]    | compaction of sealed segments, keydir reconciliation   |
//!
//! ## Segment lifecycle
//!
//! ```text
//! ┌────────────────────────────┐  ← appends go here only
//! │ ACTIVE segment (tail)      │
//! ├────────────────────────────┤  ← immutable until merge
//! │ SEALED segments            │
//! │ (write order, oldest first)│
//! └────────────────────────────┘
//! ```
//!
//! The keydir references segments by stable [`SegmentId`], never by list
//! position, so merge can replace the sealed prefix wholesale while locators
//! pointing at the active segment stay valid.
//!
//! ## Crash Safety
//!
//! Every mutation is an append to the active segment **before** the keydir
//! update. The keydir is rebuilt from disk on every open, so the visible
//! disk record is the source of truth no matter where an operation failed.
//! Merge deletes a retired segment file only after no locator references it.

mod merge;
mod read;
mod recovery;
mod write;

use anyhow::{Context, Result};
use keydir::Keydir;
use segment::{Segment, SegmentId};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Maximum allowed key size in bytes (64 KiB).
pub const MAX_KEY_SIZE: usize = 64 * 1024;
/// Maximum allowed value size in bytes (10 MiB).
pub const MAX_VALUE_SIZE: usize = 10 * 1024 * 1024;

/// Default active-segment size bound in bytes (4 MiB).
///
/// Once the active segment grows past the bound, the next mutating
/// operation seals it and opens a fresh one. Tests use much smaller values
/// to force rotation cheaply.
pub const DEFAULT_MAX_SEGMENT_SIZE: u64 = 4 * 1024 * 1024;

/// A Bitcask-style store: one directory of append-only segments plus an
/// in-memory keydir locating the newest record for every live key.
///
/// # Write Path
///
/// 1. Rotate the active segment if it has outgrown the size bound.
/// 2. Append a value record (or tombstone) to the active segment.
/// 3. Insert (or remove) the keydir entry.
///
/// # Read Path
///
/// 1. Keydir lookup — miss means absent, not an error.
/// 2. One positioned read of `16 + ksz + value_sz` bytes from the owning
///    segment.
///
/// # Recovery
///
/// On [`Store::open`] every file in the directory is replayed in
/// lead-timestamp order to rebuild the keydir; the last segment in that
/// order becomes the active one.
pub struct Store {
    dir: PathBuf,
    keydir: Keydir,
    /// Segments in write order; the last entry is the active tail.
    segments: Vec<Segment>,
    /// Next id to hand out when rotation or merge creates a segment.
    next_segment_id: u64,
    max_segment_size: u64,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("dir", &self.dir)
            .field("segments", &self.segments.len())
            .field("live_keys", &self.keydir.len())
            .field("max_segment_size", &self.max_segment_size)
            .finish()
    }
}

impl Store {
    /// Opens or creates a store rooted at `dir` with the default segment
    /// size bound.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::open_with(dir, DEFAULT_MAX_SEGMENT_SIZE)
    }

    /// Opens or creates a store rooted at `dir`.
    ///
    /// A missing directory is created together with one empty active
    /// segment. An existing directory is recovered: every file in it is
    /// treated as a segment and replayed (see [`recovery`]).
    ///
    /// # Errors
    ///
    /// Fails on filesystem errors, or when recovery encounters a malformed
    /// record in any segment.
    pub fn open_with<P: AsRef<Path>>(dir: P, max_segment_size: u64) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();

        if !dir.exists() {
            std::fs::create_dir_all(&dir).with_context(|| {
                format!("failed to create store directory {}", dir.display())
            })?;
        }

        let (mut segments, keydir) = recovery::recover(&dir)?;

        // A fresh (or fully emptied) directory still needs an active tail.
        if segments.is_empty() {
            let seg = Segment::create(&dir, SegmentId(0)).with_context(|| {
                format!("failed to create initial segment in {}", dir.display())
            })?;
            segments.push(seg);
        }

        let next_segment_id = segments.len() as u64;

        info!(
            dir = %dir.display(),
            segments = segments.len(),
            live_keys = keydir.len(),
            "store opened"
        );

        Ok(Self {
            dir,
            keydir,
            segments,
            next_segment_id,
            max_segment_size,
        })
    }

    /// The directory holding this store's segment files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of segments currently owned, the active one included.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// The configured rotation bound in bytes.
    #[must_use]
    pub fn max_segment_size(&self) -> u64 {
        self.max_segment_size
    }

    /// The active segment: the unique tail of the write-order sequence.
    pub(crate) fn active(&self) -> &Segment {
        self.segments
            .last()
            .expect("store always owns at least one segment")
    }

    /// Resolves a keydir locator's segment id against the owned list.
    pub(crate) fn segment(&self, id: SegmentId) -> Result<&Segment> {
        self.segments
            .iter()
            .find(|s| s.id() == id)
            .ok_or_else(|| anyhow::anyhow!("keydir references unknown segment {}", id))
    }

    pub(crate) fn fresh_segment_id(&mut self) -> SegmentId {
        let id = SegmentId(self.next_segment_id);
        self.next_segment_id += 1;
        id
    }

    /// Wall-clock seconds since the Unix epoch, as stored in record headers.
    pub(crate) fn now() -> Result<u32> {
        let secs = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        Ok(secs as u32)
    }
}

#[cfg(test)]
mod tests;
