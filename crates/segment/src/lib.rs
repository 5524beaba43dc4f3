//! # Segment — one append-only log file
//!
//! A segment is a single file on disk holding zero or more encoded
//! [`Record`]s in write order. The store keeps exactly one *active* segment
//! receiving appends; every other segment is *sealed* and immutable until a
//! merge retires it.
//!
//! Segment file names are fresh random identifiers (UUID v4 hex) generated
//! at creation time. Name ordering means nothing — recovery orders segments
//! by the timestamp of their first record.
//!
//! Every operation opens the file, does its work, and lets the handle drop.
//! No handles are cached across calls, so a sealed segment's file can be
//! deleted the moment the in-memory index stops referencing it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use record::Record;
//! use segment::{Segment, SegmentId};
//!
//! let seg = Segment::create(std::path::Path::new("db"), SegmentId(0)).unwrap();
//! let offset = seg.append(&Record::value(b"k".to_vec(), b"v".to_vec(), 1)).unwrap();
//! let rec = seg.read_record(offset, 1, 1).unwrap();
//! assert_eq!(rec.value, b"v");
//! ```

use record::{Header, Record, RecordError, HEADER_BYTES};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Stable identifier the store assigns to each segment it owns.
///
/// The keydir references segments by id rather than by position, so the
/// store can reorder or replace its segment list (merge does both) without
/// invalidating locators that point at surviving segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(pub u64);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur during segment operations.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A record failed to decode.
    #[error("corrupt segment: {0}")]
    Corrupt(#[from] RecordError),

    /// A record started but the file ended before its payload did.
    #[error("corrupt segment: partial record at offset {0}")]
    Truncated(u64),
}

/// One append-only file in the store directory.
pub struct Segment {
    id: SegmentId,
    path: PathBuf,
}

impl Segment {
    /// Creates an empty segment file in `dir` under a fresh random name.
    pub fn create(dir: &Path, id: SegmentId) -> Result<Self, SegmentError> {
        let path = dir.join(Uuid::new_v4().simple().to_string());
        File::create(&path)?;
        Ok(Self { id, path })
    }

    /// Wraps an existing segment file found during recovery.
    pub fn open(path: PathBuf, id: SegmentId) -> Self {
        Self { id, path }
    }

    #[must_use]
    pub fn id(&self) -> SegmentId {
        self.id
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current on-disk size in bytes.
    pub fn size(&self) -> Result<u64, SegmentError> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    /// Appends `record` and returns the offset at which it starts (the file
    /// size before the append). That offset is the stable locator for later
    /// positioned reads.
    pub fn append(&self, record: &Record) -> Result<u64, SegmentError> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        let offset = file.metadata()?.len();
        file.write_all(&record.encode())?;
        Ok(offset)
    }

    /// Positioned read of the record starting at `offset`.
    ///
    /// The caller already knows both payload lengths — `key_len` from the
    /// key it looked up and `value_sz` from the keydir — so the record is
    /// fetched in a single read of `16 + key_len + value_sz` bytes.
    pub fn read_record(
        &self,
        offset: u64,
        key_len: usize,
        value_sz: u32,
    ) -> Result<Record, SegmentError> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;

        let mut buf = vec![0u8; HEADER_BYTES + key_len + value_sz as usize];
        match file.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(SegmentError::Truncated(offset));
            }
            Err(e) => return Err(SegmentError::Io(e)),
        }

        Ok(Record::decode(&buf)?)
    }

    /// Decodes the record at offset 0, or `None` for a zero-length file.
    ///
    /// Recovery calls this on every file in the store directory to obtain
    /// its lead timestamp before the segments are sorted and replayed.
    pub fn first_record(path: &Path) -> Result<Option<Record>, SegmentError> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(None);
        }
        let mut scanner = Scanner::from_file(file);
        Ok(scanner.next_record()?.map(|(_, record)| record))
    }

    /// Sequential scan over every record in file order.
    pub fn scan(&self) -> Result<Scanner, SegmentError> {
        Ok(Scanner::from_file(File::open(&self.path)?))
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("id", &self.id)
            .field("path", &self.path)
            .finish()
    }
}

/// Yields `(start offset, record)` pairs front-to-back.
///
/// Used only during recovery and merge. A clean EOF (zero bytes where the
/// next header would begin) ends the scan; a header or payload cut short by
/// EOF is corruption.
pub struct Scanner {
    rdr: BufReader<File>,
    offset: u64,
}

impl Scanner {
    fn from_file(file: File) -> Self {
        Self {
            rdr: BufReader::new(file),
            offset: 0,
        }
    }

    /// Returns the next record and the offset it starts at, or `None` when
    /// the file is exhausted.
    pub fn next_record(&mut self) -> Result<Option<(u64, Record)>, SegmentError> {
        let start = self.offset;

        let mut header_buf = [0u8; HEADER_BYTES];
        let n = read_until_eof(&mut self.rdr, &mut header_buf)?;
        if n == 0 {
            return Ok(None);
        }
        if n < HEADER_BYTES {
            return Err(SegmentError::Truncated(start));
        }

        let header = Header::decode(&header_buf)?;
        let mut buf = vec![0u8; header.record_len()];
        buf[..HEADER_BYTES].copy_from_slice(&header_buf);
        match self.rdr.read_exact(&mut buf[HEADER_BYTES..]) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(SegmentError::Truncated(start));
            }
            Err(e) => return Err(SegmentError::Io(e)),
        }

        let record = Record::decode(&buf)?;
        self.offset = start + buf.len() as u64;
        Ok(Some((start, record)))
    }
}

/// Fills `buf` from `r`, stopping early only at EOF. Returns the byte count
/// so the caller can tell a clean EOF (0) from a torn header (1..15).
fn read_until_eof<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests;
