//! # Record — log record codec
//!
//! Pure encode/decode for a single UndertowKV log record. No I/O happens
//! here; the [`segment`] crate moves these buffers to and from disk.
//!
//! ## Binary Record Format
//!
//! ```text
//! [crc: u32 BE][tstamp: u32 BE][ksz: u32 BE][value_sz: u32 BE][key ...][value ...]
//! ```
//!
//! All integers are big-endian unsigned 32-bit, no padding. The total
//! on-disk size of a record is `16 + ksz + value_sz`.
//!
//! A record with `value_sz == 0` is a **tombstone**: the logical deletion of
//! its key. Tombstones carry `crc = 0`; value records carry the first 4
//! bytes of `SHA-1(value)` interpreted big-endian. The checksum is a weak
//! integrity marker kept for write-side byte compatibility — readers do not
//! verify it.
//!
//! ## Example
//!
//! ```rust
//! use record::Record;
//!
//! let rec = Record::value(b"name".to_vec(), b"alice".to_vec(), 1_700_000_000);
//! let bytes = rec.encode();
//! assert_eq!(bytes.len(), 16 + 4 + 5);
//! assert_eq!(Record::decode(&bytes).unwrap(), rec);
//! ```

use byteorder::{BigEndian, ByteOrder};
use sha1::{Digest, Sha1};
use thiserror::Error;

/// Fixed size of the record header in bytes.
pub const HEADER_BYTES: usize = 16;

/// Errors produced when decoding a record from raw bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    /// Fewer than [`HEADER_BYTES`] bytes were available for the header.
    #[error("truncated record header: {0} bytes (need {HEADER_BYTES})")]
    TruncatedHeader(usize),

    /// The buffer length disagrees with the sizes the header describes.
    #[error("record length mismatch: header describes {expected} bytes, buffer holds {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// The fixed-width prefix of every record.
///
/// Decoded on its own during scans so the reader knows how many payload
/// bytes follow before it has read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub crc: u32,
    pub tstamp: u32,
    pub ksz: u32,
    pub value_sz: u32,
}

impl Header {
    /// Decodes the 16-byte header from the front of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, RecordError> {
        if bytes.len() < HEADER_BYTES {
            return Err(RecordError::TruncatedHeader(bytes.len()));
        }
        Ok(Self {
            crc: BigEndian::read_u32(&bytes[0..4]),
            tstamp: BigEndian::read_u32(&bytes[4..8]),
            ksz: BigEndian::read_u32(&bytes[8..12]),
            value_sz: BigEndian::read_u32(&bytes[12..16]),
        })
    }

    /// Total on-disk size of the record this header describes.
    #[must_use]
    pub fn record_len(&self) -> usize {
        HEADER_BYTES + self.ksz as usize + self.value_sz as usize
    }
}

/// A single logical write: either `key -> value` or a tombstone for `key`.
///
/// `ksz` and `value_sz` are not stored — they are the lengths of the owned
/// buffers, written out at encode time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub crc: u32,
    /// Unix seconds at write time (or the original write time, when a merge
    /// relocates the record).
    pub tstamp: u32,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Record {
    /// Builds a value record, computing the checksum over `value`.
    #[must_use]
    pub fn value(key: Vec<u8>, value: Vec<u8>, tstamp: u32) -> Self {
        let crc = checksum(&value);
        Self {
            crc,
            tstamp,
            key,
            value,
        }
    }

    /// Builds a tombstone for `key`: empty value, `crc = 0`.
    #[must_use]
    pub fn tombstone(key: Vec<u8>, tstamp: u32) -> Self {
        Self {
            crc: 0,
            tstamp,
            key,
            value: Vec::new(),
        }
    }

    /// A record with no value bytes denotes deletion of its key.
    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.value.is_empty()
    }

    /// Size of this record once encoded: `16 + ksz + value_sz`.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        HEADER_BYTES + self.key.len() + self.value.len()
    }

    /// Serializes the record into a fresh buffer of [`encoded_len`] bytes.
    ///
    /// [`encoded_len`]: Record::encoded_len
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&self.crc.to_be_bytes());
        buf.extend_from_slice(&self.tstamp.to_be_bytes());
        buf.extend_from_slice(&(self.key.len() as u32).to_be_bytes());
        buf.extend_from_slice(&(self.value.len() as u32).to_be_bytes());
        buf.extend_from_slice(&self.key);
        buf.extend_from_slice(&self.value);
        buf
    }

    /// Decodes a full record from `bytes`.
    ///
    /// `bytes` must be exactly `16 + ksz + value_sz` long, with `ksz` and
    /// `value_sz` taken from the header at its front; anything else is
    /// corruption.
    pub fn decode(bytes: &[u8]) -> Result<Self, RecordError> {
        let header = Header::decode(bytes)?;
        let expected = header.record_len();
        if bytes.len() != expected {
            return Err(RecordError::LengthMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let key_end = HEADER_BYTES + header.ksz as usize;
        Ok(Self {
            crc: header.crc,
            tstamp: header.tstamp,
            key: bytes[HEADER_BYTES..key_end].to_vec(),
            value: bytes[key_end..].to_vec(),
        })
    }
}

/// First 4 bytes of `SHA-1(value)`, interpreted big-endian.
#[must_use]
pub fn checksum(value: &[u8]) -> u32 {
    let digest = Sha1::digest(value);
    BigEndian::read_u32(&digest[..4])
}
