use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use pset_store::{PropertySource, StoreError, StoreResult};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{LogError, LogResult};
use crate::format::{MAGIC, MAX_RECORD_SIZE, PREAMBLE_SIZE, RECORD_HEADER_SIZE, SCHEMA_VERSION};

/// Reads records written by a [`LogWriter`](crate::LogWriter).
///
/// The preamble is validated on construction. Every record is checked
/// against its CRC before it is decoded; a clean end of input at a record
/// boundary is reported as `StoreError::SourceExhausted`, anything torn or
/// corrupt as `StoreError::Deserialization`.
pub struct LogReader<R: Read> {
    inner: R,
    /// Byte offset of the next record.
    offset: u64,
}

impl<R: Read> LogReader<R> {
    /// Validate the preamble of `inner` and position at the first record.
    pub fn new(mut inner: R) -> LogResult<Self> {
        let mut preamble = [0u8; PREAMBLE_SIZE];
        let n = read_full(&mut inner, &mut preamble)?;
        if n < PREAMBLE_SIZE || &preamble[0..4] != MAGIC {
            return Err(LogError::InvalidMagic {
                expected: String::from_utf8_lossy(MAGIC).into(),
                actual: String::from_utf8_lossy(&preamble[..n.min(4)]).into(),
            });
        }
        let version = u32::from_be_bytes([preamble[4], preamble[5], preamble[6], preamble[7]]);
        if version != SCHEMA_VERSION {
            return Err(LogError::UnsupportedVersion(version));
        }
        Ok(Self {
            inner,
            offset: PREAMBLE_SIZE as u64,
        })
    }

    /// Byte offset of the next record.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn read_record(&mut self) -> StoreResult<Vec<u8>> {
        let offset = self.offset;
        let mut header = [0u8; RECORD_HEADER_SIZE];
        match read_full(&mut self.inner, &mut header)? {
            0 => return Err(StoreError::SourceExhausted),
            RECORD_HEADER_SIZE => {}
            n => {
                warn!(offset, read = n, "truncated record header");
                return Err(StoreError::Deserialization(format!(
                    "truncated record header at offset {offset}"
                )));
            }
        }

        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        // Zero-sized values encode to an empty payload; only the upper bound
        // is checked.
        if length > MAX_RECORD_SIZE {
            warn!(offset, length, "invalid record length");
            return Err(StoreError::Deserialization(format!(
                "invalid record length {length} at offset {offset}"
            )));
        }

        let mut payload = vec![0u8; length as usize];
        if read_full(&mut self.inner, &mut payload)? < payload.len() {
            warn!(offset, length, "truncated record payload");
            return Err(StoreError::Deserialization(format!(
                "truncated record at offset {offset}"
            )));
        }

        let actual_crc = crc32fast::hash(&payload);
        if actual_crc != expected_crc {
            warn!(offset, expected_crc, actual_crc, "record CRC mismatch");
            return Err(StoreError::Deserialization(format!(
                "CRC mismatch at offset {offset}"
            )));
        }

        self.offset += (RECORD_HEADER_SIZE + payload.len()) as u64;
        Ok(payload)
    }
}

impl LogReader<BufReader<File>> {
    /// Open a log file.
    pub fn open(path: &Path) -> LogResult<Self> {
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<R: Read> PropertySource for LogReader<R> {
    fn read_value<T: DeserializeOwned>(&mut self) -> StoreResult<T> {
        let payload = self.read_record()?;
        bincode::deserialize(&payload).map_err(|e| StoreError::Deserialization(e.to_string()))
    }
}

/// Read until `buf` is full or the input ends. Returns the bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
