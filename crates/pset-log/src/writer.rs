use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use pset_store::{PropertySink, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LogResult;
use crate::format::{MAGIC, MAX_RECORD_SIZE, PREAMBLE_SIZE, RECORD_HEADER_SIZE, SCHEMA_VERSION};

/// Configuration for writing property logs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `fsync` the file when a file-backed writer is closed.
    pub sync_on_finish: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            sync_on_finish: true,
        }
    }
}

/// Writes length-prefixed, CRC-checked bincode records.
///
/// The magic and schema version are written when the writer is created.
pub struct LogWriter<W: Write> {
    inner: W,
    /// Bytes written so far, including the preamble.
    offset: u64,
    records: u64,
    config: LogConfig,
}

impl<W: Write> LogWriter<W> {
    /// Start a log on `inner`, writing the preamble immediately.
    pub fn new(mut inner: W, config: LogConfig) -> LogResult<Self> {
        inner.write_all(MAGIC)?;
        inner.write_all(&SCHEMA_VERSION.to_be_bytes())?;
        Ok(Self {
            inner,
            offset: PREAMBLE_SIZE as u64,
            records: 0,
            config,
        })
    }

    /// Number of records written.
    pub fn record_count(&self) -> u64 {
        self.records
    }

    /// Bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.offset
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> LogResult<W> {
        self.inner.flush()?;
        debug!(records = self.records, bytes = self.offset, "property log finished");
        Ok(self.inner)
    }

    fn write_record(&mut self, payload: &[u8]) -> StoreResult<()> {
        let length = u32::try_from(payload.len())
            .ok()
            .filter(|len| *len <= MAX_RECORD_SIZE)
            .ok_or_else(|| {
                StoreError::Serialization(format!(
                    "record of {} bytes exceeds limit of {MAX_RECORD_SIZE}",
                    payload.len()
                ))
            })?;
        let crc = crc32fast::hash(payload);

        self.inner.write_all(&length.to_le_bytes())?;
        self.inner.write_all(&crc.to_le_bytes())?;
        self.inner.write_all(payload)?;

        self.offset += (RECORD_HEADER_SIZE + payload.len()) as u64;
        self.records += 1;
        Ok(())
    }
}

impl LogWriter<BufWriter<File>> {
    /// Create (or truncate) a log file at `path`.
    pub fn create(path: &Path, config: LogConfig) -> LogResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), config)
    }

    /// Flush, optionally `fsync`, and close the file.
    pub fn close(self) -> LogResult<()> {
        let sync = self.config.sync_on_finish;
        let writer = self.finish()?;
        if sync {
            writer.get_ref().sync_all()?;
        }
        Ok(())
    }
}

impl<W: Write> PropertySink for LogWriter<W> {
    fn write_value<T: Serialize + ?Sized>(&mut self, value: &T) -> StoreResult<()> {
        let payload =
            bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.write_record(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_written_on_create() {
        let writer = LogWriter::new(Vec::new(), LogConfig::default()).unwrap();
        assert_eq!(writer.bytes_written(), 8);
        let bytes = writer.finish().unwrap();
        assert_eq!(&bytes[0..4], b"PSET");
        assert_eq!(&bytes[4..8], &1u32.to_be_bytes());
    }

    #[test]
    fn record_framing() {
        let mut writer = LogWriter::new(Vec::new(), LogConfig::default()).unwrap();
        writer.write_value(&0xabcdu64).unwrap();
        assert_eq!(writer.record_count(), 1);
        let bytes = writer.finish().unwrap();

        let record = &bytes[PREAMBLE_SIZE..];
        let len = u32::from_le_bytes(record[0..4].try_into().unwrap()) as usize;
        let crc = u32::from_le_bytes(record[4..8].try_into().unwrap());
        let payload = &record[8..];
        assert_eq!(len, 8);
        assert_eq!(payload.len(), len);
        assert_eq!(crc, crc32fast::hash(payload));
        assert_eq!(bincode::deserialize::<u64>(payload).unwrap(), 0xabcd);
    }

    #[test]
    fn offset_tracks_records() {
        let mut writer = LogWriter::new(Vec::new(), LogConfig::default()).unwrap();
        writer.write_value("abc").unwrap();
        writer.write_value("defg").unwrap();
        let expected = writer.bytes_written();
        let bytes = writer.finish().unwrap();
        assert_eq!(bytes.len() as u64, expected);
    }

    #[test]
    fn create_makes_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("props.pset");
        let mut writer = LogWriter::create(&path, LogConfig::default()).unwrap();
        writer.write_value(&1u8).unwrap();
        writer.close().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn default_config_syncs() {
        assert!(LogConfig::default().sync_on_finish);
    }
}
