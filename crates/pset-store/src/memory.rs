//! In-memory property sink and source for tests and embedding.
//!
//! [`MemorySink`] keeps each written value as a separate bincode record;
//! [`MemorySource`] hands them back in the same order.

use std::collections::VecDeque;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};
use crate::traits::{PropertySink, PropertySource};

/// A [`PropertySink`] that buffers bincode-encoded records in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    records: Vec<Vec<u8>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records written.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The encoded records, in write order.
    pub fn records(&self) -> &[Vec<u8>] {
        &self.records
    }

    /// Consume the sink, returning its records.
    pub fn into_records(self) -> Vec<Vec<u8>> {
        self.records
    }
}

impl PropertySink for MemorySink {
    fn write_value<T: Serialize + ?Sized>(&mut self, value: &T) -> StoreResult<()> {
        let bytes =
            bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.records.push(bytes);
        Ok(())
    }
}

/// A [`PropertySource`] reading records produced by a [`MemorySink`].
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    records: VecDeque<Vec<u8>>,
}

impl MemorySource {
    /// Create a source over raw encoded records.
    pub fn from_records(records: Vec<Vec<u8>>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Number of records not yet read.
    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

impl From<MemorySink> for MemorySource {
    fn from(sink: MemorySink) -> Self {
        Self::from_records(sink.into_records())
    }
}

impl PropertySource for MemorySource {
    fn read_value<T: DeserializeOwned>(&mut self) -> StoreResult<T> {
        let bytes = self.records.pop_front().ok_or(StoreError::SourceExhausted)?;
        bincode::deserialize(&bytes).map_err(|e| StoreError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_come_back_in_order() {
        let mut sink = MemorySink::new();
        sink.write_value("first").unwrap();
        sink.write_value(&42u64).unwrap();
        assert_eq!(sink.len(), 2);

        let mut source = MemorySource::from(sink);
        assert_eq!(source.read_value::<String>().unwrap(), "first");
        assert_eq!(source.read_value::<u64>().unwrap(), 42);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn exhausted_source() {
        let mut source = MemorySource::default();
        let err = source.read_value::<u32>().unwrap_err();
        assert!(matches!(err, StoreError::SourceExhausted));
    }

    #[test]
    fn truncated_record_is_a_deserialization_error() {
        let mut sink = MemorySink::new();
        sink.write_value("a fairly long string").unwrap();
        let mut records = sink.into_records();
        records[0].truncate(4);

        let mut source = MemorySource::from_records(records);
        let err = source.read_value::<String>().unwrap_err();
        assert!(matches!(err, StoreError::Deserialization(_)));
    }

    #[test]
    fn writes_through_mut_reference() {
        fn write_one<S: PropertySink>(mut sink: S) {
            sink.write_value(&1u8).unwrap();
        }

        let mut sink = MemorySink::new();
        write_one(&mut sink);
        assert!(!sink.is_empty());
        assert_eq!(sink.records().len(), 1);
    }
}
