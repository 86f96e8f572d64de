//! Whole-store save and restore.
//!
//! The store itself only knows how to save or restore the value at one index.
//! These functions decide which indices go into a log, in what order, and
//! write each index ahead of its value so a restore can replay them.

use std::path::Path;

use pset_store::{ObjectPropertyStore, PropertySink, PropertySource, StoreConfig, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{LogError, LogResult};
use crate::format::LogHeader;
use crate::reader::LogReader;
use crate::writer::{LogConfig, LogWriter};

/// Save every entry of `store` to `sink` in ascending index order.
///
/// Returns the number of entries written.
pub fn save_store<V, S>(store: &ObjectPropertyStore<V>, sink: &mut S) -> LogResult<u64>
where
    V: Serialize,
    S: PropertySink + ?Sized,
{
    let header = LogHeader::for_store(store);
    sink.write_value(&header)?;

    let mut written = 0u64;
    for index in store.indices() {
        sink.write_value(&index)?;
        store.save_property(index, sink)?;
        written += 1;
    }

    debug!(store = %header.store_name, entries = written, "saved property store");
    Ok(written)
}

/// Restore a store from `source` into a new store.
///
/// The store is named, paged and sized as described by the log header.
/// Nothing is returned unless every entry was restored.
pub fn restore_store<V, S>(source: &mut S) -> LogResult<ObjectPropertyStore<V>>
where
    V: DeserializeOwned,
    S: PropertySource + ?Sized,
{
    let header: LogHeader = source.read_value()?;
    let nominal_entry_size = usize::try_from(header.nominal_entry_size).map_err(|_| {
        StoreError::Deserialization(format!(
            "nominal entry size {} out of range",
            header.nominal_entry_size
        ))
    })?;
    let config = StoreConfig {
        page_bits: header.page_bits,
        nominal_entry_size,
    };
    let mut store = ObjectPropertyStore::with_config(header.store_name.clone(), config)?;
    replay(&mut store, &header, source)?;

    debug!(store = %header.store_name, entries = header.entry_count, "restored property store");
    Ok(store)
}

/// Restore the entries of `source` into an existing store, overwriting any
/// values at the same indices.
///
/// The log must have been written with the same page geometry. Entries are
/// staged in a scratch store first, so `store` is untouched if the log turns
/// out to be corrupt or short. Returns the number of entries restored.
pub fn restore_into<V, S>(store: &mut ObjectPropertyStore<V>, source: &mut S) -> LogResult<u64>
where
    V: DeserializeOwned,
    S: PropertySource + ?Sized,
{
    let header: LogHeader = source.read_value()?;
    let page_bits = store.partitioner().page_bits();
    if header.page_bits != page_bits {
        return Err(LogError::PageBitsMismatch {
            store: page_bits,
            log: header.page_bits,
        });
    }

    let config = StoreConfig {
        page_bits,
        nominal_entry_size: store.nominal_entry_size(),
    };
    let mut scratch = ObjectPropertyStore::with_config(header.store_name.clone(), config)?;
    replay(&mut scratch, &header, source)?;

    let restored = scratch.len() as u64;
    for (index, value) in scratch.into_entries() {
        store.put(index, value);
    }

    debug!(
        store = %store.name(),
        log_store = %header.store_name,
        entries = restored,
        "merged property log"
    );
    Ok(restored)
}

/// Save `store` to a new log file at `path`.
pub fn save_to_path<V: Serialize>(
    store: &ObjectPropertyStore<V>,
    path: &Path,
    config: LogConfig,
) -> LogResult<u64> {
    let mut writer = LogWriter::create(path, config)?;
    let written = save_store(store, &mut writer)?;
    writer.close()?;
    info!(store = %store.name(), path = %path.display(), entries = written, "property log written");
    Ok(written)
}

/// Restore a store from the log file at `path`.
pub fn restore_from_path<V: DeserializeOwned>(path: &Path) -> LogResult<ObjectPropertyStore<V>> {
    let mut reader = LogReader::open(path)?;
    let store = restore_store(&mut reader)?;
    info!(store = %store.name(), path = %path.display(), entries = store.len(), "property log loaded");
    Ok(store)
}

fn replay<V, S>(store: &mut ObjectPropertyStore<V>, header: &LogHeader, source: &mut S) -> LogResult<()>
where
    V: DeserializeOwned,
    S: PropertySource + ?Sized,
{
    for _ in 0..header.entry_count {
        let index: u64 = source.read_value()?;
        store.restore_property(index, source)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pset_store::{MemorySink, MemorySource};
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    enum Symbol {
        Label(String),
        Function { name: String, params: u8 },
    }

    fn sample_store() -> ObjectPropertyStore<Symbol> {
        let mut store = ObjectPropertyStore::new("symbols");
        store.put(0x401000, Symbol::Function { name: "main".into(), params: 2 });
        store.put(0x401050, Symbol::Label("loop_top".into()));
        store.put(0x7fff_0000_0000, Symbol::Label("stack".into()));
        store
    }

    fn assert_same(a: &ObjectPropertyStore<Symbol>, b: &ObjectPropertyStore<Symbol>) {
        let left: Vec<(u64, &Symbol)> = a.iter().collect();
        let right: Vec<(u64, &Symbol)> = b.iter().collect();
        assert_eq!(left, right);
        assert_eq!(a.len(), b.len());
    }

    fn log_bytes(store: &ObjectPropertyStore<Symbol>) -> Vec<u8> {
        let mut writer = LogWriter::new(Vec::new(), LogConfig::default()).unwrap();
        save_store(store, &mut writer).unwrap();
        writer.finish().unwrap()
    }

    // -----------------------------------------------------------------------
    // In-memory
    // -----------------------------------------------------------------------

    #[test]
    fn memory_save_restore() {
        let store = sample_store();
        let mut sink = MemorySink::new();
        assert_eq!(save_store(&store, &mut sink).unwrap(), 3);
        // header + (index, value) per entry
        assert_eq!(sink.len(), 7);

        let mut source = MemorySource::from(sink);
        let restored: ObjectPropertyStore<Symbol> = restore_store(&mut source).unwrap();
        assert_eq!(restored.name(), "symbols");
        assert_same(&store, &restored);
    }

    #[test]
    fn empty_store_roundtrip() {
        let store: ObjectPropertyStore<Symbol> = ObjectPropertyStore::new("empty");
        let bytes = log_bytes(&store);
        let mut reader = LogReader::new(bytes.as_slice()).unwrap();
        let restored: ObjectPropertyStore<Symbol> = restore_store(&mut reader).unwrap();
        assert!(restored.is_empty());
        assert_eq!(restored.name(), "empty");
    }

    #[test]
    fn restore_keeps_page_geometry() {
        let config = StoreConfig {
            page_bits: 6,
            ..StoreConfig::default()
        };
        let mut store = ObjectPropertyStore::with_config("narrow", config).unwrap();
        store.put(1000, Symbol::Label("x".into()));
        let bytes = log_bytes(&store);
        let mut reader = LogReader::new(bytes.as_slice()).unwrap();
        let restored: ObjectPropertyStore<Symbol> = restore_store(&mut reader).unwrap();
        assert_eq!(restored.partitioner().page_bits(), 6);
        assert_same(&store, &restored);
    }

    #[test]
    fn restore_keeps_nominal_entry_size() {
        let config = StoreConfig {
            nominal_entry_size: 64,
            ..StoreConfig::default()
        };
        let mut store = ObjectPropertyStore::with_config("wide", config).unwrap();
        store.put(7, Symbol::Label("x".into()));
        store.put(8, Symbol::Label("y".into()));
        let bytes = log_bytes(&store);
        let mut reader = LogReader::new(bytes.as_slice()).unwrap();
        let restored: ObjectPropertyStore<Symbol> = restore_store(&mut reader).unwrap();
        assert_eq!(restored.nominal_entry_size(), 64);
        assert_eq!(restored.estimated_footprint(), 128);
    }

    #[test]
    fn unit_values_roundtrip() {
        let mut store = ObjectPropertyStore::new("marks");
        store.put(0x10, ());
        store.put(0x20, ());
        let mut writer = LogWriter::new(Vec::new(), LogConfig::default()).unwrap();
        assert_eq!(save_store(&store, &mut writer).unwrap(), 2);
        let bytes = writer.finish().unwrap();

        let mut reader = LogReader::new(bytes.as_slice()).unwrap();
        let restored: ObjectPropertyStore<()> = restore_store(&mut reader).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.get(0x10), Some(&()));
        assert_eq!(restored.get(0x20), Some(&()));
        assert!(restored.get(0x18).is_none());
    }

    // -----------------------------------------------------------------------
    // Failure handling
    // -----------------------------------------------------------------------

    #[test]
    fn short_log_fails() {
        let mut bytes = log_bytes(&sample_store());
        bytes.truncate(bytes.len() - 5);
        let mut reader = LogReader::new(bytes.as_slice()).unwrap();
        let err = restore_store::<Symbol, _>(&mut reader).unwrap_err();
        assert!(matches!(err, LogError::Store(StoreError::Deserialization(_))));
    }

    #[test]
    fn missing_entries_fail() {
        let store = sample_store();
        let mut sink = MemorySink::new();
        save_store(&store, &mut sink).unwrap();
        let mut records = sink.into_records();
        records.truncate(3);
        let mut source = MemorySource::from_records(records);
        let err = restore_store::<Symbol, _>(&mut source).unwrap_err();
        assert!(matches!(err, LogError::Store(StoreError::SourceExhausted)));
    }

    #[test]
    fn wrong_value_type_fails() {
        let mut store = ObjectPropertyStore::new("numbers");
        store.put(1, 7u8);
        let mut sink = MemorySink::new();
        save_store(&store, &mut sink).unwrap();
        let mut source = MemorySource::from(sink);
        let err = restore_store::<Symbol, _>(&mut source).unwrap_err();
        assert!(matches!(err, LogError::Store(StoreError::Deserialization(_))));
    }

    #[test]
    fn restore_into_merges() {
        let bytes = log_bytes(&sample_store());
        let mut target = ObjectPropertyStore::new("target");
        target.put(0x401000, Symbol::Label("old".into()));
        target.put(5, Symbol::Label("kept".into()));

        let mut reader = LogReader::new(bytes.as_slice()).unwrap();
        assert_eq!(restore_into(&mut target, &mut reader).unwrap(), 3);
        assert_eq!(target.len(), 4);
        assert_eq!(target.name(), "target");
        assert_eq!(
            target.get(0x401000),
            Some(&Symbol::Function { name: "main".into(), params: 2 })
        );
        assert_eq!(target.get(5), Some(&Symbol::Label("kept".into())));
    }

    #[test]
    fn restore_into_leaves_target_untouched_on_error() {
        let mut bytes = log_bytes(&sample_store());
        bytes.truncate(bytes.len() - 1);
        let mut target = ObjectPropertyStore::new("target");
        target.put(9, Symbol::Label("only".into()));

        let mut reader = LogReader::new(bytes.as_slice()).unwrap();
        assert!(restore_into(&mut target, &mut reader).is_err());
        assert_eq!(target.len(), 1);
        assert!(target.get(0x401000).is_none());
    }

    #[test]
    fn restore_into_rejects_page_bits_mismatch() {
        let bytes = log_bytes(&sample_store());
        let config = StoreConfig {
            page_bits: 8,
            ..StoreConfig::default()
        };
        let mut target: ObjectPropertyStore<Symbol> =
            ObjectPropertyStore::with_config("t", config).unwrap();
        let mut reader = LogReader::new(bytes.as_slice()).unwrap();
        let err = restore_into(&mut target, &mut reader).unwrap_err();
        assert!(matches!(err, LogError::PageBitsMismatch { store: 8, log: 12 }));
        assert!(target.is_empty());
    }

    // -----------------------------------------------------------------------
    // On disk
    // -----------------------------------------------------------------------

    #[test]
    fn disk_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symbols.pset");
        let store = sample_store();

        assert_eq!(save_to_path(&store, &path, LogConfig::default()).unwrap(), 3);
        let restored: ObjectPropertyStore<Symbol> = restore_from_path(&path).unwrap();
        assert_same(&store, &restored);
    }

    #[test]
    fn restore_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = restore_from_path::<Symbol>(&dir.path().join("absent.pset")).unwrap_err();
        assert!(matches!(err, LogError::Io(_)));
    }

    #[test]
    fn overwrite_existing_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symbols.pset");
        save_to_path(&sample_store(), &path, LogConfig::default()).unwrap();

        let mut smaller = ObjectPropertyStore::new("symbols");
        smaller.put(1, Symbol::Label("only".into()));
        let config = LogConfig {
            sync_on_finish: false,
        };
        save_to_path(&smaller, &path, config).unwrap();

        let restored: ObjectPropertyStore<Symbol> = restore_from_path(&path).unwrap();
        assert_eq!(restored.len(), 1);
        assert_same(&smaller, &restored);
    }
}
