//! Checksummed on-disk log for property stores.
//!
//! A log starts with a magic and an explicit schema version, followed by
//! length-prefixed, CRC32-checked bincode records. [`LogWriter`] and
//! [`LogReader`] implement the store's [`PropertySink`](pset_store::PropertySink)
//! and [`PropertySource`](pset_store::PropertySource) traits, so a single
//! property can be saved or restored directly through the store. The
//! functions in [`driver`] save and restore whole stores.
//!
//! # Architecture
//!
//! - **format**: magic, schema version, record framing, [`LogHeader`]
//! - **LogWriter**: appends records to any `Write`
//! - **LogReader**: validates and decodes records from any `Read`
//! - **driver**: index ordering for whole-store save/restore

pub mod driver;
pub mod error;
pub mod format;
pub mod reader;
pub mod writer;

pub use driver::{restore_from_path, restore_into, restore_store, save_store, save_to_path};
pub use error::{LogError, LogResult};
pub use format::{LogHeader, MAGIC, SCHEMA_VERSION};
pub use reader::LogReader;
pub use writer::{LogConfig, LogWriter};
