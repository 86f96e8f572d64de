use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreResult;

/// Sequential destination for persisted property values.
///
/// A sink only knows how to write one value after another. Which indices are
/// saved, and in what order, is decided by whoever drives the save. Values
/// carry no index tag, so a restore must replay the same index sequence.
pub trait PropertySink {
    /// Serialize one value and append it to the sink.
    ///
    /// Returns `Err(StoreError::Serialization)` if the value cannot be
    /// encoded, or `Err(StoreError::Io)` if the sink cannot be written.
    fn write_value<T: Serialize + ?Sized>(&mut self, value: &T) -> StoreResult<()>;
}

/// Sequential origin of persisted property values, the mirror of
/// [`PropertySink`].
pub trait PropertySource {
    /// Read and decode the next value.
    ///
    /// Returns `Err(StoreError::SourceExhausted)` when no values remain and
    /// `Err(StoreError::Deserialization)` when the next value is corrupt,
    /// truncated, or not a `T`.
    fn read_value<T: DeserializeOwned>(&mut self) -> StoreResult<T>;
}

impl<S: PropertySink + ?Sized> PropertySink for &mut S {
    fn write_value<T: Serialize + ?Sized>(&mut self, value: &T) -> StoreResult<()> {
        (**self).write_value(value)
    }
}

impl<S: PropertySource + ?Sized> PropertySource for &mut S {
    fn read_value<T: DeserializeOwned>(&mut self) -> StoreResult<T> {
        (**self).read_value()
    }
}
