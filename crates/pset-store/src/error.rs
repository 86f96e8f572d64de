use pset_types::TypeError;

/// Errors from property store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A move or save was asked to read from an index holding no value.
    #[error("no property stored at index {index:#x}")]
    EmptySource { index: u64 },

    /// Range bounds are reversed.
    #[error("invalid range: start {start:#x} is after end {end:#x}")]
    InvalidRange { start: u64, end: u64 },

    /// Relocating a range would push indices past `u64::MAX`.
    #[error("moving [{start:#x}, {end:#x}] to {new_start:#x} overflows the index space")]
    IndexOverflow { start: u64, end: u64, new_start: u64 },

    /// A value could not be written to a property sink.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A value could not be read back from a property source
    /// (corrupt, truncated, or of an unexpected type).
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// The property source has no more values.
    #[error("property source exhausted")]
    SourceExhausted,

    /// Invalid store configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Page geometry error.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// I/O error from an underlying sink or source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
