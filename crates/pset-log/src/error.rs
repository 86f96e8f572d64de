use pset_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("invalid log magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("unsupported log schema version: {0}")]
    UnsupportedVersion(u32),

    #[error("page bits mismatch: store uses {store}, log was written with {log}")]
    PageBitsMismatch { store: u8, log: u8 },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LogResult<T> = Result<T, LogError>;
