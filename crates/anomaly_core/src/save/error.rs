use thiserror::Error;

/// Failures of the anomaly save file
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Anomaly save I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not encode anomaly save: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),

    #[error("Could not decode anomaly save: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),

    #[error("Anomaly save payload is not valid LZ4")]
    Decompression,

    /// Structurally readable but inconsistent (duplicate ids, truncated trailer)
    #[error("Anomaly save is corrupted: {0}")]
    Corrupted(String),

    #[error("Anomaly save version {found} is newer than supported version {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Anomaly save checksum mismatch")]
    ChecksumMismatch,

    #[error("No anomaly save at {path}")]
    FileNotFound { path: String },

    #[error("Anomaly save holds {size} records, limit is {limit}")]
    DataTooLarge { size: usize, limit: usize },

    #[error("Background save thread panicked")]
    BackgroundPanic,
}

impl SaveError {
    /// Whether the world can keep running without this save.
    ///
    /// Integrity failures and newer versions are not: writing over them would
    /// destroy data another build can still read.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SaveError::Io(_) | SaveError::FileNotFound { .. } | SaveError::BackgroundPanic
        )
    }
}
