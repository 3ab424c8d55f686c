// Save/Load for the anomaly registry of one world
// MessagePack + LZ4 compression with versioning and integrity checks

pub mod error;
pub mod format;
pub mod manager;
pub mod migration;

pub use error::SaveError;
pub use format::{
    decompress_and_deserialize, serialize_and_compress, LocationRecord, WorldAnomalySave,
    WorldSnapshot,
};
pub use manager::{PendingSave, SaveInfo, WorldSaveManager};
pub use migration::migrate_save;

pub const SAVE_VERSION: u32 = 1;

/// File name of the anomaly registry inside a world's save directory
pub const SAVE_FILE_NAME: &str = "strangematter_anomalies.dat";
