use super::error::SaveError;
use super::SAVE_VERSION;
use crate::anomaly::WarpGateRecord;
use crate::store::LocationSnapshot;
use serde::{Deserialize, Serialize};

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use rmp_serde::{from_slice, to_vec_named};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use time::OffsetDateTime;

/// Upper bound on records of each kind in one save
pub const MAX_RECORDS: usize = 100_000;

/// Persisted anomaly state of one world
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorldAnomalySave {
    /// Save format version for migration
    pub version: u32,

    /// Save timestamp (unix milliseconds)
    pub timestamp: u64,

    /// Simulation step at save time
    #[serde(default)]
    pub tick: u64,

    /// Location Store contents: every durable gate, resident or not
    pub locations: Vec<LocationRecord>,

    /// Per-gate records of every warp gate
    #[serde(default)]
    pub gates: Vec<WarpGateRecord>,
}

impl Default for WorldAnomalySave {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldAnomalySave {
    pub fn new() -> Self {
        Self {
            version: SAVE_VERSION,
            timestamp: current_timestamp(),
            tick: 0,
            locations: Vec::new(),
            gates: Vec::new(),
        }
    }

    pub fn update_timestamp(&mut self) {
        self.timestamp = current_timestamp();
    }

    pub fn validate(&self) -> Result<(), SaveError> {
        if self.locations.len() > MAX_RECORDS {
            return Err(SaveError::DataTooLarge { size: self.locations.len(), limit: MAX_RECORDS });
        }
        if self.gates.len() > MAX_RECORDS {
            return Err(SaveError::DataTooLarge { size: self.gates.len(), limit: MAX_RECORDS });
        }

        // Duplicate ids mean two writers interleaved
        let mut location_ids = HashSet::new();
        for record in &self.locations {
            if !location_ids.insert(&record.id) {
                return Err(SaveError::Corrupted(format!("duplicate location {}", record.id)));
            }
        }
        let mut gate_ids = HashSet::new();
        for record in &self.gates {
            if !gate_ids.insert(&record.id) {
                return Err(SaveError::Corrupted(format!("duplicate gate {}", record.id)));
            }
        }

        Ok(())
    }
}

/// One Location Store entry
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Empty in saves written before dimensions were tracked
    #[serde(default)]
    pub dimension: String,
}

/// Immutable capture of a world's anomaly state, cheap to take on the simulation thread
#[derive(Debug, Clone)]
pub struct WorldSnapshot {
    pub tick: u64,
    /// Location Store generation captured with `locations`
    pub generation: u64,
    pub locations: LocationSnapshot,
    pub gates: Vec<WarpGateRecord>,
}

impl WorldSnapshot {
    pub fn into_save(self) -> WorldAnomalySave {
        WorldAnomalySave {
            version: SAVE_VERSION,
            timestamp: current_timestamp(),
            tick: self.tick,
            locations: self.locations.to_records(),
            gates: self.gates,
        }
    }
}

/// Serialize and compress world anomaly data
pub fn serialize_and_compress(save: &WorldAnomalySave) -> Result<Vec<u8>, SaveError> {
    save.validate()?;

    // 1. MessagePack with field names
    let msgpack = to_vec_named(save).map_err(SaveError::Serialization)?;

    // 2. LZ4 (size prepended)
    let compressed = compress_prepend_size(&msgpack);

    // 3. SHA256 trailer
    let mut hasher = Sha256::new();
    hasher.update(&compressed);
    let checksum = hasher.finalize();

    let mut result = compressed;
    result.extend_from_slice(&checksum);

    Ok(result)
}

/// Decompress and deserialize world anomaly data
pub fn decompress_and_deserialize(bytes: &[u8]) -> Result<WorldAnomalySave, SaveError> {
    // header + checksum
    if bytes.len() < 4 + 32 {
        return Err(SaveError::Corrupted(format!("{} bytes is shorter than the trailer", bytes.len())));
    }

    let (payload, checksum_bytes) = bytes.split_at(bytes.len() - 32);

    let mut hasher = Sha256::new();
    hasher.update(payload);
    let calculated_checksum = hasher.finalize();

    if &calculated_checksum[..] != checksum_bytes {
        return Err(SaveError::ChecksumMismatch);
    }

    let msgpack = decompress_size_prepended(payload).map_err(|_| SaveError::Decompression)?;

    let save: WorldAnomalySave = from_slice(&msgpack).map_err(SaveError::Deserialization)?;

    if save.version > SAVE_VERSION {
        return Err(SaveError::VersionMismatch { found: save.version, expected: SAVE_VERSION });
    }

    Ok(save)
}

pub fn current_timestamp() -> u64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::{AnomalyId, WarpGate};
    use crate::geometry::WorldPos;

    fn location(id: &str) -> LocationRecord {
        LocationRecord {
            id: id.to_string(),
            x: 1200.5,
            y: 71.0,
            z: -3.5,
            dimension: "minecraft:overworld".to_string(),
        }
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let mut save = WorldAnomalySave::new();
        save.tick = 4096;
        let gate = WarpGate::new(AnomalyId::random(), WorldPos::overworld(0.5, 70.0, 0.5));
        save.locations.push(location(&gate.id.to_string()));
        save.gates.push(gate.to_record());

        let serialized = serialize_and_compress(&save).unwrap();
        let deserialized = decompress_and_deserialize(&serialized).unwrap();

        assert_eq!(save, deserialized);
    }

    #[test]
    fn test_checksum_validation() {
        let save = WorldAnomalySave::new();
        let mut serialized = serialize_and_compress(&save).unwrap();

        if let Some(last) = serialized.last_mut() {
            *last = last.wrapping_add(1);
        }

        let result = decompress_and_deserialize(&serialized);
        assert!(matches!(result, Err(SaveError::ChecksumMismatch)));
    }

    #[test]
    fn test_truncated_input_is_corrupted() {
        assert!(matches!(decompress_and_deserialize(&[0u8; 12]), Err(SaveError::Corrupted(_))));
    }

    #[test]
    fn test_duplicate_locations_rejected() {
        let mut save = WorldAnomalySave::new();
        save.locations.push(location("a"));
        save.locations.push(location("a"));
        assert!(matches!(serialize_and_compress(&save), Err(SaveError::Corrupted(_))));
    }

    #[test]
    fn test_compression_ratio() {
        let mut save = WorldAnomalySave::new();
        for i in 0..500 {
            let mut record = location(&AnomalyId::random().to_string());
            record.x = i as f64;
            save.locations.push(record);
        }

        let uncompressed = to_vec_named(&save).unwrap();
        let compressed = serialize_and_compress(&save).unwrap();

        let ratio = compressed.len() as f32 / uncompressed.len() as f32;
        assert!(ratio < 0.9);
    }
}
