use super::error::SaveError;
use super::format::{decompress_and_deserialize, serialize_and_compress, WorldAnomalySave, WorldSnapshot};
use super::migration::migrate_save;
use super::SAVE_FILE_NAME;

use std::fs::{remove_file, rename, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use uuid::Uuid;

/// Reads and writes the anomaly registry file of one world directory
#[derive(Debug, Clone)]
pub struct WorldSaveManager {
    dir: PathBuf,
}

impl WorldSaveManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SAVE_FILE_NAME)
    }

    pub fn save(&self, save: &WorldAnomalySave) -> Result<(), SaveError> {
        Self::save_to_path(&self.path(), save)?;
        log::info!("Anomaly registry saved ({} locations)", save.locations.len());
        Ok(())
    }

    /// `Ok(None)` for a world that has never been saved.
    pub fn load(&self) -> Result<Option<WorldAnomalySave>, SaveError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let save = Self::load_from_path(&path)?;
        log::info!("Anomaly registry loaded ({} locations)", save.locations.len());
        Ok(Some(save))
    }

    /// Serialize and write `snapshot` on a worker thread.
    pub fn spawn_save(&self, snapshot: WorldSnapshot) -> PendingSave {
        let path = self.path();
        let generation = snapshot.generation;
        let handle = std::thread::spawn(move || {
            let save = snapshot.into_save();
            Self::save_to_path(&path, &save)
        });
        PendingSave { handle, generation }
    }

    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    pub fn delete(&self) -> Result<(), SaveError> {
        let path = self.path();
        if path.exists() {
            remove_file(&path)?;
            log::info!("Deleted anomaly registry {:?}", path);
        }
        Ok(())
    }

    /// Save metadata for tooling and logs
    pub fn info(&self) -> Result<Option<SaveInfo>, SaveError> {
        let Some(save) = self.load()? else {
            return Ok(None);
        };
        let paired_gates = save.gates.iter().filter(|g| !g.partner_id.is_empty()).count();
        Ok(Some(SaveInfo {
            timestamp: save.timestamp,
            version: save.version,
            tick: save.tick,
            location_count: save.locations.len(),
            gate_count: save.gates.len(),
            paired_gates,
        }))
    }

    pub(crate) fn save_to_path(path: &Path, save: &WorldAnomalySave) -> Result<(), SaveError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = serialize_and_compress(save)?;

        // Atomic save: write to a temp file of our own, then rename
        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));

        let written = File::create(&temp_path).and_then(|mut file| {
            file.write_all(&data)?;
            file.flush()?;
            file.sync_all()
        });
        if let Err(err) = written.and_then(|()| rename(&temp_path, path)) {
            let _ = remove_file(&temp_path);
            return Err(err.into());
        }

        log::debug!("Saved {} bytes to {:?}", data.len(), path);
        Ok(())
    }

    pub(crate) fn load_from_path(path: &Path) -> Result<WorldAnomalySave, SaveError> {
        if !path.exists() {
            return Err(SaveError::FileNotFound { path: path.display().to_string() });
        }

        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        let mut save = decompress_and_deserialize(&data)?;
        save = migrate_save(save)?;

        log::debug!("Loaded {} bytes from {:?}", data.len(), path);
        Ok(save)
    }
}

/// A save running on a worker thread
#[must_use = "a background save should be joined to learn whether it was written"]
#[derive(Debug)]
pub struct PendingSave {
    handle: JoinHandle<Result<(), SaveError>>,
    generation: u64,
}

impl PendingSave {
    /// Location Store generation contained in this save.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker. A panicking worker is reported as `BackgroundPanic`.
    pub fn join(self) -> Result<(), SaveError> {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => {
                log::error!("Background anomaly save panicked");
                Err(SaveError::BackgroundPanic)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SaveInfo {
    pub timestamp: u64,
    pub version: u32,
    pub tick: u64,
    pub location_count: usize,
    pub gate_count: usize,
    pub paired_gates: usize,
}

impl SaveInfo {
    pub fn format_timestamp(&self) -> String {
        use time::{format_description::well_known::Rfc3339, OffsetDateTime};

        let timestamp =
            OffsetDateTime::from_unix_timestamp_nanos((self.timestamp as i128) * 1_000_000)
                .unwrap_or_else(|_| OffsetDateTime::now_utc());

        timestamp.format(&Rfc3339).unwrap_or_else(|_| "Unknown".to_string())
    }
}
