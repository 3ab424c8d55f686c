use super::error::SaveError;
use super::format::WorldAnomalySave;
use super::SAVE_VERSION;
use crate::geometry::{DimensionId, DEFAULT_DIMENSION};

/// Migrate save data from older versions to current version
pub fn migrate_save(mut save: WorldAnomalySave) -> Result<WorldAnomalySave, SaveError> {
    let original_version = save.version;

    save = match save.version {
        0 => migrate_v0_to_v1(save)?,
        1 => save,
        v if v > SAVE_VERSION => {
            log::warn!("Loading save from future version {} (current: {})", v, SAVE_VERSION);
            save
        }
        _ => {
            return Err(SaveError::VersionMismatch { found: save.version, expected: SAVE_VERSION });
        }
    };

    save.version = SAVE_VERSION;
    save.update_timestamp();

    if original_version != SAVE_VERSION {
        log::info!("Migrated save from version {} to {}", original_version, SAVE_VERSION);
    }

    Ok(save)
}

/// Version 0 stored locations without a dimension tag.
fn migrate_v0_to_v1(mut save: WorldAnomalySave) -> Result<WorldAnomalySave, SaveError> {
    log::info!("Migrating save from version 0 to 1");

    let mut filled = 0;
    for record in save.locations.iter_mut().filter(|r| r.dimension.is_empty()) {
        record.dimension = DEFAULT_DIMENSION.to_string();
        filled += 1;
    }
    for gate in save.gates.iter_mut() {
        if gate.coordinate.dimension.as_str().is_empty() {
            gate.coordinate.dimension = DimensionId::overworld();
            filled += 1;
        }
        // Hints of unpaired gates are meaningless
        if gate.partner_id.is_empty() {
            gate.partner_location_hint = None;
        }
    }
    if filled > 0 {
        log::info!("Assigned default dimension to {} records", filled);
    }

    Ok(save)
}

pub fn needs_migration(save: &WorldAnomalySave) -> bool {
    save.version < SAVE_VERSION
}
