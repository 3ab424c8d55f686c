use thiserror::Error;

use crate::anomaly::{AnomalyId, AnomalyKind};
use crate::geometry::RegionPos;
use crate::save::SaveError;

#[derive(Error, Debug)]
pub enum AnomalyError {
    #[error("Region {region} did not finish loading within {polls} polls")]
    RegionLoadTimeout { region: RegionPos, polls: u32 },

    #[error("Region {region} failed to load")]
    RegionLoadFailed { region: RegionPos },

    #[error("Anomaly {0} is not resident")]
    NotResident(AnomalyId),

    #[error("Anomaly {0} is already paired")]
    AlreadyPaired(AnomalyId),

    #[error("Anomaly {0} cannot pair with itself")]
    SelfPairing(AnomalyId),

    #[error("Cannot pair {left:?} with {right:?}")]
    KindMismatch { left: AnomalyKind, right: AnomalyKind },

    #[error("Placement rejected at {0}")]
    PlacementRejected(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Save error: {0}")]
    Save(#[from] SaveError),
}

impl AnomalyError {
    /// Failures a search attempt can skip past without giving up on the gate.
    pub fn is_attempt_local(&self) -> bool {
        matches!(
            self,
            AnomalyError::RegionLoadTimeout { .. }
                | AnomalyError::RegionLoadFailed { .. }
                | AnomalyError::PlacementRejected(_)
        )
    }
}

impl From<serde_json::Error> for AnomalyError {
    fn from(err: serde_json::Error) -> Self {
        AnomalyError::InvalidConfig(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnomalyError>;
