//! World-anchored pairing for warp gates
//!
//! Gates are placed unpaired and look for a partner the first time something
//! walks into them.

use super::{PairingContext, PairingStrategy};
use crate::anomaly::{AnomalyId, AnomalyKind};
use crate::search::PairingSearchEngine;

#[derive(Debug, Clone, Copy, Default)]
pub struct WorldAnchored;

impl PairingStrategy for WorldAnchored {
    fn kind(&self) -> AnomalyKind {
        AnomalyKind::WarpGate
    }

    fn on_created(&self, _ctx: &mut PairingContext<'_>, _id: AnomalyId) -> Option<AnomalyId> {
        None
    }

    fn on_unpaired_trigger(&self, ctx: &mut PairingContext<'_>, id: AnomalyId) -> Option<AnomalyId> {
        PairingSearchEngine.search(ctx, id).partner()
    }
}
