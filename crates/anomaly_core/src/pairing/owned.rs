//! Owned pairing for mini gates
//!
//! An owner fires one cyan and one purple gate; the two pair with each other
//! the moment the second one lands. Nothing is loaded or persisted.

use super::{commit_pairing, retire, PairingContext, PairingStrategy};
use crate::anomaly::{AnomalyId, AnomalyKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct OwnedPairing;

impl PairingStrategy for OwnedPairing {
    fn kind(&self) -> AnomalyKind {
        AnomalyKind::MiniGate
    }

    fn on_created(&self, ctx: &mut PairingContext<'_>, id: AnomalyId) -> Option<AnomalyId> {
        let gate = ctx.arena.get(id)?.as_mini()?;
        let (owner, color, position) = (gate.owner_id, gate.color, gate.coordinate.clone());

        // One gate per owner and color
        let replaced: Vec<AnomalyId> = ctx
            .arena
            .iter()
            .filter_map(|o| o.as_mini())
            .filter(|m| m.id != id && m.owner_id == owner && m.color == color)
            .map(|m| m.id)
            .collect();
        for old in replaced {
            retire(ctx, old);
        }

        let range = ctx.config.mini_gate.pair_scan_range;
        let partner = ctx
            .arena
            .iter()
            .filter_map(|o| o.as_mini())
            .filter(|m| m.owner_id == owner && m.color == color.opposite())
            .filter(|m| !m.state.is_paired() && m.state.active)
            .filter_map(|m| {
                m.coordinate.distance_to(&position).filter(|d| *d <= range).map(|d| (m.id, d))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(partner, _)| partner)?;

        match commit_pairing(ctx, id, partner) {
            Ok(()) => Some(partner),
            Err(err) => {
                tracing::warn!(gate = %id, partner = %partner, error = %err, "mini gate pairing failed");
                None
            }
        }
    }

    fn on_unpaired_trigger(
        &self,
        _ctx: &mut PairingContext<'_>,
        _id: AnomalyId,
    ) -> Option<AnomalyId> {
        None
    }
}
