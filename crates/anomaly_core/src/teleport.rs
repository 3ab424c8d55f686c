//! Teleportation Coordinator
//!
//! Decides whether a mover inside a gate's trigger radius is carried to the
//! partner gate, and performs the move.

use crate::anomaly::{Anomaly, AnomalyId, AnomalyObject};
use crate::config::AnomalyConfig;
use crate::geometry::WorldPos;
use crate::host::{MovingObject, PresentationCue};
use crate::pairing::{PairingContext, PairingStrategy};
use crate::resolver::LoadHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    EffectsDisabled,
    Inactive,
    CoolingDown,
    UnsupportedMover,
    OutOfRange,
    NotResident,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TeleportOutcome {
    Teleported { partner: AnomalyId, destination: WorldPos, newly_paired: bool },
    /// Unpaired and no partner could be produced, or the partner is stale
    NoPartner,
    NoOp(NoOpReason),
}

/// Exit point next to `partner`, clear of its trigger radius.
pub fn destination_for(partner: &AnomalyObject, config: &AnomalyConfig) -> WorldPos {
    let (margin, lift) = match partner {
        AnomalyObject::Warp(_) => (config.warp_gate.exit_margin, config.warp_gate.exit_lift),
        AnomalyObject::Mini(_) => (config.mini_gate.exit_margin, config.mini_gate.exit_lift),
    };
    partner.coordinate().offset(partner.trigger_radius(config) + margin, lift, 0.0)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TeleportCoordinator;

impl TeleportCoordinator {
    pub fn on_trigger(
        &self,
        ctx: &mut PairingContext<'_>,
        strategy: &dyn PairingStrategy,
        gate_id: AnomalyId,
        mover: &mut MovingObject,
    ) -> TeleportOutcome {
        let config = ctx.config;
        let Some(gate) = ctx.arena.get(gate_id) else {
            return TeleportOutcome::NoOp(NoOpReason::NotResident);
        };
        if let Some(reason) = precondition_failure(gate, mover, config) {
            return TeleportOutcome::NoOp(reason);
        }

        let mut newly_paired = false;
        let partner_id = match gate.partner_id() {
            Some(partner) => partner,
            None => match strategy.on_unpaired_trigger(ctx, gate_id) {
                Some(partner) => {
                    newly_paired = true;
                    partner
                }
                None => return TeleportOutcome::NoPartner,
            },
        };

        let Some(handle) = self.resolve_partner(ctx, gate_id, partner_id) else {
            tracing::debug!(gate = %gate_id, partner = %partner_id, "partner unavailable");
            return TeleportOutcome::NoPartner;
        };

        let outcome = self.transfer(ctx, gate_id, partner_id, mover, newly_paired);
        if let Some(handle) = handle {
            ctx.release(handle);
        }
        outcome
    }

    /// Make the partner resident and check it points back at the gate.
    ///
    /// `None` means the partner is stale; `Some(handle)` carries the load handle
    /// if the partner's region had to be loaded.
    fn resolve_partner(
        &self,
        ctx: &mut PairingContext<'_>,
        gate_id: AnomalyId,
        partner_id: AnomalyId,
    ) -> Option<Option<LoadHandle>> {
        let mut handle = None;
        if !ctx.arena.contains(partner_id) {
            let gate = ctx.arena.get(gate_id)?;
            if !gate.kind().is_durable() {
                return None;
            }
            let location = ctx
                .store
                .get(partner_id)
                .cloned()
                .or_else(|| gate.as_warp().and_then(|w| w.partner_location_hint.clone()))?;
            match ctx.load_region(&location) {
                Ok(loaded) => handle = Some(loaded),
                Err(err) => {
                    tracing::debug!(partner = %partner_id, error = %err, "partner region unavailable");
                    return None;
                }
            }
        }

        let symmetric = match (ctx.arena.get(gate_id), ctx.arena.get(partner_id)) {
            (Some(gate), Some(partner)) => is_valid_pair(gate, partner),
            _ => false,
        };
        if !symmetric {
            if let Some(handle) = handle {
                ctx.release(handle);
            }
            return None;
        }
        Some(handle)
    }

    fn transfer(
        &self,
        ctx: &mut PairingContext<'_>,
        gate_id: AnomalyId,
        partner_id: AnomalyId,
        mover: &mut MovingObject,
        newly_paired: bool,
    ) -> TeleportOutcome {
        let config = ctx.config;
        let Some(partner) = ctx.arena.get(partner_id) else {
            return TeleportOutcome::NoPartner;
        };
        let destination = destination_for(partner, config);
        let partner_pos = partner.coordinate().clone();
        let departure = mover.position.clone();

        mover.relocate(destination.clone());

        if let Some(gate) = ctx.arena.get_mut(gate_id) {
            let cooldown = gate.teleport_cooldown(config);
            gate.gate_state_mut().teleport_cooldown = cooldown;
            if let Some(warp) = gate.as_warp_mut() {
                warp.partner_location_hint = Some(partner_pos);
            }
        }
        if let Some(partner) = ctx.arena.get_mut(partner_id) {
            let cooldown = partner.teleport_cooldown(config);
            partner.gate_state_mut().teleport_cooldown = cooldown;
        }

        ctx.host.cue(PresentationCue::TeleportDeparture { gate: gate_id, at: departure });
        ctx.host.cue(PresentationCue::TeleportArrival { gate: partner_id, at: destination.clone() });
        tracing::info!(tick = ctx.tick, gate = %gate_id, partner = %partner_id, mover = mover.id, to = %destination, "teleported");

        TeleportOutcome::Teleported { partner: partner_id, destination, newly_paired }
    }
}

fn precondition_failure(
    gate: &AnomalyObject,
    mover: &MovingObject,
    config: &AnomalyConfig,
) -> Option<NoOpReason> {
    if let AnomalyObject::Warp(_) = gate {
        if !config.warp_gate.enable_effects || !config.warp_gate.enable_teleport {
            return Some(NoOpReason::EffectsDisabled);
        }
    }
    let state = gate.gate_state();
    if !state.active {
        return Some(NoOpReason::Inactive);
    }
    if state.teleport_cooldown > 0 {
        return Some(NoOpReason::CoolingDown);
    }
    if let AnomalyObject::Mini(_) = gate {
        if !mover.kind.is_living() {
            return Some(NoOpReason::UnsupportedMover);
        }
    }
    match mover.position.distance_to(gate.coordinate()) {
        Some(d) if d <= gate.trigger_radius(config) => None,
        _ => Some(NoOpReason::OutOfRange),
    }
}

fn is_valid_pair(gate: &AnomalyObject, partner: &AnomalyObject) -> bool {
    if partner.partner_id() != Some(gate.id()) || gate.kind() != partner.kind() {
        return false;
    }
    match (gate, partner) {
        (AnomalyObject::Mini(a), AnomalyObject::Mini(b)) => b.state.active && a.color != b.color,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::{AnomalyKind, GateColor, OwnerId};
    use crate::host::MoverKind;
    use crate::pairing::{commit_pairing, strategy_for, OwnedPairing, WorldAnchored};
    use crate::testing::Fixture;
    use uuid::Uuid;

    fn walker_at(pos: &WorldPos) -> MovingObject {
        MovingObject::new(1, MoverKind::Player, pos.clone())
    }

    fn paired_fixture() -> (Fixture, AnomalyId, AnomalyId) {
        let mut fx = Fixture::new();
        let a = fx.add_warp(0.5);
        let b = fx.add_warp(1200.5);
        commit_pairing(&mut fx.ctx(), a, b).unwrap();
        (fx, a, b)
    }

    #[test]
    fn test_paired_gate_teleports() {
        let (mut fx, a, b) = paired_fixture();
        let mut mover = walker_at(fx.arena.get(a).unwrap().coordinate());
        mover.velocity = nalgebra::Vector3::new(0.2, 0.0, -0.1);
        mover.yaw = 90.0;

        let outcome = TeleportCoordinator.on_trigger(&mut fx.ctx(), &WorldAnchored, a, &mut mover);

        let expected = WorldPos::overworld(1200.5 + 3.0, 70.5, 0.5);
        assert_eq!(
            outcome,
            TeleportOutcome::Teleported { partner: b, destination: expected.clone(), newly_paired: false }
        );
        assert_eq!(mover.position, expected);
        assert_eq!(mover.velocity, nalgebra::Vector3::new(0.2, 0.0, -0.1));
        assert_eq!(mover.yaw, 90.0);
        assert_eq!(fx.arena.get(a).unwrap().gate_state().teleport_cooldown, 100);
        assert_eq!(fx.arena.get(b).unwrap().gate_state().teleport_cooldown, 100);
        assert_eq!(fx.host.arrivals(), 1);
    }

    #[test]
    fn test_cooldown_blocks_return_trip() {
        let (mut fx, a, b) = paired_fixture();
        let mut mover = walker_at(fx.arena.get(a).unwrap().coordinate());
        TeleportCoordinator.on_trigger(&mut fx.ctx(), &WorldAnchored, a, &mut mover);

        mover.position = fx.arena.get(b).unwrap().coordinate().clone();
        let outcome = TeleportCoordinator.on_trigger(&mut fx.ctx(), &WorldAnchored, b, &mut mover);
        assert_eq!(outcome, TeleportOutcome::NoOp(NoOpReason::CoolingDown));
    }

    #[test]
    fn test_preconditions_in_order() {
        let (mut fx, a, _) = paired_fixture();
        let gate_pos = fx.arena.get(a).unwrap().coordinate().clone();

        let mut far = walker_at(&gate_pos.offset(10.0, 0.0, 0.0));
        let outcome = TeleportCoordinator.on_trigger(&mut fx.ctx(), &WorldAnchored, a, &mut far);
        assert_eq!(outcome, TeleportOutcome::NoOp(NoOpReason::OutOfRange));

        fx.arena.get_mut(a).unwrap().as_warp_mut().unwrap().set_active(false);
        let mut near = walker_at(&gate_pos);
        let outcome = TeleportCoordinator.on_trigger(&mut fx.ctx(), &WorldAnchored, a, &mut near);
        assert_eq!(outcome, TeleportOutcome::NoOp(NoOpReason::Inactive));

        fx.config.warp_gate.enable_teleport = false;
        let outcome = TeleportCoordinator.on_trigger(&mut fx.ctx(), &WorldAnchored, a, &mut near);
        assert_eq!(outcome, TeleportOutcome::NoOp(NoOpReason::EffectsDisabled));
        assert_eq!(near.position, gate_pos);
    }

    #[test]
    fn test_unpaired_trigger_pairs_then_teleports() {
        let mut fx = Fixture::new();
        let a = fx.add_warp(0.5);
        let b = fx.add_warp(1500.5);
        let mut mover = walker_at(fx.arena.get(a).unwrap().coordinate());

        let strategy = strategy_for(AnomalyKind::WarpGate);
        let outcome = TeleportCoordinator.on_trigger(&mut fx.ctx(), strategy, a, &mut mover);
        assert!(matches!(
            outcome,
            TeleportOutcome::Teleported { partner, newly_paired: true, .. } if partner == b
        ));
    }

    #[test]
    fn test_no_partner_consumes_nothing() {
        let mut fx = Fixture::new();
        fx.host.refuse_placement = true;
        let a = fx.add_warp(0.5);
        let start = fx.arena.get(a).unwrap().coordinate().clone();
        let mut mover = walker_at(&start);

        let outcome = TeleportCoordinator.on_trigger(&mut fx.ctx(), &WorldAnchored, a, &mut mover);
        assert_eq!(outcome, TeleportOutcome::NoPartner);
        assert_eq!(mover.position, start);
        assert_eq!(fx.arena.get(a).unwrap().gate_state().teleport_cooldown, 0);
    }

    #[test]
    fn test_stale_partner_keeps_pairing() {
        let (mut fx, a, b) = paired_fixture();
        // Partner vanished without going through removal
        fx.arena.remove(b);
        fx.store.remove(b);
        fx.arena.get_mut(a).unwrap().as_warp_mut().unwrap().partner_location_hint = None;

        let mut mover = walker_at(fx.arena.get(a).unwrap().coordinate());
        let outcome = TeleportCoordinator.on_trigger(&mut fx.ctx(), &WorldAnchored, a, &mut mover);
        assert_eq!(outcome, TeleportOutcome::NoPartner);
        assert_eq!(fx.arena.get(a).unwrap().partner_id(), Some(b));
    }

    #[test]
    fn test_dormant_partner_is_loaded_on_demand() {
        let (mut fx, a, b) = paired_fixture();
        let partner_region = fx.arena.get(b).unwrap().coordinate().region();
        fx.host.unload(&partner_region);
        fx.arena.deactivate_region(&partner_region, &mut fx.registry, &mut fx.store);
        assert!(!fx.arena.contains(b));

        let mut mover = walker_at(fx.arena.get(a).unwrap().coordinate());
        let outcome = TeleportCoordinator.on_trigger(&mut fx.ctx(), &WorldAnchored, a, &mut mover);
        assert!(matches!(outcome, TeleportOutcome::Teleported { partner, .. } if partner == b));
        assert!(fx.arena.contains(b));
        assert_eq!(fx.resolver.held_regions(), 0);
    }

    #[test]
    fn test_mini_gate_moves_only_living() {
        let mut fx = Fixture::new();
        let owner = OwnerId(Uuid::new_v4());
        let cyan = fx.add_mini(0.5, GateColor::Cyan, owner);
        let purple = fx.add_mini(30.5, GateColor::Purple, owner);
        commit_pairing(&mut fx.ctx(), cyan, purple).unwrap();

        let pos = fx.arena.get(cyan).unwrap().coordinate().clone();
        let mut item = MovingObject::new(7, MoverKind::Inert, pos.clone());
        let outcome = TeleportCoordinator.on_trigger(&mut fx.ctx(), &OwnedPairing, cyan, &mut item);
        assert_eq!(outcome, TeleportOutcome::NoOp(NoOpReason::UnsupportedMover));

        let mut creature = MovingObject::new(8, MoverKind::Creature, pos);
        let outcome = TeleportCoordinator.on_trigger(&mut fx.ctx(), &OwnedPairing, cyan, &mut creature);
        assert!(matches!(outcome, TeleportOutcome::Teleported { partner, .. } if partner == purple));
        assert_eq!(fx.arena.get(purple).unwrap().gate_state().teleport_cooldown, 40);
    }

    #[test]
    fn test_unpaired_mini_gate_never_teleports() {
        let mut fx = Fixture::new();
        let cyan = fx.add_mini(0.5, GateColor::Cyan, OwnerId(Uuid::new_v4()));
        let mut mover = walker_at(fx.arena.get(cyan).unwrap().coordinate());
        let outcome = TeleportCoordinator.on_trigger(&mut fx.ctx(), &OwnedPairing, cyan, &mut mover);
        assert_eq!(outcome, TeleportOutcome::NoPartner);
    }
}
