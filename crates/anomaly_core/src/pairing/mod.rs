//! Pairing strategies and the shared commit path
//!
//! Every pair in the world is formed by [`commit_pairing`], which writes both
//! sides in one call. Removal goes through [`retire`], which clears the
//! surviving partner's side. Kind-specific behavior (when to look for a partner
//! and where) lives in the [`PairingStrategy`] implementations.

mod owned;
mod world_anchored;

pub use owned::OwnedPairing;
pub use world_anchored::WorldAnchored;

use crate::anomaly::{Anomaly, AnomalyId, AnomalyKind};
use crate::arena::GateArena;
use crate::config::AnomalyConfig;
use crate::error::{AnomalyError, Result};
use crate::geometry::WorldPos;
use crate::host::{PresentationCue, WorldHost};
use crate::registry::{PairingRegistry, RegistryEntry};
use crate::resolver::{LoadHandle, RegionResolver};
use crate::store::LocationStore;
use rand_chacha::ChaCha8Rng;

/// Mutable view of one world's services, handed to strategies and the coordinator
pub struct PairingContext<'a> {
    pub arena: &'a mut GateArena,
    pub registry: &'a mut PairingRegistry,
    pub store: &'a mut LocationStore,
    pub resolver: &'a mut RegionResolver,
    pub host: &'a mut dyn WorldHost,
    pub rng: &'a mut ChaCha8Rng,
    pub config: &'a AnomalyConfig,
    /// World tick of the step in progress, for log fields
    pub tick: u64,
}

impl PairingContext<'_> {
    /// Load the region around `coordinate` and make its dormant gates resident.
    pub fn load_region(&mut self, coordinate: &WorldPos) -> Result<LoadHandle> {
        let handle = self.resolver.ensure_loaded(&mut *self.host, coordinate)?;
        self.arena.activate_region(handle.region(), self.registry);
        Ok(handle)
    }

    pub fn release(&mut self, handle: LoadHandle) {
        self.resolver.release(&mut *self.host, handle);
    }
}

/// Kind-specific pairing behavior
pub trait PairingStrategy {
    fn kind(&self) -> AnomalyKind;

    /// Called right after an object of this kind was placed.
    fn on_created(&self, ctx: &mut PairingContext<'_>, id: AnomalyId) -> Option<AnomalyId>;

    /// Called when a mover triggers an unpaired object of this kind.
    fn on_unpaired_trigger(&self, ctx: &mut PairingContext<'_>, id: AnomalyId)
        -> Option<AnomalyId>;
}

pub fn strategy_for(kind: AnomalyKind) -> &'static dyn PairingStrategy {
    match kind {
        AnomalyKind::WarpGate => &WorldAnchored,
        AnomalyKind::MiniGate => &OwnedPairing,
    }
}

/// Link `a` and `b` on both sides: objects, hints, Location Store and Registry.
///
/// Nothing is written unless every check passes.
pub fn commit_pairing(ctx: &mut PairingContext<'_>, a: AnomalyId, b: AnomalyId) -> Result<()> {
    if a == b {
        return Err(AnomalyError::SelfPairing(a));
    }
    let left = ctx.arena.get(a).ok_or(AnomalyError::NotResident(a))?;
    let right = ctx.arena.get(b).ok_or(AnomalyError::NotResident(b))?;
    if left.kind() != right.kind() {
        return Err(AnomalyError::KindMismatch { left: left.kind(), right: right.kind() });
    }
    if left.partner_id().is_some() {
        return Err(AnomalyError::AlreadyPaired(a));
    }
    if right.partner_id().is_some() {
        return Err(AnomalyError::AlreadyPaired(b));
    }

    let kind = left.kind();
    let a_pos = left.coordinate().clone();
    let b_pos = right.coordinate().clone();

    for (id, partner, hint) in [(a, b, &b_pos), (b, a, &a_pos)] {
        if let Some(object) = ctx.arena.get_mut(id) {
            object.link_to(partner, hint);
            if !ctx.registry.contains(id) {
                ctx.registry.register(RegistryEntry::from(&*object));
            }
        }
        ctx.registry.mark_paired(id, partner);
    }
    if kind.is_durable() {
        ctx.store.put(a, a_pos.clone());
        ctx.store.put(b, b_pos.clone());
    }

    tracing::info!(
        tick = ctx.tick,
        kind = ?kind,
        left = %a,
        right = %b,
        distance = a_pos.distance_to(&b_pos).unwrap_or(f64::NAN),
        "pair committed"
    );
    Ok(())
}

/// Remove an object from the world, resident or dormant, and clear its partner's side.
pub fn retire(ctx: &mut PairingContext<'_>, id: AnomalyId) -> bool {
    let (kind, partner, at) = if let Some(mut object) = ctx.arena.remove(id) {
        let partner = object.on_removed();
        let at = object.coordinate().clone();
        ctx.host.cue(PresentationCue::GateRemoved { gate: id, at: at.clone() });
        (object.kind(), partner, at)
    } else if let Some(record) = ctx.arena.remove_dormant(id) {
        (AnomalyKind::WarpGate, AnomalyId::parse(&record.partner_id), record.coordinate)
    } else {
        return false;
    };

    ctx.registry.unregister(id);
    if kind.is_durable() {
        ctx.store.remove(id);
    }
    if let Some(partner) = partner {
        unlink_partner(ctx, partner, id);
    }
    tracing::debug!(tick = ctx.tick, id = %id, kind = ?kind, at = %at, "anomaly retired");
    true
}

/// Clear `partner`'s side of a pair with `removed`, wherever the partner lives.
fn unlink_partner(ctx: &mut PairingContext<'_>, partner: AnomalyId, removed: AnomalyId) {
    if let Some(object) = ctx.arena.get_mut(partner) {
        if object.partner_id() == Some(removed) {
            object.unlink();
            ctx.registry.mark_unpaired(partner);
            tracing::debug!(partner = %partner, "partner unlinked");
        }
        return;
    }
    let removed_key = removed.to_string();
    if let Some(record) = ctx.arena.dormant_record_mut(partner) {
        if record.partner_id == removed_key {
            record.partner_id.clear();
            record.partner_location_hint = None;
            tracing::debug!(partner = %partner, "dormant partner unlinked");
        }
    }
}
