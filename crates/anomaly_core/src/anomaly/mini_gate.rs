//! Owned mini gate created by a projectile impact

use super::{Anomaly, AnomalyId, AnomalyKind, GateState, OwnerId, UpdateSignals};
use crate::config::AnomalyConfig;
use crate::geometry::WorldPos;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateColor {
    Cyan,
    Purple,
}

impl GateColor {
    pub fn opposite(self) -> GateColor {
        match self {
            GateColor::Cyan => GateColor::Purple,
            GateColor::Purple => GateColor::Cyan,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MiniGate {
    pub id: AnomalyId,
    pub coordinate: WorldPos,
    pub color: GateColor,
    pub owner_id: OwnerId,
    pub state: GateState,
    pub spawn_tick: u64,
    registered: bool,
}

impl MiniGate {
    pub fn new(
        id: AnomalyId,
        coordinate: WorldPos,
        color: GateColor,
        owner_id: OwnerId,
        spawn_tick: u64,
    ) -> Self {
        Self {
            id,
            coordinate,
            color,
            owner_id,
            state: GateState::default(),
            spawn_tick,
            registered: false,
        }
    }

    /// Steps until the gate expires, as seen from `tick`.
    pub fn remaining_lifetime(&self, tick: u64, config: &AnomalyConfig) -> u64 {
        (self.spawn_tick + config.mini_gate.max_lifetime_ticks).saturating_sub(tick)
    }
}

impl Anomaly for MiniGate {
    fn id(&self) -> AnomalyId {
        self.id
    }

    fn kind(&self) -> AnomalyKind {
        AnomalyKind::MiniGate
    }

    fn coordinate(&self) -> &WorldPos {
        &self.coordinate
    }

    fn update(&mut self, tick: u64, config: &AnomalyConfig) -> UpdateSignals {
        if tick.saturating_sub(self.spawn_tick) > config.mini_gate.max_lifetime_ticks {
            return UpdateSignals { expired: true, ..Default::default() };
        }

        self.state.tick_cooldown();
        let register = !self.registered;
        self.registered = true;
        UpdateSignals { register, ..Default::default() }
    }

    fn on_removed(&mut self) -> Option<AnomalyId> {
        self.state.active = false;
        self.state.partner_id.take()
    }

    fn sound_id(&self) -> Option<&'static str> {
        None
    }

    fn research_yield(&self, _config: &AnomalyConfig) -> u32 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mini(spawn_tick: u64) -> MiniGate {
        MiniGate::new(
            AnomalyId::random(),
            WorldPos::overworld(0.5, 65.0, 0.5),
            GateColor::Cyan,
            OwnerId(uuid::Uuid::new_v4()),
            spawn_tick,
        )
    }

    #[test]
    fn test_opposite_color() {
        assert_eq!(GateColor::Cyan.opposite(), GateColor::Purple);
        assert_eq!(GateColor::Purple.opposite(), GateColor::Cyan);
    }

    #[test]
    fn test_expires_after_max_lifetime() {
        let mut config = AnomalyConfig::default();
        config.mini_gate.max_lifetime_ticks = 10;
        let mut gate = mini(100);

        assert!(!gate.update(110, &config).expired);
        assert!(gate.update(111, &config).expired);
    }

    #[test]
    fn test_expiry_ignores_pairing() {
        let mut config = AnomalyConfig::default();
        config.mini_gate.max_lifetime_ticks = 5;
        let mut gate = mini(0);
        gate.state.partner_id = Some(AnomalyId::random());
        assert!(gate.update(6, &config).expired);
    }

    #[test]
    fn test_registers_on_first_update_only() {
        let config = AnomalyConfig::default();
        let mut gate = mini(0);
        assert!(gate.update(1, &config).register);
        assert!(!gate.update(2, &config).register);
    }

    #[test]
    fn test_remaining_lifetime() {
        let config = AnomalyConfig::default();
        let gate = mini(1000);
        assert_eq!(gate.remaining_lifetime(1000, &config), 12_000);
        assert_eq!(gate.remaining_lifetime(20_000, &config), 0);
    }
}
