//! Melee combat: damage payloads and the attack cooldown gate

use crate::config::{CombatConfig, CooldownPolicy};
use crate::sensor::EntityId;
use serde::{Deserialize, Serialize};

/// Types of damage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    /// Melee strikes
    #[default]
    Physical,
    /// Custom damage type
    Custom(u32),
}

/// Information about a damage instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageInfo {
    /// Damage amount
    pub amount: f32,
    /// Type of damage
    pub damage_type: DamageType,
    /// Entity that dealt the damage
    pub source_entity: Option<EntityId>,
}

impl DamageInfo {
    /// Create new damage info
    pub fn new(amount: f32, damage_type: DamageType) -> Self {
        Self {
            amount,
            damage_type,
            source_entity: None,
        }
    }

    /// Set the source entity
    pub fn with_source(mut self, entity: EntityId) -> Self {
        self.source_entity = Some(entity);
        self
    }
}

/// Receiver of damage dealt by agents (fire-and-forget)
pub trait DamageSink {
    /// Apply damage to `target`
    fn apply_damage(&mut self, target: EntityId, damage: DamageInfo);
}

/// Sink that drops all damage
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDamageSink;

impl DamageSink for NullDamageSink {
    fn apply_damage(&mut self, _target: EntityId, _damage: DamageInfo) {}
}

/// Attack range gating and cooldown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatController {
    attack_range: f32,
    attack_damage: f32,
    attack_cooldown: f32,
    policy: CooldownPolicy,
    /// Seconds until the next attack may fire, never below 0
    cooldown_timer: f32,
}

impl CombatController {
    /// Create a controller from combat tuning
    pub fn new(config: &CombatConfig) -> Self {
        Self {
            attack_range: config.attack_range,
            attack_damage: config.attack_damage,
            attack_cooldown: config.attack_cooldown,
            policy: config.cooldown_policy,
            cooldown_timer: 0.0,
        }
    }

    /// Count the cooldown down for one tick, honoring the policy
    pub fn tick_cooldown(&mut self, delta_time: f32, attacking: bool) {
        let counts = match self.policy {
            CooldownPolicy::Global => true,
            CooldownPolicy::WhileAttacking => attacking,
        };
        if counts {
            self.cooldown_timer = (self.cooldown_timer - delta_time).max(0.0);
        }
    }

    /// Whether an attack at `distance` would fire now
    pub fn can_attack(&self, distance: f32) -> bool {
        self.cooldown_timer <= 0.0 && distance <= self.attack_range
    }

    /// Attack `target` if allowed; returns true when damage was dealt
    pub fn try_attack(
        &mut self,
        attacker: Option<EntityId>,
        target: EntityId,
        distance: f32,
        sink: &mut dyn DamageSink,
    ) -> bool {
        if !self.can_attack(distance) {
            return false;
        }

        let mut damage = DamageInfo::new(self.attack_damage, DamageType::Physical);
        if let Some(attacker) = attacker {
            damage = damage.with_source(attacker);
        }
        sink.apply_damage(target, damage);
        self.cooldown_timer = self.attack_cooldown;
        log::info!("Sentry attacked {:?} for {} damage", target, self.attack_damage);
        true
    }

    /// Seconds until the next attack may fire
    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown_timer
    }

    /// Configured attack range
    pub fn attack_range(&self) -> f32 {
        self.attack_range
    }

    /// Cooldown policy in effect
    pub fn policy(&self) -> CooldownPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        hits: Vec<(EntityId, DamageInfo)>,
    }

    impl DamageSink for RecordingSink {
        fn apply_damage(&mut self, target: EntityId, damage: DamageInfo) {
            self.hits.push((target, damage));
        }
    }

    const PLAYER: EntityId = EntityId(9);
    const GUARD: EntityId = EntityId(1);

    #[test]
    fn test_attack_resets_cooldown_exactly() {
        let config = CombatConfig::default();
        let mut combat = CombatController::new(&config);
        let mut sink = RecordingSink::default();

        assert!(combat.try_attack(Some(GUARD), PLAYER, 1.5, &mut sink));
        assert_eq!(combat.cooldown_remaining(), config.attack_cooldown);

        let (target, damage) = sink.hits[0];
        assert_eq!(target, PLAYER);
        assert_eq!(damage.amount, 10.0);
        assert_eq!(damage.source_entity, Some(GUARD));
    }

    #[test]
    fn test_no_attack_out_of_range() {
        let mut combat = CombatController::new(&CombatConfig::default());
        let mut sink = RecordingSink::default();

        assert!(!combat.try_attack(None, PLAYER, 2.2, &mut sink));
        assert!(sink.hits.is_empty());
        assert_eq!(combat.cooldown_remaining(), 0.0);
    }

    #[test]
    fn test_no_attack_during_cooldown() {
        let mut combat = CombatController::new(&CombatConfig::default());
        let mut sink = RecordingSink::default();

        assert!(combat.try_attack(None, PLAYER, 1.0, &mut sink));
        combat.tick_cooldown(1.0, true);
        assert!(!combat.try_attack(None, PLAYER, 1.0, &mut sink));
        combat.tick_cooldown(0.5, true);
        assert!(combat.try_attack(None, PLAYER, 1.0, &mut sink));
        assert_eq!(sink.hits.len(), 2);
    }

    #[test]
    fn test_cooldown_clamped_at_zero() {
        let mut combat = CombatController::new(&CombatConfig::default());
        combat.tick_cooldown(100.0, false);
        assert_eq!(combat.cooldown_remaining(), 0.0);
    }

    #[test]
    fn test_while_attacking_policy() {
        let config = CombatConfig {
            cooldown_policy: CooldownPolicy::WhileAttacking,
            ..Default::default()
        };
        let mut combat = CombatController::new(&config);
        combat.try_attack(None, PLAYER, 1.0, &mut NullDamageSink);

        combat.tick_cooldown(1.0, false);
        assert_eq!(combat.cooldown_remaining(), 1.5);

        combat.tick_cooldown(1.0, true);
        assert_eq!(combat.cooldown_remaining(), 0.5);
    }
}
