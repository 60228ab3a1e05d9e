/// Gameplay tuning for encounters and revives.
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct EncounterTuning {
    /// Beyond this distance (meters) a target needs a drone link before interaction.
    pub physical_range_m: f64,

    /// Energy spent to open a drone link.
    pub drone_link_cost: f64,

    /// Player attack damage is drawn from `attack_min..attack_max`.
    pub attack_min: u32,
    pub attack_max: u32,

    /// Health assumed for enemies missing a catalog value.
    pub fallback_enemy_hp: u32,
    /// Retaliation for enemies missing a catalog value.
    pub fallback_enemy_damage: u32,

    /// Bonus loot granted by a laser kill.
    pub laser_bonus_loot: u32,

    /// Pause before the enemy strikes back.
    pub enemy_turn_delay: Duration,
    /// Pause between a killing blow and the encounter closing.
    pub victory_delay: Duration,
}

impl Default for EncounterTuning {
    fn default() -> Self {
        Self {
            physical_range_m: 40.0,
            drone_link_cost: 15.0,
            attack_min: 5,
            attack_max: 20,
            fallback_enemy_hp: 50,
            fallback_enemy_damage: 5,
            laser_bonus_loot: 5,
            enemy_turn_delay: Duration::from_secs(1),
            victory_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReviveTuning {
    /// Reviver must be strictly closer than this (meters).
    pub range_m: f64,
    /// Health restored on revive.
    pub revive_hp: f64,
}

impl Default for ReviveTuning {
    fn default() -> Self {
        Self {
            range_m: 15.0,
            revive_hp: 50.0,
        }
    }
}
