/// Gameplay tuning for world generation and the base.

#[derive(Debug, Clone, Copy)]
pub struct SpawnTuning {
    /// Every batch has at least this many entities.
    pub base_count: usize,
    /// Up to this many extra entities are added per batch.
    pub extra_count: usize,
    /// No entity spawns closer than this to the center (meters).
    pub min_distance_m: f64,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            base_count: 5,
            extra_count: 4,
            min_distance_m: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BaseTuning {
    /// Defense contributed per base level against the nightly attack.
    pub defense_per_level: u32,
    /// Nightly attack is `0..attack_spread` plus `day * attack_per_day`.
    pub attack_spread: u32,
    pub attack_per_day: u32,
    /// Wood per base level needed for an upgrade.
    pub upgrade_wood_per_level: u32,
    pub upgrade_max_health: u32,
}

impl Default for BaseTuning {
    fn default() -> Self {
        Self {
            defense_per_level: 10,
            attack_spread: 50,
            attack_per_day: 5,
            upgrade_wood_per_level: 5,
            upgrade_max_health: 50,
        }
    }
}
