/// Gameplay tuning for the per-tick survival simulation.
///
/// Every rate is per tick; the node ticks once per second.

#[derive(Debug, Clone, Copy)]
pub struct SurvivalTuning {
    /// Distance from the base (meters) under which a player counts as sheltered.
    pub base_radius_m: f64,

    /// Energy regained per tick inside / outside the base.
    pub energy_regen_in_base: f64,
    pub energy_regen_outside: f64,

    /// Temperature change per tick inside / outside the base.
    pub warmth_in_base: f64,
    pub chill_outside: f64,

    /// Food consumed per tick while any is left.
    pub food_decay: f64,

    /// Health lost per tick with no food, no water, or below the cold threshold.
    pub starvation_damage: f64,
    pub dehydration_damage: f64,
    pub cold_damage: f64,
    pub cold_threshold: f64,
}

impl Default for SurvivalTuning {
    fn default() -> Self {
        Self {
            base_radius_m: 50.0,
            energy_regen_in_base: 0.5,
            energy_regen_outside: 0.05,
            warmth_in_base: 0.5,
            chill_outside: 0.1,
            food_decay: 0.02,
            starvation_damage: 0.5,
            dehydration_damage: 0.5,
            cold_damage: 1.0,
            cold_threshold: 15.0,
        }
    }
}

/// Effects of consuming carried items.
#[derive(Debug, Clone, Copy)]
pub struct ItemTuning {
    pub food_heal: f64,
    pub water_energy: f64,
    pub medkit_heal: f64,
    /// Medkit heal when the user is a medic.
    pub medic_medkit_heal: f64,
}

impl Default for ItemTuning {
    fn default() -> Self {
        Self {
            food_heal: 5.0,
            water_energy: 20.0,
            medkit_heal: 25.0,
            medic_medkit_heal: 50.0,
        }
    }
}
