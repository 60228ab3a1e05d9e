// Day/night transitions and base upkeep on the shared game state.

use crate::domain::errors::ActionError;
use crate::domain::state::GameState;
use crate::domain::tuning::world::BaseTuning;

/// Health label handed to the narrator.
pub fn player_status(hp: f64) -> &'static str {
    if hp < 50.0 { "Injured" } else { "Healthy" }
}

/// Damage the base takes tonight. `roll` is the random part of the attack.
pub fn night_damage(day: u32, base_level: u32, roll: u32, cfg: &BaseTuning) -> u32 {
    let defense = base_level.saturating_mul(cfg.defense_per_level);
    let attack = roll.saturating_add(day.saturating_mul(cfg.attack_per_day));
    attack.saturating_sub(defense)
}

/// Day -> night: apply the attack and record the report. Returns the damage taken.
pub fn fall_night(state: &mut GameState, narrative: String, roll: u32, cfg: &BaseTuning) -> u32 {
    let damage = night_damage(state.day, state.base_level, roll, cfg);
    state.is_night = true;
    state.base_health = state.base_health.saturating_sub(damage);
    state.push_log(format!("Base took {damage} damage."));
    state.push_log(narrative);
    damage
}

/// Night -> day.
pub fn break_day(state: &mut GameState) {
    state.is_night = false;
    state.day += 1;
}

pub fn upgrade_cost(state: &GameState, cfg: &BaseTuning) -> u32 {
    state.base_level * cfg.upgrade_wood_per_level
}

/// Spend wood to raise the base one level and fully repair it.
pub fn upgrade_base(state: &mut GameState, wood: &mut u32, cfg: &BaseTuning) -> Result<(), ActionError> {
    if state.base_location.is_none() {
        return Err(ActionError::NoBase);
    }
    let cost = upgrade_cost(state, cfg);
    if *wood < cost {
        return Err(ActionError::NotEnoughWood {
            required: cost,
            available: *wood,
        });
    }
    *wood -= cost;
    state.base_level += 1;
    state.base_max_health += cfg.upgrade_max_health;
    state.base_health = state.base_max_health;
    Ok(())
}
