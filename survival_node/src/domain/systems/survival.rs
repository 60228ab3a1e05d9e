use crate::domain::geo::distance_m;
use crate::domain::state::{Coordinates, Player};
use crate::domain::tuning::survival::SurvivalTuning;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// No fix or already dead; nothing changed.
    Skipped,
    Alive { hp_change: f64, in_base: bool },
    Died,
}

/// True when `position` is inside the sheltered radius of the base.
pub fn is_in_base(position: Coordinates, base: Option<Coordinates>, cfg: &SurvivalTuning) -> bool {
    base.is_some_and(|base| distance_m(position, base) < cfg.base_radius_m)
}

/// Apply one tick of vitals decay/regeneration to the local player.
pub fn tick_player(
    player: &mut Player,
    position: Option<Coordinates>,
    base: Option<Coordinates>,
    cfg: &SurvivalTuning,
) -> TickOutcome {
    let Some(position) = position else {
        return TickOutcome::Skipped;
    };
    if player.is_dead {
        return TickOutcome::Skipped;
    }

    let in_base = is_in_base(position, base, cfg);

    player.energy += if in_base {
        cfg.energy_regen_in_base
    } else {
        cfg.energy_regen_outside
    };

    if in_base {
        player.temperature += cfg.warmth_in_base;
    } else {
        player.temperature -= cfg.chill_outside;
    }
    player.temperature = player.temperature.clamp(0.0, 100.0);

    // Penalties look at the stock the tick started with.
    let starving = player.inventory.food <= 0.0;
    let parched = player.inventory.water == 0;

    if !starving {
        player.inventory.food = (player.inventory.food - cfg.food_decay).max(0.0);
    }

    let mut hp_change = 0.0;
    if starving {
        hp_change -= cfg.starvation_damage;
    }
    if parched {
        hp_change -= cfg.dehydration_damage;
    }
    if player.temperature < cfg.cold_threshold {
        hp_change -= cfg.cold_damage;
    }

    player.hp += hp_change;
    if player.hp <= 0.0 {
        player.clamp_vitals();
        player.hp = 0.0;
        player.is_dead = true;
        return TickOutcome::Died;
    }

    player.clamp_vitals();
    TickOutcome::Alive { hp_change, in_base }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::ClassType;

    const HOME: Coordinates = Coordinates {
        lat: 38.7223,
        lng: -9.1393,
    };
    const FAR: Coordinates = Coordinates {
        lat: 38.7323,
        lng: -9.1393,
    };

    fn survivor() -> Player {
        Player::new("p1", "Ana", ClassType::Scout)
    }

    #[test]
    fn when_position_is_missing_then_tick_is_skipped() {
        let mut player = survivor();
        let before = player.clone();
        let outcome = tick_player(&mut player, None, Some(HOME), &SurvivalTuning::default());
        assert_eq!(outcome, TickOutcome::Skipped);
        assert_eq!(player, before);
    }

    #[test]
    fn when_player_is_dead_then_vitals_do_not_decay() {
        let mut player = survivor();
        player.is_dead = true;
        player.hp = 0.0;
        let before = player.clone();
        let outcome = tick_player(&mut player, Some(FAR), Some(HOME), &SurvivalTuning::default());
        assert_eq!(outcome, TickOutcome::Skipped);
        assert_eq!(player, before);
    }

    #[test]
    fn when_starving_parched_and_cold_then_hp_drops_by_two_per_tick() {
        let mut player = survivor();
        player.inventory.food = 0.0;
        player.inventory.water = 0;
        player.temperature = 10.0;

        for expected in [98.0, 96.0, 94.0] {
            tick_player(&mut player, Some(FAR), Some(HOME), &SurvivalTuning::default());
            assert!((player.hp - expected).abs() < 1e-9, "hp {}", player.hp);
        }
    }

    #[test]
    fn when_inside_base_then_energy_and_warmth_recover() {
        let mut player = survivor();
        player.energy = 10.0;
        player.temperature = 50.0;
        let outcome = tick_player(&mut player, Some(HOME), Some(HOME), &SurvivalTuning::default());
        assert!(matches!(outcome, TickOutcome::Alive { in_base: true, .. }));
        assert!((player.energy - 10.5).abs() < 1e-9);
        assert!((player.temperature - 50.5).abs() < 1e-9);
    }

    #[test]
    fn when_outside_base_then_energy_trickles_and_body_cools() {
        let mut player = survivor();
        player.energy = 10.0;
        tick_player(&mut player, Some(FAR), Some(HOME), &SurvivalTuning::default());
        assert!((player.energy - 10.05).abs() < 1e-9);
        assert!((player.temperature - 97.9).abs() < 1e-9);
    }

    #[test]
    fn when_food_is_held_then_it_decays_without_damage() {
        let mut player = survivor();
        tick_player(&mut player, Some(FAR), None, &SurvivalTuning::default());
        assert!((player.inventory.food - 2.98).abs() < 1e-9);
        assert_eq!(player.hp, 100.0);
    }

    #[test]
    fn when_food_is_empty_then_it_stays_at_zero() {
        let mut player = survivor();
        player.inventory.food = 0.0;
        tick_player(&mut player, Some(FAR), None, &SurvivalTuning::default());
        assert_eq!(player.inventory.food, 0.0);
        assert!((player.hp - 99.5).abs() < 1e-9);
    }

    #[test]
    fn when_hp_runs_out_then_player_dies_and_further_ticks_skip() {
        let mut player = survivor();
        player.hp = 1.5;
        player.inventory.food = 0.0;
        player.inventory.water = 0;
        player.temperature = 5.0;

        assert_eq!(
            tick_player(&mut player, Some(FAR), Some(HOME), &SurvivalTuning::default()),
            TickOutcome::Died
        );
        assert_eq!(player.hp, 0.0);
        assert!(player.is_dead);
        assert_eq!(
            tick_player(&mut player, Some(FAR), Some(HOME), &SurvivalTuning::default()),
            TickOutcome::Skipped
        );
    }

    #[test]
    fn vitals_stay_clamped_over_long_runs() {
        let cfg = SurvivalTuning::default();
        let mut sheltered = survivor();
        let mut exposed = survivor();
        exposed.inventory.water = 0;

        for _ in 0..2_000 {
            tick_player(&mut sheltered, Some(HOME), Some(HOME), &cfg);
            tick_player(&mut exposed, Some(FAR), Some(HOME), &cfg);
            for p in [&sheltered, &exposed] {
                assert!((0.0..=p.max_hp).contains(&p.hp));
                assert!((0.0..=p.max_energy).contains(&p.energy));
                assert!((0.0..=100.0).contains(&p.temperature));
            }
        }
        assert!(exposed.is_dead);
        assert_eq!(sheltered.temperature, 100.0);
        assert_eq!(sheltered.energy, sheltered.max_energy);
    }
}
