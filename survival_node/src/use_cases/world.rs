// Host-authoritative world mutations: the base, the day/night cycle and spawning.

use super::narration::FALLBACK_LINES;
use super::session::Session;
use super::types::{ActionReport, ActionResult, NightRequest, PhaseToggle};
use crate::domain::systems::{cycle, spawn};
use crate::domain::{ActionError, Coordinates};
use rand::Rng;
use tracing::info;

impl Session {
    /// Place the base at `at` (or the current fix) and seed the area around it.
    pub fn establish_base(&mut self, at: Option<Coordinates>) -> ActionResult {
        self.require_host()?;
        if self.game_state.base_location.is_some() {
            return Err(ActionError::BaseAlreadyEstablished);
        }
        let location = at.or(self.player.position).ok_or(ActionError::NoPosition)?;

        self.game_state.base_location = Some(location);
        self.game_state.push_log(format!(
            "Base established at {:.4}, {:.4}",
            location.lat, location.lng
        ));
        let spawned = self.spawn_around(location);
        self.commit_world();

        info!(lat = location.lat, lng = location.lng, spawned, "base established");
        Ok(ActionReport::new("Base established."))
    }

    /// Day ends into a night that still needs narrating; night ends into a fresh day.
    pub fn toggle_phase(&mut self) -> Result<PhaseToggle, ActionError> {
        self.require_host()?;
        if self.night_pending {
            return Err(ActionError::PhaseChangePending);
        }

        if self.game_state.is_night {
            cycle::break_day(&mut self.game_state);
            let spawned = match self.game_state.base_location {
                Some(base) => self.spawn_around(base),
                None => 0,
            };
            self.commit_world();
            info!(day = self.game_state.day, spawned, "day broke");
            return Ok(PhaseToggle::Day(ActionReport::new(format!(
                "Day {} begins.",
                self.game_state.day
            ))));
        }

        self.night_pending = true;
        Ok(PhaseToggle::NightPending(NightRequest {
            day: self.game_state.day,
            base_health: self.game_state.base_health,
            player_status: cycle::player_status(self.player.hp),
            fallback_pick: self.rng.gen_range(0..FALLBACK_LINES.len()),
        }))
    }

    /// Second half of nightfall, once the narrative is in hand.
    pub fn complete_night(&mut self, narrative: String) -> ActionResult {
        self.require_host()?;
        if !self.night_pending {
            return Err(ActionError::PhaseChangePending);
        }
        self.night_pending = false;

        let roll = self.rng.gen_range(0..self.settings.base.attack_spread.max(1));
        let damage = cycle::fall_night(&mut self.game_state, narrative, roll, &self.settings.base);
        self.commit_world();

        info!(
            day = self.game_state.day,
            damage,
            base_health = self.game_state.base_health,
            "night fell"
        );
        Ok(ActionReport::new(format!("Night falls. Base took {damage} damage.")))
    }

    pub fn upgrade_base(&mut self) -> ActionResult {
        self.require_host()?;
        cycle::upgrade_base(
            &mut self.game_state,
            &mut self.player.inventory.wood,
            &self.settings.base,
        )?;
        let level = self.game_state.base_level;
        self.game_state.push_log(format!("Base upgraded to level {level}."));
        self.commit_world();

        info!(level, "base upgraded");
        Ok(ActionReport::new(format!("Base upgraded to level {level}.")))
    }

    /// Append a fresh batch around `center`. Returns how many were added.
    fn spawn_around(&mut self, center: Coordinates) -> usize {
        let batch = spawn::spawn_batch(
            center,
            self.settings.spawn_radius_m,
            &self.settings.spawn,
            &mut self.rng,
        );
        let count = batch.len();
        self.entities.extend(batch);
        self.refresh_distances();
        count
    }
}
