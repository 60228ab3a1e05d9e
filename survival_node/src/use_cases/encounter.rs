// Encounter workflow on top of the pure resolver: opening, the drone link, turns,
// and the delayed enemy strike / victory events the node feeds back in.

use super::session::Session;
use super::types::{ActionReport, ActionResult, Deferred, DeferredEvent};
use crate::domain::ActionError;
use crate::domain::geo::distance_m;
use crate::domain::systems::encounter::{self, Encounter, EncounterAction, Loot, LootKind, Step};
use tracing::{debug, info};

impl Session {
    /// Open an encounter with a world entity.
    pub fn engage(&mut self, entity_id: &str) -> ActionResult {
        if self.player.is_dead {
            return Err(ActionError::PlayerDead);
        }
        let position = self.player.position.ok_or(ActionError::NoPosition)?;
        if self.encounter.is_some() {
            return Err(ActionError::EncounterInProgress);
        }
        let entity = self
            .entities
            .iter()
            .find(|e| e.id == entity_id)
            .ok_or(ActionError::UnknownEntity)?;

        let distance = distance_m(position, entity.position);
        let opened = Encounter::open(
            self.next_encounter_id,
            entity,
            distance,
            &self.settings.encounter,
        )?;
        self.next_encounter_id += 1;

        let locked = opened.is_locked(&self.settings.encounter);
        let name = entity.name.clone();
        debug!(entity_id, distance_m = distance, locked, "encounter opened");
        self.encounter = Some(opened);

        if locked {
            Ok(ActionReport::new(format!(
                "{name} is {distance:.0}m away. Move closer or deploy the drone."
            )))
        } else {
            Ok(ActionReport::new(format!("Engaged {name}.")))
        }
    }

    /// Buy a drone link for an out-of-range target.
    pub fn hack(&mut self) -> ActionResult {
        if self.player.is_dead {
            return Err(ActionError::PlayerDead);
        }
        if self.player.position.is_none() {
            return Err(ActionError::NoPosition);
        }
        let enc = self.encounter.as_mut().ok_or(ActionError::NoEncounter)?;
        enc.unlock(&mut self.player.energy, &self.settings.encounter)?;
        Ok(ActionReport::new("Remote drone link established."))
    }

    /// Fleeing stays possible without a fix; everything else needs one.
    pub fn act(&mut self, action: EncounterAction) -> ActionResult {
        if self.player.is_dead {
            return Err(ActionError::PlayerDead);
        }
        if self.player.position.is_none() && action != EncounterAction::Flee {
            return Err(ActionError::NoPosition);
        }
        let enc = self.encounter.as_mut().ok_or(ActionError::NoEncounter)?;
        let step = enc.act(
            action,
            self.player.inventory.laser,
            &self.settings.encounter,
            &mut self.rng,
        )?;
        let encounter_id = enc.id;

        match step {
            Step::Won(loot) => Ok(self.win(loot)),
            Step::Fled => {
                self.encounter = None;
                Ok(ActionReport::new("You got away."))
            }
            Step::EnemyTurnPending { delay } => {
                self.defer(Deferred {
                    delay,
                    event: DeferredEvent::EnemyTurn { encounter_id },
                });
                Ok(ActionReport::new("Hit landed. Brace yourself."))
            }
            Step::VictoryPending { delay } => {
                self.defer(Deferred {
                    delay,
                    event: DeferredEvent::Victory { encounter_id },
                });
                Ok(ActionReport::new("Target down."))
            }
        }
    }

    /// Fire a delayed event. Events for an encounter that is gone are dropped.
    pub fn resolve_deferred(&mut self, event: DeferredEvent) -> Option<ActionReport> {
        match event {
            DeferredEvent::EnemyTurn { encounter_id } => {
                let enc = self.encounter.as_mut().filter(|enc| enc.id == encounter_id)?;
                let damage = enc.enemy_strike(&self.settings.encounter)?;
                let died = self.player.take_damage(f64::from(damage));
                if died {
                    info!(damage, "killed in combat");
                    self.encounter = None;
                    return Some(ActionReport::new(format!(
                        "Took {damage} DMG. Vital signs terminated."
                    )));
                }
                Some(ActionReport::new(format!("Took {damage} DMG.")))
            }
            DeferredEvent::Victory { encounter_id } => {
                let enc = self.encounter.as_mut().filter(|enc| enc.id == encounter_id)?;
                let loot = enc.finish_victory()?;
                Some(self.win(loot))
            }
        }
    }

    /// Remove the target, stock the loot, and (on the host) publish the new world.
    fn win(&mut self, loot: Loot) -> ActionReport {
        let Some(enc) = self.encounter.take() else {
            return ActionReport::with_loot("Target cleared.", loot);
        };
        self.entities.retain(|e| e.id != enc.entity_id);
        encounter::apply_loot(&mut self.player.inventory, &loot);
        if self.is_host {
            self.commit_world();
        }

        info!(
            entity_id = %enc.entity_id,
            kind = ?loot.kind,
            amount = loot.amount,
            "encounter won"
        );
        ActionReport::with_loot(loot_message(&loot), loot)
    }
}

fn loot_message(loot: &Loot) -> String {
    let what = match loot.kind {
        LootKind::Wood => "wood",
        LootKind::Food | LootKind::Generic => "food",
        LootKind::Water => "water",
        LootKind::Medkit => "medkit",
        LootKind::Laser => "alien blaster charge",
        LootKind::ChildSaved => return "Child rescued!".to_string(),
    };
    format!("Gained {} {what}.", loot.amount)
}

#[cfg(test)]
mod tests {
    use crate::domain::systems::encounter::{EncounterAction, LootKind};
    use crate::domain::{
        ActionError, Coordinates, Entity, EntityKind, GameState, Outbound, Packet, PacketBody,
        WorldSnapshot,
    };
    use crate::use_cases::session::Session;
    use crate::use_cases::test_support::{client_session, host_session, position_north};
    use crate::use_cases::types::DeferredEvent;

    const ORIGIN: Coordinates = Coordinates { lat: 0.0, lng: 0.0 };

    fn with_target(mut session: Session, kind: EntityKind, meters: f64) -> Session {
        session.set_position(ORIGIN);
        session
            .entities
            .push(Entity::new("target", kind, position_north(meters)));
        session.refresh_distances();
        session
    }

    #[test]
    fn when_food_is_45m_away_then_drone_link_unlocks_collection() {
        let mut host = with_target(host_session(), EntityKind::ResourceFood, 45.0);
        host.player.energy = 20.0;
        host.engage("target").expect("engage");

        assert_eq!(host.act(EncounterAction::Collect), Err(ActionError::EncounterLocked));
        host.hack().expect("hack");
        assert!((host.player().energy - 5.0).abs() < 1e-9);

        let report = host.act(EncounterAction::Collect).expect("collect");
        assert_eq!(report.loot.map(|l| l.kind), Some(LootKind::Food));
        assert_eq!(host.player().inventory.food, 4.0);
        assert!(host.entities().is_empty());
        assert!(host.encounter().is_none());
    }

    #[test]
    fn when_energy_is_short_then_hack_fails_and_lock_remains() {
        let mut host = with_target(host_session(), EntityKind::ResourceFood, 45.0);
        host.player.energy = 14.0;
        host.engage("target").expect("engage");
        assert!(matches!(host.hack(), Err(ActionError::InsufficientEnergy { .. })));
        assert_eq!(host.player().energy, 14.0);
        assert_eq!(host.act(EncounterAction::Collect), Err(ActionError::EncounterLocked));
    }

    #[test]
    fn when_host_collects_then_world_is_republished() {
        let mut host = with_target(host_session(), EntityKind::ResourceWood, 10.0);
        host.engage("target").expect("engage");
        host.act(EncounterAction::Collect).expect("collect");
        let outbox = host.drain_outbox();
        assert!(outbox.iter().any(|out| matches!(
            out,
            Outbound::Broadcast(p) if matches!(&p.body, PacketBody::WorldUpdate(s) if s.entities.is_empty())
        )));
        assert_eq!(host.revision(), 1);
    }

    #[test]
    fn when_client_collects_then_removal_is_local_only() {
        let mut client = with_target(client_session(), EntityKind::ResourceWood, 10.0);
        client.engage("target").expect("engage");
        client.act(EncounterAction::Collect).expect("collect");
        assert!(client.entities().is_empty());
        assert!(client.drain_outbox().is_empty());
        assert_eq!(client.revision(), 0);
    }

    #[test]
    fn when_host_still_lists_a_client_collect_then_it_reappears_and_loot_is_kept() {
        let mut client = with_target(client_session(), EntityKind::ResourceWood, 10.0);
        client.engage("target").expect("engage");
        client.act(EncounterAction::Collect).expect("collect");
        let wood = client.player().inventory.wood;
        assert!(wood > 0);

        client.handle_packet(Packet {
            sender_id: "host".to_string(),
            body: PacketBody::WorldUpdate(WorldSnapshot {
                revision: 1,
                game_state: GameState::default(),
                entities: vec![Entity::new(
                    "target",
                    EntityKind::ResourceWood,
                    position_north(10.0),
                )],
            }),
        });

        assert_eq!(client.entities().len(), 1);
        assert_eq!(client.entities()[0].id, "target");
        assert_eq!(client.player().inventory.wood, wood);
    }

    #[test]
    fn when_engaged_already_then_second_engage_is_refused() {
        let mut host = with_target(host_session(), EntityKind::EnemyWolf, 10.0);
        host.engage("target").expect("engage");
        assert_eq!(host.engage("target"), Err(ActionError::EncounterInProgress));
    }

    #[test]
    fn unknown_targets_and_missing_fix_are_refused() {
        let mut host = host_session();
        assert_eq!(host.engage("target"), Err(ActionError::NoPosition));
        host.set_position(ORIGIN);
        assert_eq!(host.engage("ghost"), Err(ActionError::UnknownEntity));
        assert_eq!(host.hack(), Err(ActionError::NoEncounter));
    }

    #[test]
    fn when_fix_is_lost_then_encounter_actions_are_refused() {
        let mut host = with_target(host_session(), EntityKind::ResourceFood, 45.0);
        host.player.energy = 20.0;
        host.engage("target").expect("engage");
        host.position_unavailable();

        assert_eq!(host.hack(), Err(ActionError::NoPosition));
        assert_eq!(host.player().energy, 20.0);
        assert_eq!(host.act(EncounterAction::Collect), Err(ActionError::NoPosition));
        assert_eq!(host.player().inventory.food, 3.0);
        assert_eq!(host.entities().len(), 1);

        host.act(EncounterAction::Flee).expect("flee");
        assert!(host.encounter().is_none());
    }

    #[test]
    fn when_enemy_survives_then_its_strike_lands_after_the_delay() {
        let mut host = with_target(host_session(), EntityKind::EnemyAlpha, 10.0);
        host.engage("target").expect("engage");
        host.act(EncounterAction::Attack).expect("attack");

        let deferred = host.drain_deferred();
        assert_eq!(deferred.len(), 1);
        assert!(matches!(deferred[0].event, DeferredEvent::EnemyTurn { .. }));
        assert_eq!(host.act(EncounterAction::Attack), Err(ActionError::NotYourTurn));

        let report = host.resolve_deferred(deferred[0].event).expect("strike");
        assert_eq!(report.message, "Took 30 DMG.");
        assert_eq!(host.player().hp, 70.0);
        assert!(host.resolve_deferred(deferred[0].event).is_none());
    }

    #[test]
    fn when_enemy_strike_is_lethal_then_encounter_closes() {
        let mut host = with_target(host_session(), EntityKind::EnemyAlien, 10.0);
        host.player.hp = 30.0;
        host.engage("target").expect("engage");
        host.act(EncounterAction::Attack).expect("attack");
        let event = host.drain_deferred()[0].event;
        host.resolve_deferred(event).expect("strike");
        assert!(host.player().is_dead);
        assert!(host.encounter().is_none());
        assert_eq!(host.entities().len(), 1);
    }

    #[test]
    fn when_fleeing_mid_fight_then_pending_strike_is_dropped() {
        let mut host = with_target(host_session(), EntityKind::EnemyAlpha, 10.0);
        host.engage("target").expect("engage");
        host.act(EncounterAction::Attack).expect("attack");
        let event = host.drain_deferred()[0].event;
        host.act(EncounterAction::Flee).expect("flee");
        assert!(host.resolve_deferred(event).is_none());
        assert_eq!(host.player().hp, 100.0);
    }

    #[test]
    fn when_killing_blow_lands_then_loot_arrives_with_the_victory_event() {
        let mut host = with_target(host_session(), EntityKind::EnemyWolf, 10.0);
        host.entities[0].health = Some(1);
        host.engage("target").expect("engage");
        host.act(EncounterAction::Attack).expect("attack");
        assert_eq!(host.entities().len(), 1);

        let event = host.drain_deferred()[0].event;
        assert!(matches!(event, DeferredEvent::Victory { .. }));
        let report = host.resolve_deferred(event).expect("victory");
        assert_eq!(report.loot.map(|l| l.kind), Some(LootKind::Generic));
        assert!(host.entities().is_empty());
        assert_eq!(host.player().inventory.food, 4.0);
    }

    #[test]
    fn laser_kill_spends_a_charge_and_grants_five_food() {
        let mut host = with_target(host_session(), EntityKind::EnemyAlpha, 10.0);
        host.player.inventory.laser = 1;
        host.engage("target").expect("engage");
        host.act(EncounterAction::Laser).expect("laser");
        assert_eq!(host.player().inventory.laser, 0);
        assert_eq!(host.player().inventory.food, 8.0);
        assert!(host.entities().is_empty());
    }

    #[test]
    fn dead_players_cannot_engage() {
        let mut host = with_target(host_session(), EntityKind::ResourceWood, 10.0);
        host.player.is_dead = true;
        assert_eq!(host.engage("target"), Err(ActionError::PlayerDead));
    }
}
