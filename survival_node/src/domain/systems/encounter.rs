// Turn-based interaction between one player and one world entity.

use crate::domain::catalog::EntityKind;
use crate::domain::errors::ActionError;
use crate::domain::state::{Entity, Inventory};
use crate::domain::tuning::combat::EncounterTuning;
use rand::Rng;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EncounterAction {
    Collect,
    Attack,
    Laser,
    Flee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Turn {
    Player,
    Enemy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EncounterPhase {
    Open,
    /// Killing blow landed; the win is applied once the victory delay passes.
    Closing,
    Won,
    Fled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LootKind {
    Wood,
    Food,
    Water,
    Medkit,
    Laser,
    ChildSaved,
    /// Scavenged supplies from a kill; stocked as food.
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Loot {
    pub kind: LootKind,
    pub amount: u32,
    pub used_laser: bool,
}

/// What the caller has to do after an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Won(Loot),
    Fled,
    VictoryPending { delay: Duration },
    EnemyTurnPending { delay: Duration },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub id: u64,
    pub entity_id: String,
    pub kind: EntityKind,
    pub distance_m: f64,
    /// Drone link bought for an out-of-range target.
    pub remote_access: bool,
    pub enemy_hp: i64,
    pub enemy_max_hp: u32,
    pub turn: Turn,
    pub phase: EncounterPhase,
    /// Combat log, newest first.
    pub log: Vec<String>,
}

impl Encounter {
    pub fn open(
        id: u64,
        entity: &Entity,
        distance_m: f64,
        cfg: &EncounterTuning,
    ) -> Result<Self, ActionError> {
        if !entity.kind.is_collectible() && !entity.kind.is_enemy() {
            return Err(ActionError::NotInteractable);
        }

        let max_hp = entity
            .kind
            .config()
            .hp
            .unwrap_or(cfg.fallback_enemy_hp);
        let enemy_hp = entity.health.unwrap_or(max_hp);

        Ok(Self {
            id,
            entity_id: entity.id.clone(),
            kind: entity.kind,
            distance_m,
            remote_access: false,
            enemy_hp: i64::from(enemy_hp),
            enemy_max_hp: max_hp,
            turn: Turn::Player,
            phase: EncounterPhase::Open,
            log: vec!["Target signal acquired.".to_string()],
        })
    }

    pub fn is_out_of_range(&self, cfg: &EncounterTuning) -> bool {
        self.distance_m > cfg.physical_range_m
    }

    pub fn is_locked(&self, cfg: &EncounterTuning) -> bool {
        self.is_out_of_range(cfg) && !self.remote_access
    }

    pub fn is_open(&self) -> bool {
        self.phase == EncounterPhase::Open
    }

    /// Spend energy on a drone link so an out-of-range target can be reached.
    pub fn unlock(&mut self, energy: &mut f64, cfg: &EncounterTuning) -> Result<(), ActionError> {
        if !self.is_open() {
            return Err(ActionError::NoEncounter);
        }
        if !self.is_locked(cfg) {
            return Err(ActionError::AlreadyUnlocked);
        }
        if *energy < cfg.drone_link_cost {
            self.log
                .insert(0, "ERROR: INSUFFICIENT ENERGY FOR DRONE LINK.".to_string());
            return Err(ActionError::InsufficientEnergy {
                required: cfg.drone_link_cost,
                available: *energy,
            });
        }

        *energy -= cfg.drone_link_cost;
        self.remote_access = true;
        self.log
            .insert(0, "REMOTE DRONE LINK ESTABLISHED.".to_string());
        Ok(())
    }

    pub fn act<R: Rng + ?Sized>(
        &mut self,
        action: EncounterAction,
        laser_charges: u32,
        cfg: &EncounterTuning,
        rng: &mut R,
    ) -> Result<Step, ActionError> {
        if !self.is_open() {
            return Err(ActionError::NoEncounter);
        }
        if action != EncounterAction::Flee && self.is_locked(cfg) {
            return Err(ActionError::EncounterLocked);
        }

        match action {
            EncounterAction::Flee => {
                self.phase = EncounterPhase::Fled;
                Ok(Step::Fled)
            }
            EncounterAction::Collect => {
                if !self.kind.is_collectible() {
                    return Err(ActionError::WrongAction);
                }
                let loot = collect_loot(self.kind, rng);
                self.phase = EncounterPhase::Won;
                Ok(Step::Won(loot))
            }
            EncounterAction::Attack => {
                if !self.kind.is_enemy() {
                    return Err(ActionError::WrongAction);
                }
                if self.turn != Turn::Player {
                    return Err(ActionError::NotYourTurn);
                }
                let dmg = rng.gen_range(cfg.attack_min..cfg.attack_max);
                self.enemy_hp -= i64::from(dmg);
                self.log.insert(
                    0,
                    format!("Hit {} for {dmg} DMG!", self.kind.config().name),
                );

                if self.enemy_hp <= 0 {
                    self.enemy_hp = 0;
                    self.phase = EncounterPhase::Closing;
                    Ok(Step::VictoryPending {
                        delay: cfg.victory_delay,
                    })
                } else {
                    self.turn = Turn::Enemy;
                    Ok(Step::EnemyTurnPending {
                        delay: cfg.enemy_turn_delay,
                    })
                }
            }
            EncounterAction::Laser => {
                if !self.kind.is_enemy() {
                    return Err(ActionError::WrongAction);
                }
                if laser_charges == 0 {
                    return Err(ActionError::NoLaserCharge);
                }
                self.enemy_hp = 0;
                self.phase = EncounterPhase::Won;
                self.log
                    .insert(0, "FIRED ALIEN BLASTER! TARGET VAPORIZED.".to_string());
                Ok(Step::Won(Loot {
                    kind: LootKind::Generic,
                    amount: cfg.laser_bonus_loot,
                    used_laser: true,
                }))
            }
        }
    }

    /// Enemy retaliation once its turn comes up. Returns the damage dealt, if any.
    pub fn enemy_strike(&mut self, cfg: &EncounterTuning) -> Option<u32> {
        if !self.is_open() || self.turn != Turn::Enemy {
            return None;
        }
        let cfg_entry = self.kind.config();
        let damage = cfg_entry.damage.unwrap_or(cfg.fallback_enemy_damage);
        self.turn = Turn::Player;
        self.log.insert(
            0,
            format!("{} attacks! You took {damage} DMG.", cfg_entry.name),
        );
        Some(damage)
    }

    /// Close a pending victory and hand out the kill loot.
    pub fn finish_victory(&mut self) -> Option<Loot> {
        if self.phase != EncounterPhase::Closing {
            return None;
        }
        self.phase = EncounterPhase::Won;
        let kind = if self.kind == EntityKind::EnemyAlien {
            LootKind::Laser
        } else {
            LootKind::Generic
        };
        Some(Loot {
            kind,
            amount: 1,
            used_laser: false,
        })
    }
}

fn collect_loot<R: Rng + ?Sized>(kind: EntityKind, rng: &mut R) -> Loot {
    let (kind, amount) = match kind {
        EntityKind::ResourceWood => (LootKind::Wood, rng.gen_range(1..=3)),
        EntityKind::ResourceFood => (LootKind::Food, 1),
        EntityKind::ResourceWater => (LootKind::Water, 1),
        EntityKind::ResourceMedkit => (LootKind::Medkit, 1),
        EntityKind::ItemLaser => (LootKind::Laser, 1),
        EntityKind::MissionChild => (LootKind::ChildSaved, 1),
        _ => (LootKind::Generic, 1),
    };
    Loot {
        kind,
        amount,
        used_laser: false,
    }
}

/// Stock loot into the acting player's own inventory.
pub fn apply_loot(inventory: &mut Inventory, loot: &Loot) {
    match loot.kind {
        LootKind::Wood => inventory.wood += loot.amount,
        LootKind::Food | LootKind::Generic => inventory.food += f64::from(loot.amount),
        LootKind::Water => inventory.water += loot.amount,
        LootKind::Medkit => inventory.medkit += loot.amount,
        LootKind::Laser => inventory.laser += loot.amount,
        LootKind::ChildSaved => inventory.children_saved += 1,
    }
    if loot.used_laser {
        inventory.laser = inventory.laser.saturating_sub(1);
    }
}
