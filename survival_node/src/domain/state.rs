// Domain-level world records: players, shared game state, entities and chat.

use crate::domain::catalog::EntityKind;
use serde::{Deserialize, Serialize};

/// A WGS84 fix in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassType {
    Scout,
    Engineer,
    Medic,
}

impl std::str::FromStr for ClassType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SCOUT" => Ok(ClassType::Scout),
            "ENGINEER" => Ok(ClassType::Engineer),
            "MEDIC" => Ok(ClassType::Medic),
            other => Err(format!("unknown class {other}")),
        }
    }
}

/// Stock carried by a player. Food is fractional because it decays every tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub wood: u32,
    pub food: f64,
    pub water: u32,
    pub medkit: u32,
    pub laser: u32,
    pub children_saved: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Peer identity of the owning node.
    pub id: String,
    pub name: String,
    pub class_type: ClassType,
    pub hp: f64,
    pub max_hp: f64,
    pub energy: f64,
    pub max_energy: f64,
    /// Body temperature gauge in `[0, 100]`.
    pub temperature: f64,
    pub is_dead: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Coordinates>,
    pub inventory: Inventory,
}

impl Player {
    /// Fresh survivor with the class defaults.
    pub fn new(id: impl Into<String>, name: impl Into<String>, class_type: ClassType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            class_type,
            hp: 100.0,
            max_hp: 100.0,
            energy: 100.0,
            max_energy: 100.0,
            temperature: 98.0,
            is_dead: false,
            position: None,
            inventory: Inventory {
                food: 3.0,
                water: 3,
                ..Inventory::default()
            },
        }
    }

    /// Pull every vital back into its declared range.
    pub fn clamp_vitals(&mut self) {
        self.hp = self.hp.clamp(0.0, self.max_hp);
        self.energy = self.energy.clamp(0.0, self.max_energy);
        self.temperature = self.temperature.clamp(0.0, 100.0);
        self.inventory.food = self.inventory.food.max(0.0);
    }

    /// Subtract hp, marking the player dead when it reaches zero. Returns true on death.
    pub fn take_damage(&mut self, amount: f64) -> bool {
        if self.is_dead {
            return false;
        }
        self.hp -= amount;
        if self.hp <= 0.0 {
            self.hp = 0.0;
            self.is_dead = true;
            return true;
        }
        self.clamp_vitals();
        false
    }
}

/// Host-owned shared state replicated to every client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub day: u32,
    pub is_night: bool,
    pub base_level: u32,
    pub base_health: u32,
    pub base_max_health: u32,
    pub base_location: Option<Coordinates>,
    /// Narrative lines, newest first.
    pub logs: Vec<String>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            day: 1,
            is_night: false,
            base_level: 1,
            base_health: 100,
            base_max_health: 100,
            base_location: None,
            logs: vec![
                "System Initialized...".to_string(),
                "Awaiting Deployment...".to_string(),
            ],
        }
    }
}

impl GameState {
    pub fn push_log(&mut self, line: impl Into<String>) {
        self.logs.insert(0, line.into());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub position: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_health: Option<u32>,
    pub name: String,
    pub icon: String,
    /// Meters from the local observer; recomputed locally, never replicated.
    #[serde(skip)]
    pub distance: Option<f64>,
}

impl Entity {
    pub fn new(id: impl Into<String>, kind: EntityKind, position: Coordinates) -> Self {
        let cfg = kind.config();
        Self {
            id: id.into(),
            kind,
            position,
            health: cfg.hp,
            max_health: cfg.hp,
            name: cfg.name.to_string(),
            icon: cfg.icon.to_string(),
            distance: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender_name: String,
    pub text: String,
    /// Epoch milliseconds.
    pub timestamp: u64,
}
