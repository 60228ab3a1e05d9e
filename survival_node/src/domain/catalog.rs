// Static attributes for every kind of world entity.

use serde::{Deserialize, Serialize};

/// Every kind of thing that can appear on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    ResourceWood,
    ResourceFood,
    ResourceWater,
    ResourceMedkit,
    ItemLaser,
    MissionChild,
    EnemyWolf,
    EnemyCultist,
    EnemyAlpha,
    EnemyAlien,
    Base,
}

/// Display and combat attributes for an entity kind.
#[derive(Debug, Clone, Copy)]
pub struct EntityConfig {
    pub name: &'static str,
    pub icon: &'static str,
    pub hp: Option<u32>,
    pub damage: Option<u32>,
}

const fn plain(name: &'static str, icon: &'static str) -> EntityConfig {
    EntityConfig {
        name,
        icon,
        hp: None,
        damage: None,
    }
}

const fn enemy(name: &'static str, icon: &'static str, hp: u32, damage: u32) -> EntityConfig {
    EntityConfig {
        name,
        icon,
        hp: Some(hp),
        damage: Some(damage),
    }
}

impl EntityKind {
    pub const ALL: [EntityKind; 11] = [
        EntityKind::ResourceWood,
        EntityKind::ResourceFood,
        EntityKind::ResourceWater,
        EntityKind::ResourceMedkit,
        EntityKind::ItemLaser,
        EntityKind::MissionChild,
        EntityKind::EnemyWolf,
        EntityKind::EnemyCultist,
        EntityKind::EnemyAlpha,
        EntityKind::EnemyAlien,
        EntityKind::Base,
    ];

    pub fn config(self) -> EntityConfig {
        match self {
            EntityKind::ResourceWood => plain("Old Pallets", "🪵"),
            EntityKind::ResourceFood => plain("Wild Berries", "🍒"),
            EntityKind::ResourceWater => plain("Rain Collector", "💧"),
            EntityKind::ResourceMedkit => plain("First Aid Kit", "💊"),
            EntityKind::ItemLaser => plain("Alien Blaster", "🔫"),
            EntityKind::MissionChild => plain("Lost Child", "👧"),
            EntityKind::EnemyWolf => enemy("Mutated Wolf", "🐺", 50, 10),
            EntityKind::EnemyCultist => enemy("Glitch Cultist", "🧙", 80, 15),
            EntityKind::EnemyAlpha => enemy("Alpha Beast", "👹", 200, 30),
            EntityKind::EnemyAlien => enemy("Grey Visitor", "👽", 150, 40),
            EntityKind::Base => plain("Safehouse", "⛺"),
        }
    }

    /// Resources, items and missions are collected rather than fought.
    pub fn is_collectible(self) -> bool {
        matches!(
            self,
            EntityKind::ResourceWood
                | EntityKind::ResourceFood
                | EntityKind::ResourceWater
                | EntityKind::ResourceMedkit
                | EntityKind::ItemLaser
                | EntityKind::MissionChild
        )
    }

    pub fn is_enemy(self) -> bool {
        matches!(
            self,
            EntityKind::EnemyWolf
                | EntityKind::EnemyCultist
                | EntityKind::EnemyAlpha
                | EntityKind::EnemyAlien
        )
    }
}
