use crate::domain::catalog::EntityKind;
use crate::domain::geo::random_offset_in_ring;
use crate::domain::state::{Coordinates, Entity};
use crate::domain::tuning::world::SpawnTuning;
use rand::{Rng, RngCore};

/// Cumulative spawn odds, rarest first. Anything past the last bound is wood.
const SPAWN_TABLE: [(f64, EntityKind); 7] = [
    (0.02, EntityKind::EnemyAlien),
    (0.05, EntityKind::MissionChild),
    (0.10, EntityKind::ResourceMedkit),
    (0.20, EntityKind::EnemyAlpha),
    (0.40, EntityKind::EnemyWolf),
    (0.60, EntityKind::ResourceFood),
    (0.80, EntityKind::ResourceWater),
];

/// Map one uniform draw in `[0, 1]` onto an entity kind.
pub fn roll_kind(draw: f64) -> EntityKind {
    SPAWN_TABLE
        .iter()
        .find(|(bound, _)| draw < *bound)
        .map(|(_, kind)| *kind)
        .unwrap_or(EntityKind::ResourceWood)
}

/// Random v4-style id drawn from the provided source.
pub fn entity_id<R: RngCore + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}

/// Generate a fresh batch of entities in a ring around `center`.
pub fn spawn_batch<R: Rng + ?Sized>(
    center: Coordinates,
    spawn_radius_m: f64,
    cfg: &SpawnTuning,
    rng: &mut R,
) -> Vec<Entity> {
    let count = cfg.base_count + rng.gen_range(0..=cfg.extra_count);
    let outer = cfg.min_distance_m + spawn_radius_m.max(0.0);

    (0..count)
        .map(|_| {
            let kind = roll_kind(rng.gen_range(0.0..1.0));
            let position = random_offset_in_ring(center, cfg.min_distance_m, outer, rng);
            Entity::new(entity_id(rng), kind, position)
        })
        .collect()
}
