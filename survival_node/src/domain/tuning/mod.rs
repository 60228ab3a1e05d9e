// Gameplay tuning, kept apart from runtime configuration.

pub mod combat;
pub mod survival;
pub mod world;
