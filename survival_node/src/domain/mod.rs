// Domain layer: core survival types and rules.

pub mod catalog;
pub mod errors;
pub mod geo;
pub mod packet;
pub mod ports;
pub mod state;
pub mod systems;
pub mod tuning;

pub use catalog::EntityKind;
pub use errors::ActionError;
pub use packet::{Outbound, Packet, PacketBody, WorldSnapshot};
pub use state::{ChatMessage, ClassType, Coordinates, Entity, GameState, Inventory, Player};
