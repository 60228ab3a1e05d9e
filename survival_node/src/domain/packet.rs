// Replication packets exchanged between peers, independent of the wire encoding.

use crate::domain::state::{ChatMessage, Entity, GameState, Player};

/// Full authoritative world copy published by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSnapshot {
    /// Host logical clock; bumped on every authoritative mutation.
    pub revision: u64,
    pub game_state: GameState,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PacketBody {
    Hello,
    PlayerUpdate(Player),
    WorldUpdate(WorldSnapshot),
    ReviveRequest { target_id: String },
    Chat(ChatMessage),
}

impl PacketBody {
    pub fn kind(&self) -> &'static str {
        match self {
            PacketBody::Hello => "HELLO",
            PacketBody::PlayerUpdate(_) => "PLAYER_UPDATE",
            PacketBody::WorldUpdate(_) => "WORLD_UPDATE",
            PacketBody::ReviveRequest { .. } => "REVIVE_REQUEST",
            PacketBody::Chat(_) => "CHAT",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub sender_id: String,
    pub body: PacketBody,
}

/// Where an outgoing packet should go.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Broadcast(Packet),
    SendTo { peer_id: String, packet: Packet },
}
