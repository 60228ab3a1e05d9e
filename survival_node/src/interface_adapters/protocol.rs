// Wire protocol for peer links: link frames, the versioned packet envelope, and the
// payload DTOs that map onto domain packets.

use crate::domain::{ChatMessage, Entity, GameState, Packet, PacketBody, Player, WorldSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PROTOCOL_VERSION: u32 = 1;

/// Everything sent over a peer WebSocket. `Identity` is always the first frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LinkFrame {
    Identity { peer_id: String },
    Packet(WirePacket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PacketType {
    Hello,
    PlayerUpdate,
    WorldUpdate,
    ReviveRequest,
    Chat,
}

/// Packet envelope: `{version, type, senderId, payload}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePacket {
    #[serde(default)]
    pub version: u32,
    #[serde(rename = "type")]
    pub kind: PacketType,
    pub sender_id: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldUpdatePayload {
    #[serde(default)]
    pub revision: u64,
    pub game_state: GameState,
    pub entities: Vec<Entity>,
}

impl From<WorldSnapshot> for WorldUpdatePayload {
    fn from(snapshot: WorldSnapshot) -> Self {
        Self {
            revision: snapshot.revision,
            game_state: snapshot.game_state,
            entities: snapshot.entities,
        }
    }
}

impl From<WorldUpdatePayload> for WorldSnapshot {
    fn from(payload: WorldUpdatePayload) -> Self {
        Self {
            revision: payload.revision,
            game_state: payload.game_state,
            entities: payload.entities,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviveRequestPayload {
    pub target_id: String,
}

#[derive(Debug)]
pub enum ProtocolError {
    UnsupportedVersion(u32),
    Payload {
        kind: PacketType,
        source: serde_json::Error,
    },
    Malformed(serde_json::Error),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported protocol version {version}")
            }
            Self::Payload { kind, source } => write!(f, "bad {kind:?} payload: {source}"),
            Self::Malformed(err) => write!(f, "malformed frame: {err}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl TryFrom<&Packet> for WirePacket {
    type Error = ProtocolError;

    fn try_from(packet: &Packet) -> Result<Self, Self::Error> {
        let (kind, payload) = match &packet.body {
            PacketBody::Hello => (
                PacketType::Hello,
                Ok(serde_json::Value::Object(serde_json::Map::new())),
            ),
            PacketBody::PlayerUpdate(player) => {
                (PacketType::PlayerUpdate, serde_json::to_value(player))
            }
            PacketBody::WorldUpdate(snapshot) => (
                PacketType::WorldUpdate,
                serde_json::to_value(WorldUpdatePayload::from(snapshot.clone())),
            ),
            PacketBody::ReviveRequest { target_id } => (
                PacketType::ReviveRequest,
                serde_json::to_value(ReviveRequestPayload {
                    target_id: target_id.clone(),
                }),
            ),
            PacketBody::Chat(message) => (PacketType::Chat, serde_json::to_value(message)),
        };

        Ok(Self {
            version: PROTOCOL_VERSION,
            kind,
            sender_id: packet.sender_id.clone(),
            payload: payload.map_err(|source| ProtocolError::Payload { kind, source })?,
        })
    }
}

impl TryFrom<WirePacket> for Packet {
    type Error = ProtocolError;

    fn try_from(wire: WirePacket) -> Result<Self, Self::Error> {
        if wire.version != PROTOCOL_VERSION {
            return Err(ProtocolError::UnsupportedVersion(wire.version));
        }
        let kind = wire.kind;
        let payload_err = |source| ProtocolError::Payload { kind, source };

        let body = match kind {
            PacketType::Hello => PacketBody::Hello,
            PacketType::PlayerUpdate => PacketBody::PlayerUpdate(
                serde_json::from_value::<Player>(wire.payload).map_err(payload_err)?,
            ),
            PacketType::WorldUpdate => PacketBody::WorldUpdate(
                serde_json::from_value::<WorldUpdatePayload>(wire.payload)
                    .map_err(payload_err)?
                    .into(),
            ),
            PacketType::ReviveRequest => {
                let payload = serde_json::from_value::<ReviveRequestPayload>(wire.payload)
                    .map_err(payload_err)?;
                PacketBody::ReviveRequest {
                    target_id: payload.target_id,
                }
            }
            PacketType::Chat => PacketBody::Chat(
                serde_json::from_value::<ChatMessage>(wire.payload).map_err(payload_err)?,
            ),
        };

        Ok(Packet {
            sender_id: wire.sender_id,
            body,
        })
    }
}

pub fn encode_identity(peer_id: &str) -> Result<String, ProtocolError> {
    serde_json::to_string(&LinkFrame::Identity {
        peer_id: peer_id.to_string(),
    })
    .map_err(ProtocolError::Malformed)
}

/// Serialize a packet once so the same text can go to every link.
pub fn encode_packet(packet: &Packet) -> Result<String, ProtocolError> {
    let wire = WirePacket::try_from(packet)?;
    serde_json::to_string(&LinkFrame::Packet(wire)).map_err(ProtocolError::Malformed)
}

pub fn decode_frame(text: &str) -> Result<LinkFrame, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::Malformed)
}
