// Ports for the collaborators the node consumes but does not implement itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::packet::Packet;
use crate::domain::state::{ClassType, Coordinates, Player};

#[derive(Debug)]
pub enum TransportError {
    UnknownPeer,
    LinkClosed,
    LinkFull,
    Connect(String),
    Handshake(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPeer => write!(f, "peer not connected"),
            Self::LinkClosed => write!(f, "peer link closed"),
            Self::LinkFull => write!(f, "peer link backlog full"),
            Self::Connect(reason) => write!(f, "connect failed: {reason}"),
            Self::Handshake(reason) => write!(f, "handshake failed: {reason}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Best-effort message channel between peers. Received packets are delivered on the
/// channel handed to the transport when it was initialized.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Dial a peer address and return its identity once the link is up.
    async fn connect(&self, address: &str) -> Result<String, TransportError>;
    /// Fire-and-forget delivery to every open link.
    async fn broadcast(&self, packet: &Packet);
    async fn send_to(&self, peer_id: &str, packet: &Packet) -> Result<(), TransportError>;
    async fn teardown(&self);
}

#[derive(Debug)]
pub enum NarratorError {
    Unavailable,
    BadResponse,
}

/// External text generator for the nightly report.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(
        &self,
        day: u32,
        base_health: u32,
        player_status: &str,
    ) -> Result<String, NarratorError>;
}

/// Single-player save written while playing as a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecord {
    pub player: Player,
    pub last_position: Option<Coordinates>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub class_type: ClassType,
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Serde(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Serde(err) => write!(f, "serde error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// Local persistence for one profile.
#[async_trait]
pub trait SaveStore: Send + Sync {
    async fn write_save(&self, record: &SaveRecord) -> Result<(), StoreError>;
    async fn read_save(&self) -> Result<Option<SaveRecord>, StoreError>;
    async fn write_profile(&self, profile: &Profile) -> Result<(), StoreError>;
    async fn read_profile(&self) -> Result<Option<Profile>, StoreError>;
}

// Port for retrieving the current time.
pub trait Clock: Send + Sync {
    fn now_epoch_millis(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}
