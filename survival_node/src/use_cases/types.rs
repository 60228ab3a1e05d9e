// Use-case level inputs/outputs for the node loop.

use crate::domain::ports::TransportError;
use crate::domain::state::{ChatMessage, Coordinates, Entity, GameState, Player};
use crate::domain::systems::encounter::{Encounter, EncounterAction, Loot};
use crate::domain::ActionError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::oneshot;

/// Human-readable result of a player action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionReport {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loot: Option<Loot>,
}

impl ActionReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            loot: None,
        }
    }

    pub fn with_loot(message: impl Into<String>, loot: Loot) -> Self {
        Self {
            message: message.into(),
            loot: Some(loot),
        }
    }
}

pub type ActionResult = Result<ActionReport, ActionError>;
pub type Reply = oneshot::Sender<ActionResult>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Item {
    Food,
    Water,
    Medkit,
}

/// Output of the position provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionUpdate {
    Fix(Coordinates),
    Unavailable,
}

/// Everything the narrator needs, captured when night was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct NightRequest {
    pub day: u32,
    pub base_health: u32,
    pub player_status: &'static str,
    /// Pre-drawn index into the fallback lines.
    pub fallback_pick: usize,
}

#[derive(Debug)]
pub enum PhaseToggle {
    Day(ActionReport),
    NightPending(NightRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredEvent {
    EnemyTurn { encounter_id: u64 },
    Victory { encounter_id: u64 },
}

/// Event the node should feed back into the session after `delay`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deferred {
    pub delay: Duration,
    pub event: DeferredEvent,
}

/// Player actions arriving from the control edge.
#[derive(Debug)]
pub enum NodeCommand {
    Connect {
        address: String,
        reply: oneshot::Sender<Result<String, TransportError>>,
    },
    EstablishBase {
        at: Option<Coordinates>,
        reply: Reply,
    },
    UpgradeBase {
        reply: Reply,
    },
    TogglePhase {
        reply: Reply,
    },
    Engage {
        entity_id: String,
        reply: Reply,
    },
    Hack {
        reply: Reply,
    },
    Act {
        action: EncounterAction,
        reply: Reply,
    },
    Revive {
        target_id: String,
        reply: Reply,
    },
    UseItem {
        item: Item,
        reply: Reply,
    },
    Chat {
        text: String,
        reply: Reply,
    },
}

/// Results of work the node spawned off its own loop.
#[derive(Debug)]
pub enum NodeEvent {
    Deferred(DeferredEvent),
    NightNarrated {
        narrative: String,
        reply: Reply,
    },
    PeerLinked {
        result: Result<String, TransportError>,
        reply: oneshot::Sender<Result<String, TransportError>>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityView {
    #[serde(flatten)]
    pub entity: Entity,
    pub distance: Option<f64>,
}

/// Read-only copy of the session published after every event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub peer_id: String,
    pub is_host: bool,
    pub revision: u64,
    pub position: Option<Coordinates>,
    pub awaiting_manual_position: bool,
    pub night_pending: bool,
    pub player: Player,
    pub game_state: GameState,
    pub entities: Vec<EntityView>,
    pub other_players: Vec<Player>,
    pub chat: Vec<ChatMessage>,
    pub encounter: Option<Encounter>,
}
