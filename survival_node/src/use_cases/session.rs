// Per-node session state: the local player, this node's copy of the world and the
// effects (outgoing packets, delayed events) produced while mutating it.

use super::types::{ActionReport, ActionResult, Deferred, EntityView, Item, SessionView};
use crate::domain::geo::distance_m;
use crate::domain::ports::{Clock, SaveRecord};
use crate::domain::systems::encounter::Encounter;
use crate::domain::systems::survival::{self, TickOutcome};
use crate::domain::tuning::combat::{EncounterTuning, ReviveTuning};
use crate::domain::tuning::survival::{ItemTuning, SurvivalTuning};
use crate::domain::tuning::world::{BaseTuning, SpawnTuning};
use crate::domain::{
    ActionError, ChatMessage, ClassType, Coordinates, Entity, GameState, Outbound, Packet,
    PacketBody, Player,
};
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Longest chat line accepted, in characters.
pub const MAX_CHAT_CHARS: usize = 280;

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// Outer spawn distance added past the minimum ring.
    pub spawn_radius_m: f64,
    pub survival: SurvivalTuning,
    pub items: ItemTuning,
    pub encounter: EncounterTuning,
    pub revive: ReviveTuning,
    pub spawn: SpawnTuning,
    pub base: BaseTuning,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            spawn_radius_m: 300.0,
            survival: SurvivalTuning::default(),
            items: ItemTuning::default(),
            encounter: EncounterTuning::default(),
            revive: ReviveTuning::default(),
            spawn: SpawnTuning::default(),
            base: BaseTuning::default(),
        }
    }
}

pub struct Session {
    pub(super) player: Player,
    pub(super) is_host: bool,
    pub(super) game_state: GameState,
    pub(super) entities: Vec<Entity>,
    pub(super) other_players: HashMap<String, Player>,
    pub(super) chat: Vec<ChatMessage>,
    pub(super) encounter: Option<Encounter>,
    pub(super) next_encounter_id: u64,
    /// Host: bumped per authoritative mutation. Client: last applied host revision.
    pub(super) revision: u64,
    pub(super) awaiting_manual_position: bool,
    pub(super) night_pending: bool,
    pub(super) settings: SessionSettings,
    pub(super) rng: StdRng,
    pub(super) clock: Arc<dyn Clock>,
    outbox: Vec<Outbound>,
    deferred: Vec<Deferred>,
}

impl Session {
    pub fn new(
        player: Player,
        is_host: bool,
        settings: SessionSettings,
        rng: StdRng,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            player,
            is_host,
            game_state: GameState::default(),
            entities: Vec::new(),
            other_players: HashMap::new(),
            chat: Vec::new(),
            encounter: None,
            next_encounter_id: 1,
            revision: 0,
            awaiting_manual_position: false,
            night_pending: false,
            settings,
            rng,
            clock,
            outbox: Vec::new(),
            deferred: Vec::new(),
        }
    }

    pub fn local_id(&self) -> &str {
        &self.player.id
    }

    pub fn is_host(&self) -> bool {
        self.is_host
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn position(&self) -> Option<Coordinates> {
        self.player.position
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn other_player(&self, id: &str) -> Option<&Player> {
        self.other_players.get(id)
    }

    pub fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    pub fn encounter(&self) -> Option<&Encounter> {
        self.encounter.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn awaiting_manual_position(&self) -> bool {
        self.awaiting_manual_position
    }

    /// Continue a saved run: vitals and inventory come back, identity stays local.
    pub fn restore(&mut self, record: SaveRecord) {
        let local_id = std::mem::take(&mut self.player.id);
        self.player = record.player;
        self.player.id = local_id;
        self.player.position = None;
        self.player.clamp_vitals();
        if let Some(position) = record.last_position {
            self.set_position(position);
        }
        info!(
            hp = self.player.hp,
            saved_at = record.timestamp,
            "save restored"
        );
    }

    pub fn set_position(&mut self, position: Coordinates) {
        self.player.position = Some(position);
        self.awaiting_manual_position = false;
        self.refresh_distances();
    }

    /// The position provider lost the fix. Until a new one arrives nothing ticks and
    /// the player is asked to enter coordinates by hand.
    pub fn position_unavailable(&mut self) {
        self.player.position = None;
        self.awaiting_manual_position = true;
        self.refresh_distances();
    }

    /// No fix showed up in time after startup.
    pub fn position_wait_expired(&mut self) {
        if self.player.position.is_none() {
            self.awaiting_manual_position = true;
        }
    }

    pub(super) fn refresh_distances(&mut self) {
        let origin = self.player.position;
        for entity in &mut self.entities {
            entity.distance = origin.map(|origin| distance_m(origin, entity.position));
        }
    }

    /// One survival tick for the local player.
    pub fn tick(&mut self) -> TickOutcome {
        let position = self.player.position;
        let outcome = survival::tick_player(
            &mut self.player,
            position,
            self.game_state.base_location,
            &self.settings.survival,
        );
        if outcome == TickOutcome::Died {
            warn!(player_id = %self.player.id, "vital signs terminated");
            self.encounter = None;
        }
        outcome
    }

    pub fn use_item(&mut self, item: Item) -> ActionResult {
        if self.player.is_dead {
            return Err(ActionError::PlayerDead);
        }
        let cfg = self.settings.items;
        let message = match item {
            Item::Food => {
                if self.player.inventory.food < 1.0 {
                    return Err(ActionError::NothingToUse);
                }
                self.player.inventory.food -= 1.0;
                self.player.hp += cfg.food_heal;
                format!("Ate a ration. +{} HP.", cfg.food_heal)
            }
            Item::Water => {
                if self.player.inventory.water == 0 {
                    return Err(ActionError::NothingToUse);
                }
                self.player.inventory.water -= 1;
                self.player.energy += cfg.water_energy;
                format!("Drank water. +{} energy.", cfg.water_energy)
            }
            Item::Medkit => {
                if self.player.inventory.medkit == 0 {
                    return Err(ActionError::NothingToUse);
                }
                self.player.inventory.medkit -= 1;
                let heal = if self.player.class_type == ClassType::Medic {
                    cfg.medic_medkit_heal
                } else {
                    cfg.medkit_heal
                };
                self.player.hp += heal;
                format!("Applied medkit. +{heal} HP.")
            }
        };
        self.player.clamp_vitals();
        Ok(ActionReport::new(message))
    }

    pub fn send_chat(&mut self, text: &str) -> ActionResult {
        let text = text.trim();
        if text.is_empty() {
            return Err(ActionError::EmptyMessage);
        }
        if text.chars().count() > MAX_CHAT_CHARS {
            return Err(ActionError::MessageTooLong);
        }

        let message = ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            sender_name: self.player.name.clone(),
            text: text.to_string(),
            timestamp: self.clock.now_epoch_millis(),
        };
        self.chat.push(message.clone());
        self.broadcast(PacketBody::Chat(message));
        Ok(ActionReport::new("Message sent."))
    }

    /// Queue the periodic self-report other peers render us from.
    pub fn queue_player_update(&mut self) {
        self.broadcast(PacketBody::PlayerUpdate(self.player.clone()));
    }

    pub fn save_record(&self) -> SaveRecord {
        SaveRecord {
            player: self.player.clone(),
            last_position: self.player.position,
            timestamp: self.clock.now_epoch_millis(),
        }
    }

    pub fn view(&self) -> SessionView {
        let mut other_players: Vec<Player> = self.other_players.values().cloned().collect();
        other_players.sort_by(|a, b| a.id.cmp(&b.id));

        SessionView {
            peer_id: self.player.id.clone(),
            is_host: self.is_host,
            revision: self.revision,
            position: self.player.position,
            awaiting_manual_position: self.awaiting_manual_position,
            night_pending: self.night_pending,
            player: self.player.clone(),
            game_state: self.game_state.clone(),
            entities: self
                .entities
                .iter()
                .map(|entity| EntityView {
                    distance: entity.distance,
                    entity: entity.clone(),
                })
                .collect(),
            other_players,
            chat: self.chat.clone(),
            encounter: self.encounter.clone(),
        }
    }

    pub fn drain_outbox(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    pub fn drain_deferred(&mut self) -> Vec<Deferred> {
        std::mem::take(&mut self.deferred)
    }

    pub(super) fn packet(&self, body: PacketBody) -> Packet {
        Packet {
            sender_id: self.player.id.clone(),
            body,
        }
    }

    pub(super) fn broadcast(&mut self, body: PacketBody) {
        let packet = self.packet(body);
        self.outbox.push(Outbound::Broadcast(packet));
    }

    pub(super) fn send_to(&mut self, peer_id: impl Into<String>, body: PacketBody) {
        let packet = self.packet(body);
        self.outbox.push(Outbound::SendTo {
            peer_id: peer_id.into(),
            packet,
        });
    }

    pub(super) fn defer(&mut self, deferred: Deferred) {
        self.deferred.push(deferred);
    }

    pub(super) fn require_host(&self) -> Result<(), ActionError> {
        if self.is_host {
            Ok(())
        } else {
            Err(ActionError::HostOnly)
        }
    }

    /// Host only: stamp a new revision and push the full world to every peer.
    pub(super) fn commit_world(&mut self) {
        self.revision += 1;
        let snapshot = self.world_snapshot();
        debug!(
            revision = self.revision,
            entities = self.entities.len(),
            "world committed"
        );
        self.broadcast(PacketBody::WorldUpdate(snapshot));
    }
}
