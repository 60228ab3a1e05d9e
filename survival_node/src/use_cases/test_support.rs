use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::domain::geo::METERS_PER_DEGREE;
use crate::domain::packet::Packet;
use crate::domain::ports::{
    Clock, Narrator, NarratorError, PeerTransport, Profile, SaveRecord, SaveStore, StoreError,
    TransportError,
};
use crate::domain::{ClassType, Coordinates, Player};
use crate::use_cases::session::{Session, SessionSettings};

// Shared fixed time source for deterministic use-case tests.
pub(crate) struct FixedClock(pub(crate) u64);

impl Clock for FixedClock {
    fn now_epoch_millis(&self) -> u64 {
        self.0
    }
}

pub(crate) fn host_session() -> Session {
    Session::new(
        Player::new("host", "Host", ClassType::Scout),
        true,
        SessionSettings::default(),
        StdRng::seed_from_u64(7),
        Arc::new(FixedClock(1_000)),
    )
}

pub(crate) fn client_session() -> Session {
    Session::new(
        Player::new("client", "Client", ClassType::Engineer),
        false,
        SessionSettings::default(),
        StdRng::seed_from_u64(11),
        Arc::new(FixedClock(1_000)),
    )
}

/// A point `meters` due north of (0, 0).
pub(crate) fn position_north(meters: f64) -> Coordinates {
    Coordinates {
        lat: meters / METERS_PER_DEGREE,
        lng: 0.0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Sent {
    Broadcast(Packet),
    To(String, Packet),
}

/// Transport that records every packet instead of sending it.
#[derive(Clone, Default)]
pub(crate) struct RecordingTransport {
    sent: Arc<Mutex<Vec<Sent>>>,
    linked: Arc<Mutex<Vec<String>>>,
    torn_down: Arc<Mutex<bool>>,
}

impl RecordingTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make `connect` succeed, reporting `peer_id` as the remote identity.
    pub(crate) fn with_peer(self, peer_id: impl Into<String>) -> Self {
        self.linked
            .lock()
            .expect("linked mutex poisoned")
            .push(peer_id.into());
        self
    }

    pub(crate) fn sent(&self) -> Vec<Sent> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }

    pub(crate) fn torn_down(&self) -> bool {
        *self.torn_down.lock().expect("teardown mutex poisoned")
    }
}

#[async_trait]
impl PeerTransport for RecordingTransport {
    async fn connect(&self, _address: &str) -> Result<String, TransportError> {
        self.linked
            .lock()
            .expect("linked mutex poisoned")
            .first()
            .cloned()
            .ok_or_else(|| TransportError::Connect("no peer configured".to_string()))
    }

    async fn broadcast(&self, packet: &Packet) {
        let mut guard = self.sent.lock().expect("sent mutex poisoned");
        guard.push(Sent::Broadcast(packet.clone()));
    }

    async fn send_to(&self, peer_id: &str, packet: &Packet) -> Result<(), TransportError> {
        let mut guard = self.sent.lock().expect("sent mutex poisoned");
        guard.push(Sent::To(peer_id.to_string(), packet.clone()));
        Ok(())
    }

    async fn teardown(&self) {
        *self.torn_down.lock().expect("teardown mutex poisoned") = true;
    }
}

pub(crate) struct FailingNarrator;

#[async_trait]
impl Narrator for FailingNarrator {
    async fn narrate(&self, _: u32, _: u32, _: &str) -> Result<String, NarratorError> {
        Err(NarratorError::Unavailable)
    }
}

/// Narrator that always answers with the same text and records its inputs.
pub(crate) struct CannedNarrator {
    text: String,
    calls: Mutex<Vec<(u32, u32, String)>>,
}

impl CannedNarrator {
    pub(crate) fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(u32, u32, String)> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

#[async_trait]
impl Narrator for CannedNarrator {
    async fn narrate(
        &self,
        day: u32,
        base_health: u32,
        player_status: &str,
    ) -> Result<String, NarratorError> {
        let mut guard = self.calls.lock().expect("calls mutex poisoned");
        guard.push((day, base_health, player_status.to_string()));
        Ok(self.text.clone())
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    save: Mutex<Option<SaveRecord>>,
    profile: Mutex<Option<Profile>>,
}

impl MemoryStore {
    pub(crate) fn saved(&self) -> Option<SaveRecord> {
        self.save.lock().expect("save mutex poisoned").clone()
    }
}

#[async_trait]
impl SaveStore for MemoryStore {
    async fn write_save(&self, record: &SaveRecord) -> Result<(), StoreError> {
        *self.save.lock().expect("save mutex poisoned") = Some(record.clone());
        Ok(())
    }

    async fn read_save(&self) -> Result<Option<SaveRecord>, StoreError> {
        Ok(self.saved())
    }

    async fn write_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        *self.profile.lock().expect("profile mutex poisoned") = Some(profile.clone());
        Ok(())
    }

    async fn read_profile(&self) -> Result<Option<Profile>, StoreError> {
        Ok(self.profile.lock().expect("profile mutex poisoned").clone())
    }
}
