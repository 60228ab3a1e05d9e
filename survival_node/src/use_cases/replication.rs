// Applying packets from peers to the local session.
//
// The host owns `GameState` and entities; clients only ever replace their copy with a
// snapshot of equal or newer revision. Every peer owns its own `Player` record.

use super::session::Session;
use crate::domain::systems::lifecycle;
use crate::domain::{Packet, PacketBody, WorldSnapshot};
use tracing::{debug, info, warn};

/// What happened to one inbound packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Applied,
    Ignored(&'static str),
}

impl Session {
    pub fn world_snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            revision: self.revision,
            game_state: self.game_state.clone(),
            entities: self.entities.clone(),
        }
    }

    pub fn handle_packet(&mut self, packet: Packet) -> Delivery {
        if packet.sender_id == self.player.id {
            return Delivery::Ignored("own packet");
        }
        let Packet { sender_id, body } = packet;

        let delivery = match body {
            PacketBody::Hello => self.on_hello(&sender_id),
            PacketBody::PlayerUpdate(player) => {
                let mut player = player;
                player.id = sender_id.clone();
                self.other_players.insert(sender_id.clone(), player);
                Delivery::Applied
            }
            PacketBody::WorldUpdate(snapshot) => self.on_world_update(&sender_id, snapshot),
            PacketBody::ReviveRequest { target_id } => self.on_revive_request(&sender_id, &target_id),
            PacketBody::Chat(message) => {
                self.chat.push(message);
                Delivery::Applied
            }
        };

        if let Delivery::Ignored(reason) = delivery {
            debug!(%sender_id, reason, "packet ignored");
        }
        delivery
    }

    /// A client just linked to us: answer with the current world straight away.
    fn on_hello(&mut self, sender_id: &str) -> Delivery {
        if !self.is_host {
            return Delivery::Ignored("hello sent to a client");
        }
        info!(peer_id = sender_id, revision = self.revision, "peer joined; sending world");
        let snapshot = self.world_snapshot();
        self.send_to(sender_id, PacketBody::WorldUpdate(snapshot));
        Delivery::Applied
    }

    fn on_world_update(&mut self, sender_id: &str, snapshot: WorldSnapshot) -> Delivery {
        if self.is_host {
            warn!(peer_id = sender_id, "world update received by host; dropping");
            return Delivery::Ignored("host is authoritative");
        }
        if snapshot.revision < self.revision {
            return Delivery::Ignored("stale revision");
        }

        self.revision = snapshot.revision;
        self.game_state = snapshot.game_state;
        self.entities = snapshot.entities;
        self.refresh_distances();
        Delivery::Applied
    }

    fn on_revive_request(&mut self, sender_id: &str, target_id: &str) -> Delivery {
        if target_id != self.player.id {
            return Delivery::Ignored("revive for another player");
        }
        if !lifecycle::revive(&mut self.player, &self.settings.revive) {
            return Delivery::Ignored("not dead");
        }
        info!(reviver_id = sender_id, hp = self.player.hp, "revived by ally");
        Delivery::Applied
    }

    /// A link this node dialed came up. The peer may be a host or another client.
    /// A client greets it and resets its revision; only a host answers a greeting.
    pub fn on_peer_linked(&mut self, peer_id: &str) {
        if self.is_host {
            return;
        }
        self.revision = 0;
        self.send_to(peer_id, PacketBody::Hello);
    }
}

#[cfg(test)]
mod tests {
    use super::Delivery;
    use crate::domain::{
        ChatMessage, ClassType, Coordinates, Entity, EntityKind, GameState, Outbound, Packet,
        PacketBody, Player, WorldSnapshot,
    };
    use crate::use_cases::test_support::{client_session, host_session, position_north};

    fn packet(sender: &str, body: PacketBody) -> Packet {
        Packet {
            sender_id: sender.to_string(),
            body,
        }
    }

    fn snapshot(revision: u64, day: u32) -> WorldSnapshot {
        WorldSnapshot {
            revision,
            game_state: GameState {
                day,
                ..GameState::default()
            },
            entities: vec![Entity::new(
                "w1",
                EntityKind::ResourceWood,
                position_north(30.0),
            )],
        }
    }

    #[test]
    fn when_host_receives_hello_then_it_replies_with_the_world_to_that_peer() {
        let mut host = host_session();
        host.revision = 4;
        assert_eq!(host.handle_packet(packet("joiner", PacketBody::Hello)), Delivery::Applied);

        let outbox = host.drain_outbox();
        let [Outbound::SendTo { peer_id, packet }] = outbox.as_slice() else {
            panic!("expected a single direct send, got {outbox:?}");
        };
        assert_eq!(peer_id, "joiner");
        assert!(matches!(&packet.body, PacketBody::WorldUpdate(s) if s.revision == 4));
    }

    #[test]
    fn when_client_receives_hello_then_it_is_ignored() {
        let mut client = client_session();
        assert!(matches!(
            client.handle_packet(packet("other", PacketBody::Hello)),
            Delivery::Ignored(_)
        ));
        assert!(client.drain_outbox().is_empty());
    }

    #[test]
    fn when_world_update_arrives_twice_then_state_is_the_same() {
        let mut client = client_session();
        client.set_position(Coordinates { lat: 0.0, lng: 0.0 });

        client.handle_packet(packet("host", PacketBody::WorldUpdate(snapshot(3, 2))));
        let once = serde_json::to_vec(&client.view()).expect("serialize view");
        client.handle_packet(packet("host", PacketBody::WorldUpdate(snapshot(3, 2))));
        let twice = serde_json::to_vec(&client.view()).expect("serialize view");

        assert_eq!(once, twice);
        assert_eq!(client.game_state().day, 2);
        let d = client.entities()[0].distance.expect("distance");
        assert!((d - 30.0).abs() < 0.01);
    }

    #[test]
    fn when_world_update_is_older_then_it_is_dropped() {
        let mut client = client_session();
        client.handle_packet(packet("host", PacketBody::WorldUpdate(snapshot(5, 3))));
        assert_eq!(
            client.handle_packet(packet("host", PacketBody::WorldUpdate(snapshot(4, 9)))),
            Delivery::Ignored("stale revision")
        );
        assert_eq!(client.game_state().day, 3);
        assert_eq!(client.revision(), 5);
    }

    #[test]
    fn when_host_receives_world_update_then_its_world_is_untouched() {
        let mut host = host_session();
        let before = host.world_snapshot();
        host.handle_packet(packet("rogue", PacketBody::WorldUpdate(snapshot(99, 9))));
        assert_eq!(host.world_snapshot(), before);
    }

    #[test]
    fn when_player_update_arrives_then_the_record_is_replaced_not_merged() {
        let mut host = host_session();
        let mut first = Player::new("peer", "Ana", ClassType::Scout);
        first.inventory.wood = 7;
        first.position = Some(Coordinates { lat: 1.0, lng: 1.0 });
        host.handle_packet(packet("peer", PacketBody::PlayerUpdate(first)));

        let second = Player::new("peer", "Ana", ClassType::Scout);
        host.handle_packet(packet("peer", PacketBody::PlayerUpdate(second.clone())));

        assert_eq!(host.other_player("peer"), Some(&second));
    }

    #[test]
    fn player_records_are_keyed_by_sender() {
        let mut host = host_session();
        let spoofed = Player::new("someone-else", "Ana", ClassType::Scout);
        host.handle_packet(packet("peer", PacketBody::PlayerUpdate(spoofed)));
        assert!(host.other_player("someone-else").is_none());
        assert_eq!(host.other_player("peer").map(|p| p.id.as_str()), Some("peer"));
    }

    #[test]
    fn when_revive_targets_the_dead_local_player_then_they_come_back() {
        let mut client = client_session();
        client.player.hp = 0.0;
        client.player.is_dead = true;

        let request = PacketBody::ReviveRequest {
            target_id: "client".to_string(),
        };
        assert_eq!(client.handle_packet(packet("host", request.clone())), Delivery::Applied);
        assert!(!client.player().is_dead);
        assert_eq!(client.player().hp, 50.0);

        assert_eq!(
            client.handle_packet(packet("host", request)),
            Delivery::Ignored("not dead")
        );
    }

    #[test]
    fn when_revive_targets_someone_else_then_it_is_ignored() {
        let mut client = client_session();
        client.player.hp = 0.0;
        client.player.is_dead = true;
        let request = PacketBody::ReviveRequest {
            target_id: "nobody".to_string(),
        };
        client.handle_packet(packet("host", request));
        assert!(client.player().is_dead);
    }

    #[test]
    fn chat_from_peers_is_appended_in_arrival_order() {
        let mut client = client_session();
        for (i, text) in ["first", "second"].into_iter().enumerate() {
            let message = ChatMessage {
                id: format!("m{i}"),
                sender_name: "Host".to_string(),
                text: text.to_string(),
                timestamp: i as u64,
            };
            client.handle_packet(packet("host", PacketBody::Chat(message)));
        }
        let texts: Vec<_> = client.chat().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
    }

    #[test]
    fn when_client_links_to_a_peer_then_it_says_hello_and_resets_revision() {
        let mut client = client_session();
        client.handle_packet(packet("host", PacketBody::WorldUpdate(snapshot(8, 1))));
        client.on_peer_linked("host");

        assert_eq!(client.revision(), 0);
        let outbox = client.drain_outbox();
        assert!(matches!(
            outbox.as_slice(),
            [Outbound::SendTo { peer_id, packet }] if peer_id == "host" && packet.body == PacketBody::Hello
        ));
    }

    #[test]
    fn when_host_dials_a_peer_then_it_sends_nothing() {
        let mut host = host_session();
        host.handle_packet(packet("client", PacketBody::Hello));
        let revision = host.revision();
        host.drain_outbox();

        host.on_peer_linked("client");
        assert_eq!(host.revision(), revision);
        assert!(host.drain_outbox().is_empty());
    }

    #[test]
    fn packets_echoed_from_self_are_ignored() {
        let mut host = host_session();
        assert_eq!(
            host.handle_packet(packet("host", PacketBody::Hello)),
            Delivery::Ignored("own packet")
        );
    }
}
