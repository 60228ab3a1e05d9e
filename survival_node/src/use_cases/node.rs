use super::narration::narrate_or_fallback;
use super::session::Session;
use super::types::{
    ActionResult, NodeCommand, NodeEvent, PhaseToggle, PositionUpdate, Reply, SessionView,
};
use crate::domain::packet::{Outbound, Packet};
use crate::domain::ports::{Narrator, PeerTransport, SaveStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy)]
pub struct NodeTimings {
    pub tick_interval: Duration,
    pub sync_interval: Duration,
    pub autosave_interval: Duration,
    /// How long to wait for the first fix before asking for manual entry.
    pub position_wait: Duration,
}

impl Default for NodeTimings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            sync_interval: Duration::from_secs(1),
            autosave_interval: Duration::from_secs(30),
            position_wait: Duration::from_secs(10),
        }
    }
}

/// Collaborators the node talks to.
#[derive(Clone)]
pub struct NodeDeps {
    pub transport: Arc<dyn PeerTransport>,
    pub narrator: Arc<dyn Narrator>,
    pub store: Arc<dyn SaveStore>,
}

pub struct NodeInputs {
    pub command_rx: mpsc::Receiver<NodeCommand>,
    pub packet_rx: mpsc::Receiver<Packet>,
    pub position_rx: mpsc::Receiver<PositionUpdate>,
}

/// Single owner of the session. Every event source is multiplexed here so session
/// mutations never run concurrently; slow I/O is spawned and re-enters as a `NodeEvent`.
pub async fn node_task(
    mut session: Session,
    deps: NodeDeps,
    mut inputs: NodeInputs,
    view_tx: watch::Sender<SessionView>,
    timings: NodeTimings,
    shutdown: Arc<Notify>,
) {
    let (event_tx, mut event_rx) = mpsc::channel::<NodeEvent>(EVENT_CHANNEL_CAPACITY);

    let mut tick = tokio::time::interval(timings.tick_interval);
    let mut sync = tokio::time::interval(timings.sync_interval);
    let mut autosave = tokio::time::interval(timings.autosave_interval);
    for interval in [&mut tick, &mut sync, &mut autosave] {
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    }
    // The first tick of an interval fires immediately; autosave should not.
    autosave.reset();

    let position_wait = tokio::time::sleep(timings.position_wait);
    tokio::pin!(position_wait);
    let mut waiting_for_fix = session.position().is_none();

    info!(
        peer_id = %session.local_id(),
        is_host = session.is_host(),
        "node started"
    );
    view_tx.send_replace(session.view());

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                break;
            }
            _ = tick.tick() => {
                session.tick();
            }
            _ = sync.tick() => {
                session.queue_player_update();
            }
            _ = autosave.tick() => {
                autosave_session(&session, &deps);
            }
            Some(packet) = inputs.packet_rx.recv() => {
                session.handle_packet(packet);
            }
            Some(command) = inputs.command_rx.recv() => {
                handle_command(&mut session, command, &deps, &event_tx);
            }
            Some(update) = inputs.position_rx.recv() => {
                match update {
                    PositionUpdate::Fix(position) => {
                        waiting_for_fix = false;
                        session.set_position(position);
                    }
                    PositionUpdate::Unavailable => {
                        warn!("position provider unavailable; waiting for manual entry");
                        session.position_unavailable();
                    }
                }
            }
            Some(event) = event_rx.recv() => {
                handle_event(&mut session, event);
            }
            _ = &mut position_wait, if waiting_for_fix => {
                waiting_for_fix = false;
                if session.position().is_none() {
                    warn!(
                        waited_ms = timings.position_wait.as_millis(),
                        "no position fix yet; manual entry required"
                    );
                }
                session.position_wait_expired();
            }
        }

        flush(&mut session, &deps, &event_tx).await;
        view_tx.send_replace(session.view());
    }

    info!("node stopping");
    deps.transport.teardown().await;
}

fn handle_command(
    session: &mut Session,
    command: NodeCommand,
    deps: &NodeDeps,
    event_tx: &mpsc::Sender<NodeEvent>,
) {
    match command {
        NodeCommand::Connect { address, reply } => {
            let transport = deps.transport.clone();
            let event_tx = event_tx.clone();
            tokio::spawn(async move {
                let result = transport.connect(&address).await;
                if let Err(err) = &result {
                    warn!(%address, error = %err, "peer connection failed");
                }
                let _ = event_tx.send(NodeEvent::PeerLinked { result, reply }).await;
            });
        }
        NodeCommand::TogglePhase { reply } => match session.toggle_phase() {
            Ok(PhaseToggle::Day(report)) => respond(reply, Ok(report)),
            Ok(PhaseToggle::NightPending(request)) => {
                let narrator = deps.narrator.clone();
                let event_tx = event_tx.clone();
                tokio::spawn(async move {
                    let narrative = narrate_or_fallback(narrator.as_ref(), &request).await;
                    let _ = event_tx
                        .send(NodeEvent::NightNarrated { narrative, reply })
                        .await;
                });
            }
            Err(err) => respond(reply, Err(err)),
        },
        NodeCommand::EstablishBase { at, reply } => respond(reply, session.establish_base(at)),
        NodeCommand::UpgradeBase { reply } => respond(reply, session.upgrade_base()),
        NodeCommand::Engage { entity_id, reply } => respond(reply, session.engage(&entity_id)),
        NodeCommand::Hack { reply } => respond(reply, session.hack()),
        NodeCommand::Act { action, reply } => respond(reply, session.act(action)),
        NodeCommand::Revive { target_id, reply } => respond(reply, session.revive(&target_id)),
        NodeCommand::UseItem { item, reply } => respond(reply, session.use_item(item)),
        NodeCommand::Chat { text, reply } => respond(reply, session.send_chat(&text)),
    }
}

fn handle_event(session: &mut Session, event: NodeEvent) {
    match event {
        NodeEvent::Deferred(deferred) => {
            if let Some(report) = session.resolve_deferred(deferred) {
                debug!(message = %report.message, "deferred encounter step");
            }
        }
        NodeEvent::NightNarrated { narrative, reply } => {
            respond(reply, session.complete_night(narrative));
        }
        NodeEvent::PeerLinked { result, reply } => {
            if let Ok(peer_id) = &result {
                info!(%peer_id, "peer linked");
                session.on_peer_linked(peer_id);
            }
            let _ = reply.send(result);
        }
    }
}

fn respond(reply: Reply, result: ActionResult) {
    if let Err(err) = &result {
        debug!(error = %err, "action refused");
    }
    // The caller may have given up waiting.
    let _ = reply.send(result);
}

/// Push queued packets out and schedule delayed events.
async fn flush(session: &mut Session, deps: &NodeDeps, event_tx: &mpsc::Sender<NodeEvent>) {
    for outbound in session.drain_outbox() {
        match outbound {
            Outbound::Broadcast(packet) => deps.transport.broadcast(&packet).await,
            Outbound::SendTo { peer_id, packet } => {
                if let Err(err) = deps.transport.send_to(&peer_id, &packet).await {
                    warn!(
                        %peer_id,
                        kind = packet.body.kind(),
                        error = %err,
                        "direct send failed; packet dropped"
                    );
                }
            }
        }
    }

    for deferred in session.drain_deferred() {
        let event_tx = event_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deferred.delay).await;
            let _ = event_tx.send(NodeEvent::Deferred(deferred.event)).await;
        });
    }
}

fn autosave_session(session: &Session, deps: &NodeDeps) {
    if session.is_host() || session.game_state().base_location.is_none() {
        return;
    }
    let record = session.save_record();
    let store = deps.store.clone();
    tokio::spawn(async move {
        match store.write_save(&record).await {
            Ok(()) => debug!(timestamp = record.timestamp, "autosaved"),
            Err(err) => warn!(error = %err, "autosave failed"),
        }
    });
}
