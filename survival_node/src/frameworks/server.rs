// Framework bootstrap for a survival node: wires adapters to the node task and serves
// the peer and control routes on one listener.

use crate::domain::{ClassType, Player};
use crate::domain::ports::{Narrator, Profile, SaveStore, SystemClock};
use crate::frameworks::config::{self, NodeConfig, NodeMode};
use crate::interface_adapters::clients::narrator::{HttpNarrator, StaticNarrator};
use crate::interface_adapters::net::control::{
    chat_handler, connect_peer_handler, encounter_action_handler, engage_handler,
    establish_base_handler, hack_handler, position_handler, position_unavailable_handler,
    revive_handler, state_handler, toggle_phase_handler, upgrade_base_handler, use_item_handler,
};
use crate::interface_adapters::net::{PeerMesh, peer_ws_handler};
use crate::interface_adapters::persistence::JsonFileStore;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{
    NodeCommand, NodeDeps, NodeInputs, PositionUpdate, Session, SessionSettings, node_task,
};

use axum::{
    Router,
    routing::{get, post},
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};
use tokio::sync::{Notify, mpsc, oneshot, watch};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/peer", get(peer_ws_handler))
        .route("/state", get(state_handler))
        .route("/position", post(position_handler))
        .route("/position/unavailable", post(position_unavailable_handler))
        .route("/peers", post(connect_peer_handler))
        .route("/base", post(establish_base_handler))
        .route("/base/upgrade", post(upgrade_base_handler))
        .route("/phase/toggle", post(toggle_phase_handler))
        .route("/encounter", post(engage_handler))
        .route("/encounter/hack", post(hack_handler))
        .route("/encounter/action", post(encounter_action_handler))
        .route("/revive", post(revive_handler))
        .route("/items/use", post(use_item_handler))
        .route("/chat", post(chat_handler))
        .with_state(state)
}

pub async fn run(listener: tokio::net::TcpListener, node: NodeConfig) -> Result<()> {
    let address = listener.local_addr()?;
    let (state, shutdown) = start_node(node).await?;
    let app = router(state);

    tracing::info!(%address, "listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "server error");
        });
    shutdown.notify_one();
    served
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::new(config::bind_address(), config::http_port());

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener, NodeConfig::from_env()).await
}

/// Build the adapters, restore any save and spawn the node task.
async fn start_node(node: NodeConfig) -> Result<(Arc<AppState>, Arc<Notify>)> {
    let (packet_tx, packet_rx) = mpsc::channel(config::PACKET_CHANNEL_CAPACITY);
    let (command_tx, command_rx) = mpsc::channel(config::COMMAND_CHANNEL_CAPACITY);
    let (position_tx, position_rx) = mpsc::channel(config::POSITION_CHANNEL_CAPACITY);

    let mesh = PeerMesh::initialize(node.peer_id.clone(), packet_tx);
    let store = Arc::new(JsonFileStore::new(node.save_dir.clone()));
    let narrator: Arc<dyn Narrator> = match &node.narrator_url {
        Some(url) => {
            let client = HttpNarrator::new(url.clone(), node.narrator_timeout).map_err(|e| {
                std::io::Error::other(format!("failed to initialize narrator client: {e}"))
            })?;
            tracing::debug!(
                narrator_url = %url,
                narrator_timeout_ms = node.narrator_timeout.as_millis(),
                "narrator configured"
            );
            Arc::new(client)
        }
        None => {
            tracing::info!("no narrator configured; nights use fallback lines");
            Arc::new(StaticNarrator)
        }
    };

    let rng = match node.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let settings = SessionSettings {
        spawn_radius_m: node.spawn_radius_m,
        ..SessionSettings::default()
    };
    let saved = if node.player_name.is_none() || node.class_type.is_none() {
        store.read_profile().await.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to read profile");
            None
        })
    } else {
        None
    };
    let profile = resolve_profile(node.player_name.clone(), node.class_type, saved);
    tracing::info!(name = %profile.name, class = ?profile.class_type, "player identity");
    let player = Player::new(node.peer_id.clone(), profile.name.clone(), profile.class_type);
    let mut session = Session::new(
        player,
        node.mode.is_host(),
        settings,
        rng,
        Arc::new(SystemClock),
    );

    if node.continue_save {
        match store.read_save().await {
            Ok(Some(record)) => session.restore(record),
            Ok(None) => tracing::info!("no save to continue; starting fresh"),
            Err(err) => tracing::warn!(error = %err, "failed to read save; starting fresh"),
        }
    }
    if let Err(err) = store.write_profile(&profile).await {
        tracing::warn!(error = %err, "failed to write profile");
    }

    let (view_tx, view_rx) = watch::channel(session.view());
    let shutdown = Arc::new(Notify::new());
    let deps = NodeDeps {
        transport: mesh.clone(),
        narrator,
        store,
    };
    let inputs = NodeInputs {
        command_rx,
        packet_rx,
        position_rx,
    };
    tokio::spawn(node_task(
        session,
        deps,
        inputs,
        view_tx,
        node.timings,
        shutdown.clone(),
    ));

    if let Some(position) = node.start_position {
        let _ = position_tx.send(PositionUpdate::Fix(position)).await;
    }
    if node.mode != NodeMode::Single {
        for address in node.join_peers {
            spawn_join(command_tx.clone(), address);
        }
    }

    let state = Arc::new(AppState {
        command_tx,
        position_tx,
        view_rx,
        mesh,
    });
    Ok((state, shutdown))
}

/// Configured identity wins field by field; the saved profile fills the gaps.
fn resolve_profile(
    name: Option<String>,
    class_type: Option<ClassType>,
    saved: Option<Profile>,
) -> Profile {
    let (saved_name, saved_class) = match saved {
        Some(profile) => (Some(profile.name), Some(profile.class_type)),
        None => (None, None),
    };
    Profile {
        name: name
            .or(saved_name.filter(|n| !n.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_PLAYER_NAME.to_string()),
        class_type: class_type.or(saved_class).unwrap_or(ClassType::Scout),
    }
}

const DEFAULT_PLAYER_NAME: &str = "Survivor";

fn spawn_join(command_tx: mpsc::Sender<NodeCommand>, address: String) {
    tokio::spawn(async move {
        let (reply, reply_rx) = oneshot::channel();
        let command = NodeCommand::Connect {
            address: address.clone(),
            reply,
        };
        if command_tx.send(command).await.is_err() {
            return;
        }
        match reply_rx.await {
            Ok(Ok(peer_id)) => tracing::info!(%address, %peer_id, "joined peer"),
            Ok(Err(err)) => tracing::warn!(%address, error = %err, "failed to join peer"),
            Err(_) => {}
        }
    });
}
