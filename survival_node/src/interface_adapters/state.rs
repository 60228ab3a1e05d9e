use crate::interface_adapters::net::PeerMesh;
use crate::use_cases::{NodeCommand, PositionUpdate, SessionView};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

#[derive(Clone)]
pub struct AppState {
    // Player actions flowing into the node task.
    pub command_tx: mpsc::Sender<NodeCommand>,
    // Position provider output.
    pub position_tx: mpsc::Sender<PositionUpdate>,
    // Latest session view published by the node task.
    pub view_rx: watch::Receiver<SessionView>,
    pub mesh: Arc<PeerMesh>,
}
