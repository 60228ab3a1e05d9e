// Peer transport over WebSockets. Inbound links arrive on the `/peer` route, outbound
// links are dialed with tokio-tungstenite; both sides run the same identity handshake
// and the same frame pump.

use crate::domain::packet::Packet;
use crate::domain::ports::{PeerTransport, TransportError};
use crate::interface_adapters::protocol::{
    LinkFrame, decode_frame, encode_identity, encode_packet,
};
use crate::interface_adapters::state::AppState;

use async_trait::async_trait;
use axum::{
    extract::{
        State,
        ws::{self, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};
use tokio::sync::{Notify, RwLock, mpsc};
use tokio_tungstenite::tungstenite;
use tracing::{Instrument, debug, error, info, info_span, warn};

const LINK_FRAME_CAPACITY: usize = 256;
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_FRAMES: u32 = 10;

/// Text/close handling shared by the axum and tungstenite message types.
trait LinkMessage: Sized + Send + 'static {
    fn from_text(text: String) -> Self;
    fn as_text(&self) -> Option<&str>;
    fn is_close(&self) -> bool;
    fn close(reason: &'static str) -> Self;
}

impl LinkMessage for ws::Message {
    fn from_text(text: String) -> Self {
        ws::Message::Text(text.into())
    }

    fn as_text(&self) -> Option<&str> {
        match self {
            ws::Message::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    fn is_close(&self) -> bool {
        matches!(self, ws::Message::Close(_))
    }

    fn close(reason: &'static str) -> Self {
        ws::Message::Close(Some(ws::CloseFrame {
            code: close_code::POLICY,
            reason: reason.into(),
        }))
    }
}

impl LinkMessage for tungstenite::Message {
    fn from_text(text: String) -> Self {
        tungstenite::Message::text(text)
    }

    fn as_text(&self) -> Option<&str> {
        match self {
            tungstenite::Message::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    fn is_close(&self) -> bool {
        matches!(self, tungstenite::Message::Close(_))
    }

    fn close(reason: &'static str) -> Self {
        use tungstenite::protocol::CloseFrame;
        use tungstenite::protocol::frame::coding::CloseCode;

        tungstenite::Message::Close(Some(CloseFrame {
            code: CloseCode::Policy,
            reason: reason.into(),
        }))
    }
}

struct PeerLink {
    // Also the link's `conn_id`; tells a link apart from the one that replaced it.
    token: u64,
    frames_tx: mpsc::Sender<String>,
    close: Arc<Notify>,
}

enum LoopControl {
    Continue,
    Disconnect,
}

struct LinkStats {
    frames_in: u64,
    frames_out: u64,
    invalid: u32,
    last_invalid_log: Instant,
    last_full_log: Instant,
}

impl LinkStats {
    fn new() -> Self {
        let now = Instant::now() - LOG_THROTTLE;
        Self {
            frames_in: 0,
            frames_out: 0,
            invalid: 0,
            last_invalid_log: now,
            last_full_log: now,
        }
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

pub struct PeerMesh {
    local_id: String,
    me: Weak<PeerMesh>,
    inbound_tx: mpsc::Sender<Packet>,
    links: RwLock<HashMap<String, PeerLink>>,
    next_token: AtomicU64,
    closed: AtomicBool,
    last_send_failure_log: Mutex<Instant>,
}

impl PeerMesh {
    /// Create the mesh. Every packet received on any link is delivered to `inbound_tx`.
    pub fn initialize(local_id: impl Into<String>, inbound_tx: mpsc::Sender<Packet>) -> Arc<Self> {
        let local_id = local_id.into();
        info!(peer_id = %local_id, "peer mesh initialized");
        Arc::new_cyclic(|me| Self {
            local_id,
            me: me.clone(),
            inbound_tx,
            links: RwLock::new(HashMap::new()),
            next_token: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            last_send_failure_log: Mutex::new(Instant::now() - LOG_THROTTLE),
        })
    }

    pub async fn linked_peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.links.read().await.keys().cloned().collect();
        peers.sort();
        peers
    }

    /// Serve an inbound link until it closes.
    pub async fn accept(self: Arc<Self>, socket: WebSocket) {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let span = info_span!(
            "link",
            conn_id = token,
            direction = "inbound",
            peer_id = tracing::field::Empty
        );
        async move {
            let mut socket = socket;
            let peer_id = match self.exchange_identity(&mut socket).await {
                Ok(peer_id) => peer_id,
                Err(err) => {
                    warn!(error = %err, "inbound handshake failed");
                    let _ = socket.send(ws::Message::close("handshake failed")).await;
                    return;
                }
            };
            tracing::Span::current().record("peer_id", peer_id.as_str());

            match self.register(&peer_id, token).await {
                Ok((frames_rx, close)) => {
                    info!("peer connected");
                    self.run_link(socket, peer_id, token, frames_rx, close).await;
                }
                Err(err) => {
                    warn!(error = %err, "link rejected");
                    let _ = socket.send(ws::Message::close("shutting down")).await;
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Send our identity, then wait for theirs.
    async fn exchange_identity<S, M, E>(&self, socket: &mut S) -> Result<String, TransportError>
    where
        S: Stream<Item = Result<M, E>> + Sink<M> + Unpin,
        <S as Sink<M>>::Error: fmt::Display,
        M: LinkMessage,
        E: fmt::Display,
    {
        let hello = encode_identity(&self.local_id)
            .map_err(|e| TransportError::Handshake(e.to_string()))?;
        socket
            .send(M::from_text(hello))
            .await
            .map_err(|e| TransportError::Handshake(e.to_string()))?;

        let wait = async {
            while let Some(incoming) = socket.next().await {
                let message = incoming.map_err(|e| TransportError::Handshake(e.to_string()))?;
                if message.is_close() {
                    return Err(TransportError::LinkClosed);
                }
                let Some(text) = message.as_text() else {
                    continue;
                };
                return match decode_frame(text) {
                    Ok(LinkFrame::Identity { peer_id }) => Ok(peer_id),
                    Ok(LinkFrame::Packet(_)) => Err(TransportError::Handshake(
                        "packet before identity".to_string(),
                    )),
                    Err(err) => Err(TransportError::Handshake(err.to_string())),
                };
            }
            Err(TransportError::LinkClosed)
        };

        let peer_id = tokio::time::timeout(HANDSHAKE_TIMEOUT, wait)
            .await
            .map_err(|_| TransportError::Handshake("timed out waiting for identity".to_string()))??;

        let peer_id = peer_id.trim().to_string();
        if peer_id.is_empty() {
            return Err(TransportError::Handshake("empty peer id".to_string()));
        }
        if peer_id == self.local_id {
            return Err(TransportError::Handshake("connected to self".to_string()));
        }
        Ok(peer_id)
    }

    /// Record a link under `peer_id`, closing any older link for the same peer.
    async fn register(
        &self,
        peer_id: &str,
        token: u64,
    ) -> Result<(mpsc::Receiver<String>, Arc<Notify>), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::LinkClosed);
        }
        let (frames_tx, frames_rx) = mpsc::channel(LINK_FRAME_CAPACITY);
        let close = Arc::new(Notify::new());

        let previous = self.links.write().await.insert(
            peer_id.to_string(),
            PeerLink {
                token,
                frames_tx,
                close: close.clone(),
            },
        );
        if let Some(previous) = previous {
            info!(peer_id, "newer link replaces existing one");
            previous.close.notify_one();
        }
        Ok((frames_rx, close))
    }

    async fn unregister(&self, peer_id: &str, token: u64) {
        let mut links = self.links.write().await;
        if links.get(peer_id).is_some_and(|link| link.token == token) {
            links.remove(peer_id);
        }
    }

    async fn run_link<S, M, E>(
        &self,
        socket: S,
        peer_id: String,
        token: u64,
        mut frames_rx: mpsc::Receiver<String>,
        close: Arc<Notify>,
    ) where
        S: Stream<Item = Result<M, E>> + Sink<M> + Unpin,
        <S as Sink<M>>::Error: fmt::Display,
        M: LinkMessage,
        E: fmt::Display,
    {
        let (mut sink, mut stream) = socket.split();
        let mut stats = LinkStats::new();

        loop {
            tokio::select! {
                _ = close.notified() => {
                    let _ = sink.send(M::close("link closed by peer mesh")).await;
                    break;
                }
                frame = frames_rx.recv() => {
                    let Some(text) = frame else {
                        break;
                    };
                    if let Err(err) = sink.send(M::from_text(text)).await {
                        warn!(error = %err, "link send failed");
                        break;
                    }
                    stats.frames_out += 1;
                }
                incoming = stream.next() => {
                    match incoming {
                        Some(Ok(message)) => {
                            if message.is_close() {
                                info!("peer closed link");
                                break;
                            }
                            // Ping/pong are answered by the socket layer; binary is not part of the protocol.
                            let Some(text) = message.as_text() else {
                                continue;
                            };
                            stats.frames_in += 1;
                            if let LoopControl::Disconnect = self.deliver(&peer_id, text, &mut stats) {
                                let _ = sink.send(M::close("too many invalid frames")).await;
                                break;
                            }
                        }
                        Some(Err(err)) => {
                            warn!(error = %err, "link recv error");
                            break;
                        }
                        None => {
                            info!("link closed");
                            break;
                        }
                    }
                }
            }
        }

        self.unregister(&peer_id, token).await;
        debug!(
            frames_in = stats.frames_in,
            frames_out = stats.frames_out,
            invalid = stats.invalid,
            "link stats"
        );
        info!("peer disconnected");
    }

    fn deliver(&self, peer_id: &str, text: &str, stats: &mut LinkStats) -> LoopControl {
        let decoded = match decode_frame(text) {
            Ok(LinkFrame::Packet(wire)) => Packet::try_from(wire),
            Ok(LinkFrame::Identity { .. }) => return LoopControl::Continue,
            Err(err) => Err(err),
        };

        let packet = match decoded {
            Ok(packet) => packet,
            Err(err) => {
                stats.invalid += 1;
                if should_log(&mut stats.last_invalid_log) {
                    warn!(error = %err, bytes = text.len(), "dropping invalid frame");
                }
                if stats.invalid > MAX_INVALID_FRAMES {
                    return LoopControl::Disconnect;
                }
                return LoopControl::Continue;
            }
        };

        if packet.sender_id != peer_id {
            if should_log(&mut stats.last_invalid_log) {
                warn!(sender_id = %packet.sender_id, "sender does not match link identity; dropping");
            }
            return LoopControl::Continue;
        }

        match self.inbound_tx.try_send(packet) {
            Ok(()) => LoopControl::Continue,
            Err(mpsc::error::TrySendError::Full(packet)) => {
                if should_log(&mut stats.last_full_log) {
                    warn!(kind = packet.body.kind(), "inbound channel full; dropping packet");
                }
                LoopControl::Continue
            }
            Err(mpsc::error::TrySendError::Closed(_)) => LoopControl::Disconnect,
        }
    }

    fn send_frame(link: &PeerLink, text: String) -> Result<(), TransportError> {
        link.frames_tx.try_send(text).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => TransportError::LinkFull,
            mpsc::error::TrySendError::Closed(_) => TransportError::LinkClosed,
        })
    }

    fn log_send_failure(&self, peer_id: &str, kind: &'static str, err: &TransportError) {
        let throttled = match self.last_send_failure_log.lock() {
            Ok(mut last) => !should_log(&mut last),
            Err(_) => false,
        };
        if !throttled {
            warn!(peer_id, kind, error = %err, "peer send failed; packet dropped");
        }
    }
}

#[async_trait]
impl PeerTransport for PeerMesh {
    async fn connect(&self, address: &str) -> Result<String, TransportError> {
        let mesh = self.me.upgrade().ok_or(TransportError::LinkClosed)?;
        let (mut socket, _response) = tokio_tungstenite::connect_async(address)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let peer_id = match self.exchange_identity(&mut socket).await {
            Ok(peer_id) => peer_id,
            Err(err) => {
                let _ = socket.send(tungstenite::Message::close("handshake failed")).await;
                return Err(err);
            }
        };
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let (frames_rx, close) = self.register(&peer_id, token).await?;

        let span = info_span!(
            "link",
            conn_id = token,
            direction = "outbound",
            peer_id = %peer_id
        );
        let link_peer_id = peer_id.clone();
        tokio::spawn(
            async move {
                info!("peer connected");
                mesh.run_link(socket, link_peer_id, token, frames_rx, close)
                    .await;
            }
            .instrument(span),
        );
        Ok(peer_id)
    }

    async fn broadcast(&self, packet: &Packet) {
        let text = match encode_packet(packet) {
            Ok(text) => text,
            Err(err) => {
                error!(error = %err, kind = packet.body.kind(), "failed to encode packet");
                return;
            }
        };

        let links = self.links.read().await;
        for (peer_id, link) in links.iter() {
            if let Err(err) = Self::send_frame(link, text.clone()) {
                self.log_send_failure(peer_id, packet.body.kind(), &err);
            }
        }
    }

    async fn send_to(&self, peer_id: &str, packet: &Packet) -> Result<(), TransportError> {
        let text = encode_packet(packet).map_err(|e| TransportError::Handshake(e.to_string()))?;
        let links = self.links.read().await;
        let link = links.get(peer_id).ok_or(TransportError::UnknownPeer)?;
        Self::send_frame(link, text)
    }

    async fn teardown(&self) {
        self.closed.store(true, Ordering::Release);
        let links: Vec<(String, PeerLink)> = self.links.write().await.drain().collect();
        for (peer_id, link) in links {
            debug!(%peer_id, "closing link");
            link.close.notify_one();
        }
        info!("peer mesh torn down");
    }
}

pub async fn peer_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let mesh = state.mesh.clone();
    ws.on_upgrade(move |socket| mesh.accept(socket))
}
