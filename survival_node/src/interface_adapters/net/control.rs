// Local control API: the action edge a player client (or a test) drives the node through.

use crate::domain::ActionError;
use crate::domain::state::Coordinates;
use crate::domain::systems::encounter::EncounterAction;
use crate::interface_adapters::http::error_response;
use crate::interface_adapters::state::AppState;
use crate::use_cases::types::Reply;
use crate::use_cases::{ActionReport, Item, NodeCommand, PositionUpdate};

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::oneshot;

#[derive(Debug, Deserialize)]
pub struct PositionRequest {
    pub lat: f64,
    pub lng: f64,
}

impl PositionRequest {
    fn validate(&self) -> Result<Coordinates, &'static str> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err("coordinates must be finite");
        }
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lng) {
            return Err("coordinates out of range");
        }
        Ok(Coordinates {
            lat: self.lat,
            lng: self.lng,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ConnectPeerRequest {
    pub address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectPeerResponse {
    pub peer_id: String,
}

/// Base location; omit both fields to use the current fix.
#[derive(Debug, Default, Deserialize)]
pub struct BaseRequest {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngageRequest {
    pub entity_id: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EncounterActionDto {
    Collect,
    Attack,
    Laser,
    Flee,
}

impl From<EncounterActionDto> for EncounterAction {
    fn from(value: EncounterActionDto) -> Self {
        match value {
            EncounterActionDto::Collect => EncounterAction::Collect,
            EncounterActionDto::Attack => EncounterAction::Attack,
            EncounterActionDto::Laser => EncounterAction::Laser,
            EncounterActionDto::Flee => EncounterAction::Flee,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: EncounterActionDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviveTargetRequest {
    pub target_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UseItemRequest {
    pub item: Item,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

pub fn refusal_status(err: &ActionError) -> StatusCode {
    if err.is_authority() {
        StatusCode::FORBIDDEN
    } else if err.is_unknown_target() {
        StatusCode::NOT_FOUND
    } else if err.is_insufficient() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::CONFLICT
    }
}

fn node_gone() -> Response {
    error_response(StatusCode::SERVICE_UNAVAILABLE, "node is not running")
}

/// Hand a command to the node task and translate its reply.
async fn dispatch(state: &AppState, command: impl FnOnce(Reply) -> NodeCommand) -> Response {
    let (reply, reply_rx) = oneshot::channel();
    if state.command_tx.send(command(reply)).await.is_err() {
        return node_gone();
    }
    match reply_rx.await {
        Ok(Ok(report)) => (StatusCode::OK, Json(report)).into_response(),
        Ok(Err(err)) => {
            tracing::debug!(error = %err, "action refused");
            error_response(refusal_status(&err), err.to_string())
        }
        Err(_) => node_gone(),
    }
}

pub async fn state_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let view = state.view_rx.borrow().clone();
    Json(view)
}

pub async fn position_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PositionRequest>,
) -> Response {
    let position = match payload.validate() {
        Ok(position) => position,
        Err(reason) => return error_response(StatusCode::BAD_REQUEST, reason),
    };
    if state
        .position_tx
        .send(PositionUpdate::Fix(position))
        .await
        .is_err()
    {
        return node_gone();
    }
    Json(ActionReport::new("Position updated.")).into_response()
}

pub async fn position_unavailable_handler(State(state): State<Arc<AppState>>) -> Response {
    if state
        .position_tx
        .send(PositionUpdate::Unavailable)
        .await
        .is_err()
    {
        return node_gone();
    }
    Json(ActionReport::new("Position marked unavailable.")).into_response()
}

pub async fn connect_peer_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ConnectPeerRequest>,
) -> Response {
    let address = payload.address.trim().to_string();
    if address.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "address is required");
    }

    let (reply, reply_rx) = oneshot::channel();
    if state
        .command_tx
        .send(NodeCommand::Connect { address, reply })
        .await
        .is_err()
    {
        return node_gone();
    }
    match reply_rx.await {
        Ok(Ok(peer_id)) => Json(ConnectPeerResponse { peer_id }).into_response(),
        Ok(Err(err)) => error_response(StatusCode::BAD_GATEWAY, err.to_string()),
        Err(_) => node_gone(),
    }
}

pub async fn establish_base_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Response {
    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        BaseRequest::default()
    } else {
        match serde_json::from_slice::<BaseRequest>(&body) {
            Ok(payload) => payload,
            Err(err) => return error_response(StatusCode::BAD_REQUEST, err.to_string()),
        }
    };
    let at = match (payload.lat, payload.lng) {
        (Some(lat), Some(lng)) => match (PositionRequest { lat, lng }).validate() {
            Ok(position) => Some(position),
            Err(reason) => return error_response(StatusCode::BAD_REQUEST, reason),
        },
        (None, None) => None,
        _ => return error_response(StatusCode::BAD_REQUEST, "lat and lng go together"),
    };
    dispatch(&state, |reply| NodeCommand::EstablishBase { at, reply }).await
}

pub async fn upgrade_base_handler(State(state): State<Arc<AppState>>) -> Response {
    dispatch(&state, |reply| NodeCommand::UpgradeBase { reply }).await
}

pub async fn toggle_phase_handler(State(state): State<Arc<AppState>>) -> Response {
    dispatch(&state, |reply| NodeCommand::TogglePhase { reply }).await
}

pub async fn engage_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EngageRequest>,
) -> Response {
    let entity_id = payload.entity_id;
    dispatch(&state, |reply| NodeCommand::Engage { entity_id, reply }).await
}

pub async fn hack_handler(State(state): State<Arc<AppState>>) -> Response {
    dispatch(&state, |reply| NodeCommand::Hack { reply }).await
}

pub async fn encounter_action_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ActionRequest>,
) -> Response {
    let action: EncounterAction = payload.action.into();
    dispatch(&state, |reply| NodeCommand::Act { action, reply }).await
}

pub async fn revive_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReviveTargetRequest>,
) -> Response {
    let target_id = payload.target_id;
    dispatch(&state, |reply| NodeCommand::Revive { target_id, reply }).await
}

pub async fn use_item_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UseItemRequest>,
) -> Response {
    let item = payload.item;
    dispatch(&state, |reply| NodeCommand::UseItem { item, reply }).await
}

pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Response {
    let text = payload.text;
    dispatch(&state, |reply| NodeCommand::Chat { text, reply }).await
}
