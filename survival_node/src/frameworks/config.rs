use crate::domain::{ClassType, Coordinates};
use crate::use_cases::NodeTimings;
use std::{net::IpAddr, path::PathBuf, time::Duration};
use std::env;

// Runtime/node constants (not gameplay tuning).

pub const COMMAND_CHANNEL_CAPACITY: usize = 64;
pub const PACKET_CHANNEL_CAPACITY: usize = 1024;
pub const POSITION_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeMode {
    /// Authoritative node; accepts joiners.
    Host,
    /// Client of a host found through `JOIN_PEERS`.
    Join,
    /// Host that never dials anyone.
    Single,
}

impl NodeMode {
    pub fn is_host(self) -> bool {
        !matches!(self, NodeMode::Join)
    }
}

/// Everything needed to boot one node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub peer_id: String,
    /// Unset falls back to the saved profile, then to a default.
    pub player_name: Option<String>,
    pub class_type: Option<ClassType>,
    pub mode: NodeMode,
    pub join_peers: Vec<String>,
    pub spawn_radius_m: f64,
    pub narrator_url: Option<String>,
    pub narrator_timeout: Duration,
    pub save_dir: PathBuf,
    pub continue_save: bool,
    pub start_position: Option<Coordinates>,
    pub rng_seed: Option<u64>,
    pub timings: NodeTimings,
}

impl NodeConfig {
    pub fn from_env() -> Self {
        Self {
            peer_id: peer_id(),
            player_name: player_name(),
            class_type: player_class(),
            mode: node_mode(),
            join_peers: join_peers(),
            spawn_radius_m: spawn_radius_m(),
            narrator_url: narrator_url(),
            narrator_timeout: narrator_timeout(),
            save_dir: save_dir(),
            continue_save: continue_save(),
            start_position: start_position(),
            rng_seed: rng_seed(),
            timings: NodeTimings::default(),
        }
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

pub fn http_port() -> u16 {
    parsed("NODE_PORT").unwrap_or(3001)
}

pub fn bind_address() -> IpAddr {
    parsed("NODE_BIND").unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

pub fn peer_id() -> String {
    env::var("PEER_ID")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

pub fn player_name() -> Option<String> {
    env::var("PLAYER_NAME")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn player_class() -> Option<ClassType> {
    parsed("PLAYER_CLASS")
}

pub fn node_mode() -> NodeMode {
    match env::var("NODE_MODE")
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
        .as_str()
    {
        "join" => NodeMode::Join,
        "single" => NodeMode::Single,
        _ => NodeMode::Host,
    }
}

pub fn join_peers() -> Vec<String> {
    parse_peer_list(&env::var("JOIN_PEERS").unwrap_or_default())
}

pub fn parse_peer_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn spawn_radius_m() -> f64 {
    parsed::<f64>("SPAWN_RADIUS_M")
        .filter(|r| r.is_finite() && *r >= 0.0)
        .unwrap_or(300.0)
}

pub fn narrator_url() -> Option<String> {
    env::var("NARRATOR_URL")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn narrator_timeout() -> Duration {
    Duration::from_millis(parsed("NARRATOR_TIMEOUT_MS").unwrap_or(4000))
}

pub fn save_dir() -> PathBuf {
    env::var("SAVE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".survival"))
}

pub fn continue_save() -> bool {
    matches!(
        env::var("CONTINUE").as_deref().map(str::trim),
        Ok("1") | Ok("true") | Ok("TRUE") | Ok("yes")
    )
}

pub fn start_position() -> Option<Coordinates> {
    Some(Coordinates {
        lat: parsed("START_LAT")?,
        lng: parsed("START_LNG")?,
    })
}

pub fn rng_seed() -> Option<u64> {
    parsed("RNG_SEED")
}
