// Network adapter modules split by peer links vs the local control API.

pub mod control;
pub mod mesh;

pub use mesh::{PeerMesh, peer_ws_handler};
