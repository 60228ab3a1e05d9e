// Interface adapters: wire protocol, peer links, control API, and outbound services.

pub mod clients;
pub mod http;
pub mod net;
pub mod persistence;
pub mod protocol;
pub mod state;
