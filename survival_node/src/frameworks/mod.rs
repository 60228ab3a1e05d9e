// Frameworks: runtime configuration and process bootstrap.

pub mod config;
pub mod server;
