//! Runtime hosting the relay handler over HTTP.

mod config;
mod server;

pub use config::ServerConfig;
pub use server::RelayServer;
