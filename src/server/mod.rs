pub mod auth;
pub mod config;
mod health;
mod http_layers;
pub mod metrics;
pub mod server;
pub mod state;
pub mod stdio;
mod websocket;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server, serve};
pub use state::ServerState;
pub use stdio::serve_stdio;
