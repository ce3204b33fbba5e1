pub mod client;
pub mod events;

pub use client::GatewayConnection;
pub use events::{ClientEvent, ScoreUpdate, ServerEvent};
