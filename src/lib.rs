pub mod config;
pub mod error;
pub mod gateway;
pub mod judge;
pub mod room;

pub use config::Config;
pub use error::{Result, RoomError};
