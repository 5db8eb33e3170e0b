//! Wayfare notification client.
//!
//! - `store`: in-memory list + badge, pulled over REST and fed by pushes
//! - `channel`: the single live WebSocket for the signed-in user
//! - `render`: projects store snapshots onto the badge and the dropdown list
//! - `session`: resolves the identity and wires the pieces together once

pub mod api;
pub mod auth;
pub mod channel;
pub mod config;
pub mod error;
pub mod render;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

pub use api::{HttpApi, NotificationApi};
pub use auth::{TokenCell, TokenSource};
pub use channel::{Connector, LiveChannel, WsConnector};
pub use config::{Config, DuplicatePolicy};
pub use error::{ApiError, ChannelError, ConfigError};
pub use render::View;
pub use session::{Session, SessionStatus};
pub use store::{Confirm, NotificationStore, Snapshot, WriteOutcome};
