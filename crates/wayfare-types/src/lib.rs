//! Wayfare shared types.
//!
//! Wire shapes of the notification REST endpoints and the live push
//! channel, plus the domain model the notification client keeps in memory.

pub mod api;
pub mod events;
pub mod models;

pub use events::{ConnectionState, PushFrame};
pub use models::{NotificationId, NotificationItem, NotificationKind, UserId};
