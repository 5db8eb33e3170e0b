use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{NotificationId, NotificationItem};

/// Frame pushed over `/ws/notify/{user_id}` when a notification is created.
///
/// Only `notification_id`, `message` and `event` are required. Everything
/// else the server attaches (`from_user_id`, `title`, `date`, ...) is kept in
/// `extra` and becomes the item's `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushFrame {
    pub notification_id: NotificationId,
    pub message: String,
    pub event: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PushFrame {
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Pushed items carry no read state.
    pub fn into_item(self) -> NotificationItem {
        let data = (!self.extra.is_empty()).then_some(Value::Object(self.extra));
        NotificationItem {
            data,
            ..NotificationItem::new(self.notification_id, self.event, self.message)
        }
    }
}

/// Lifecycle of the live update channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Closed,
    Connecting,
    Open,
    Erroring,
}

impl ConnectionState {
    pub fn is_live(self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }
}
