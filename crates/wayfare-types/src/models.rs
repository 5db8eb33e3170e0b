use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Server-issued notification id. Stable across pull and push.
pub type NotificationId = i64;

/// Numeric account id, as returned by `GET /user/profile`.
pub type UserId = i64;

/// Presentation tag of a notification.
///
/// The list endpoint reports `follow`, pushed frames report `followed`; both
/// map to [`NotificationKind::Follow`]. Unknown tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationKind {
    Follow,
    CalendarShare,
    Other(String),
}

impl NotificationKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Follow => "follow",
            Self::CalendarShare => "calendar_share",
            Self::Other(tag) => tag,
        }
    }

    /// Glyph shown next to the message in the dropdown list.
    pub fn avatar(&self) -> &'static str {
        match self {
            Self::Follow => "👤",
            Self::CalendarShare => "📅",
            Self::Other(_) => "🔔",
        }
    }
}

impl From<String> for NotificationKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "follow" | "followed" => Self::Follow,
            "calendar_share" => Self::CalendarShare,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for NotificationKind {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<NotificationKind> for String {
    fn from(kind: NotificationKind) -> Self {
        kind.as_str().to_string()
    }
}

/// One entry in the notification center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationItem {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    /// Absent on pushed events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Extra payload (sender, calendar title, ...). The list endpoint sends it
    /// JSON-encoded inside a string; it is decoded here when possible.
    #[serde(
        default,
        deserialize_with = "deserialize_data",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Value>,
}

impl NotificationItem {
    pub fn new(id: NotificationId, kind: impl Into<NotificationKind>, message: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            message: message.into(),
            is_read: None,
            created_at: None,
            data: None,
        }
    }
}

fn deserialize_data<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => {
            Some(serde_json::from_str(&text).unwrap_or(Value::String(text)))
        }
        Some(other) => Some(other),
    })
}
