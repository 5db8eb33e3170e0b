use serde::{Deserialize, Serialize};

use crate::models::UserId;

// -- Profile --

/// Subset of `GET /user/profile` the notification client needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub userid: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
}

impl UserProfile {
    /// A profile without a nickname belongs to an unfinished sign-up.
    pub fn is_complete(&self) -> bool {
        self.nickname.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.userid.as_deref())
            .unwrap_or("user")
    }
}
