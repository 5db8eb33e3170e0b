use std::fmt;

use wayfare_types::NotificationId;

use crate::store::{NotificationStore, Snapshot, WriteOutcome};

/// Element ids other pages embed to host the notification center.
pub const BADGE_ELEMENT_ID: &str = "notif-badge";
pub const LIST_ELEMENT_ID: &str = "notif-list";
pub const EMPTY_ELEMENT_ID: &str = "notif-empty-text";

pub const EMPTY_TEXT: &str = "No notifications yet.";

/// One dismissible row of the dropdown list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: NotificationId,
    pub avatar: &'static str,
    pub message: String,
}

impl Row {
    /// The row's close button.
    pub async fn dismiss(&self, store: &NotificationStore) -> WriteOutcome {
        store.delete(self.id).await
    }
}

/// Badge and list as they should appear for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    /// `None` hides the badge.
    pub badge: Option<String>,
    pub rows: Vec<Row>,
    pub empty_text: Option<&'static str>,
    pub error: Option<String>,
}

impl View {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let rows: Vec<Row> = snapshot
            .items
            .iter()
            .map(|item| Row {
                id: item.id,
                avatar: item.kind.avatar(),
                message: item.message.clone(),
            })
            .collect();

        Self {
            badge: (snapshot.badge > 0).then(|| snapshot.badge.to_string()),
            empty_text: rows.is_empty().then_some(EMPTY_TEXT),
            rows,
            error: snapshot.last_error.clone(),
        }
    }

    pub fn row(&self, id: NotificationId) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == id)
    }
}

impl From<&Snapshot> for View {
    fn from(snapshot: &Snapshot) -> Self {
        Self::from_snapshot(snapshot)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.badge {
            Some(count) => writeln!(f, "[{}] {}", BADGE_ELEMENT_ID, count)?,
            None => writeln!(f, "[{}] (hidden)", BADGE_ELEMENT_ID)?,
        }

        if let Some(text) = self.empty_text {
            writeln!(f, "[{}] {}", EMPTY_ELEMENT_ID, text)?;
        } else {
            writeln!(f, "[{}]", LIST_ELEMENT_ID)?;
            for row in &self.rows {
                writeln!(f, "  {} #{:<6} {}", row.avatar, row.id, row.message)?;
            }
        }

        if let Some(error) = &self.error {
            writeln!(f, "! {}", error)?;
        }
        Ok(())
    }
}
