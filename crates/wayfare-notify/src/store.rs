use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use wayfare_types::{NotificationId, NotificationItem};

use crate::api::NotificationApi;
use crate::auth::TokenSource;
use crate::config::DuplicatePolicy;

pub const DELETE_ALL_PROMPT: &str = "Delete all notifications?";
const DELETE_FAILED: &str = "Could not delete the notification. Please try again.";
const CLEAR_FAILED: &str = "Could not clear notifications. Please try again.";

/// Yes/no gate in front of destructive bulk operations.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Result of a delete or delete-all call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    /// No token; nothing was sent.
    SignedOut,
    /// The confirmation gate said no.
    Declined,
    /// The server refused or could not be reached. State is unchanged.
    Failed { message: String },
}

/// What observers (badge, list) render from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Newest first.
    pub items: Vec<NotificationItem>,
    pub badge: usize,
    /// User-facing text for the last failed write, cleared by the next
    /// successful one.
    pub last_error: Option<String>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Default)]
struct StoreState {
    items: Vec<NotificationItem>,
    badge: usize,
    last_error: Option<String>,
    /// Bumped by every refresh and by clear(); only the latest may apply.
    generation: u64,
    in_flight: usize,
    /// Pushes received while a refresh was in flight, oldest first.
    pushed_during_refresh: Vec<NotificationItem>,
    /// Ids deleted while a refresh was in flight; the fetched list may
    /// still contain them.
    deleted_during_refresh: Vec<NotificationId>,
}

impl StoreState {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            items: self.items.clone(),
            badge: self.badge,
            last_error: self.last_error.clone(),
        }
    }

    fn finish_refresh(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            self.pushed_during_refresh.clear();
            self.deleted_during_refresh.clear();
        }
    }
}

/// Authoritative in-memory notification list and badge count for the
/// signed-in user.
///
/// Cheap to clone; clones share state. Every mutation publishes a fresh
/// [`Snapshot`] to subscribers.
#[derive(Clone)]
pub struct NotificationStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    api: Arc<dyn NotificationApi>,
    tokens: Arc<dyn TokenSource>,
    policy: DuplicatePolicy,
    state: Mutex<StoreState>,
    snapshot_tx: watch::Sender<Snapshot>,
}

impl NotificationStore {
    pub fn new(
        api: Arc<dyn NotificationApi>,
        tokens: Arc<dyn TokenSource>,
        policy: DuplicatePolicy,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(Snapshot::default());
        Self {
            inner: Arc::new(StoreInner {
                api,
                tokens,
                policy,
                state: Mutex::new(StoreState::default()),
                snapshot_tx,
            }),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    pub fn badge(&self) -> usize {
        self.state().badge
    }

    /// Pull the full list from the server and replace local state.
    ///
    /// Returns the fetched items, or an empty list when signed out, when the
    /// request failed, or when a newer refresh superseded this one.
    pub async fn refresh(&self) -> Vec<NotificationItem> {
        let Some(token) = self.inner.tokens.token() else {
            debug!("No token, clearing notifications");
            self.clear();
            return Vec::new();
        };

        let generation = {
            let mut state = self.state();
            state.generation += 1;
            if state.in_flight == 0 {
                state.pushed_during_refresh.clear();
                state.deleted_during_refresh.clear();
            }
            state.in_flight += 1;
            state.generation
        };

        let result = self.inner.api.list(&token).await;

        let mut state = self.state();
        let stale = state.generation != generation;

        let mut fetched = match result {
            Ok(items) if !stale => items,
            Ok(_) => {
                debug!("Dropping stale notification list (generation {})", generation);
                state.finish_refresh();
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to load notifications: {}", e);
                state.finish_refresh();
                return Vec::new();
            }
        };

        if !state.deleted_during_refresh.is_empty() {
            let deleted = &state.deleted_during_refresh;
            fetched.retain(|i| !deleted.contains(&i.id));
        }
        info!("Loaded {} notifications", fetched.len());

        let mut items = fetched.clone();
        let mut replayed = 0;
        for pushed in &state.pushed_during_refresh {
            if !items.iter().any(|i| i.id == pushed.id) {
                items.insert(0, pushed.clone());
                replayed += 1;
            }
        }
        if replayed > 0 {
            debug!("Re-applied {} pushes that raced the refresh", replayed);
        }

        state.badge = badge_for(&fetched) + replayed;
        state.items = items;
        state.finish_refresh();
        self.publish(&state);

        fetched
    }

    /// Delete one notification on the server, then locally.
    pub async fn delete(&self, id: NotificationId) -> WriteOutcome {
        let Some(token) = self.inner.tokens.token() else {
            return WriteOutcome::SignedOut;
        };

        if let Err(e) = self.inner.api.delete(&token, id).await {
            warn!("Failed to delete notification {}: {}", id, e);
            return self.fail(DELETE_FAILED);
        }

        let mut state = self.state();
        state.pushed_during_refresh.retain(|i| i.id != id);
        if state.in_flight > 0 {
            state.deleted_during_refresh.push(id);
        }
        if let Some(pos) = state.items.iter().position(|i| i.id == id) {
            state.items.remove(pos);
            state.badge = state.badge.saturating_sub(1);
        } else {
            debug!("Deleted notification {} was not in the local list", id);
        }
        state.last_error = None;
        self.publish(&state);

        WriteOutcome::Applied
    }

    /// Delete every notification, after the gate confirms.
    pub async fn delete_all(&self, confirm: &dyn Confirm) -> WriteOutcome {
        let Some(token) = self.inner.tokens.token() else {
            return WriteOutcome::SignedOut;
        };

        if !confirm.confirm(DELETE_ALL_PROMPT) {
            return WriteOutcome::Declined;
        }

        if let Err(e) = self.inner.api.delete_all(&token).await {
            warn!("Failed to clear notifications: {}", e);
            return self.fail(CLEAR_FAILED);
        }

        let mut state = self.state();
        // A list fetched before the wipe is out of date.
        state.generation += 1;
        state.pushed_during_refresh.clear();
        state.items.clear();
        state.badge = 0;
        state.last_error = None;
        self.publish(&state);

        info!("Cleared all notifications");
        WriteOutcome::Applied
    }

    /// Take one item delivered by the live channel.
    pub fn ingest_pushed(&self, item: NotificationItem) {
        let mut state = self.state();
        if state.in_flight > 0 {
            state.pushed_during_refresh.push(item.clone());
        }

        let known = state.items.iter().position(|i| i.id == item.id);
        match (self.inner.policy, known) {
            (DuplicatePolicy::Upsert, Some(pos)) => {
                let existing = &mut state.items[pos];
                existing.kind = item.kind;
                existing.message = item.message;
                if item.is_read.is_some() {
                    existing.is_read = item.is_read;
                }
                if item.data.is_some() {
                    existing.data = item.data;
                }
                debug!("Pushed notification {} replaced a known entry", existing.id);
            }
            _ => {
                state.items.insert(0, item);
                state.badge += 1;
            }
        }

        self.publish(&state);
    }

    /// Collapse to the signed-out state. In-flight refreshes are discarded.
    pub fn clear(&self) {
        let mut state = self.state();
        state.generation += 1;
        state.items.clear();
        state.badge = 0;
        state.last_error = None;
        state.pushed_during_refresh.clear();
        state.deleted_during_refresh.clear();
        self.publish(&state);
    }

    fn fail(&self, message: &str) -> WriteOutcome {
        let mut state = self.state();
        state.last_error = Some(message.to_string());
        self.publish(&state);
        WriteOutcome::Failed {
            message: message.to_string(),
        }
    }

    fn publish(&self, state: &StoreState) {
        self.inner.snapshot_tx.send_replace(state.snapshot());
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Unread count when any item reports read state, otherwise the item count.
pub fn badge_for(items: &[NotificationItem]) -> usize {
    if items.iter().any(|i| i.is_read.is_some()) {
        items.iter().filter(|i| i.is_read == Some(false)).count()
    } else {
        items.len()
    }
}
