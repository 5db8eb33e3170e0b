use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use wayfare_types::{ConnectionState, PushFrame, UserId};

use crate::error::ChannelError;
use crate::store::NotificationStore;

/// One inbound frame, stripped of transport detail.
#[derive(Debug)]
pub enum Inbound {
    Text(String),
    /// Close frame from the server.
    Close,
    /// Binary, ping, pong: nothing the notification center uses.
    Other,
}

pub type InboundStream = BoxStream<'static, Result<Inbound, ChannelError>>;

/// Opens the push connection. Injected so tests can drive frames by hand.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<InboundStream, ChannelError>;
}

/// [`Connector`] over a real WebSocket with `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<InboundStream, ChannelError> {
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(ChannelError::InvalidAddress {
                url: url.to_string(),
                reason: "expected a ws:// or wss:// URL".into(),
            });
        }

        let (ws_stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(ChannelError::Connect)?;

        // Reading drives pong replies, so the socket is consumed whole.
        let frames = ws_stream.map(|msg| match msg {
            Ok(Message::Text(text)) => Ok(Inbound::Text(text.as_str().to_owned())),
            Ok(Message::Close(_)) => Ok(Inbound::Close),
            Ok(_) => Ok(Inbound::Other),
            Err(e) => Err(ChannelError::Transport(e)),
        });
        Ok(frames.boxed())
    }
}

/// The single live update channel for the signed-in user.
///
/// At most one connection exists at a time: [`open`](Self::open) tears down
/// the previous one before spawning the next. There is no reconnect; a
/// closed channel stays closed until `open` is called again.
pub struct LiveChannel {
    connector: Arc<dyn Connector>,
    store: NotificationStore,
    ws_base: String,
    state: Arc<ChannelState>,
    active: Mutex<Option<ActiveConnection>>,
}

struct ActiveConnection {
    user_id: UserId,
    task: JoinHandle<()>,
}

/// Shared between the owner and the connection task. Only the connection
/// whose id matches `current` may publish state.
///
/// `current` is only changed and checked while holding the watch lock, so a
/// stale task cannot slip a write in after the owner switched connections.
struct ChannelState {
    current: AtomicU64,
    next_id: AtomicU64,
    tx: watch::Sender<ConnectionState>,
}

impl ChannelState {
    fn set(&self, conn_id: u64, state: ConnectionState) {
        self.tx.send_if_modified(|value| {
            if self.current.load(Ordering::Acquire) != conn_id {
                return false;
            }
            *value = state;
            true
        });
    }

    fn switch_to(&self, conn_id: u64, state: ConnectionState) {
        self.tx.send_modify(|value| {
            self.current.store(conn_id, Ordering::Release);
            *value = state;
        });
    }
}

impl LiveChannel {
    pub fn new(
        connector: Arc<dyn Connector>,
        store: NotificationStore,
        ws_base: impl Into<String>,
    ) -> Self {
        let (tx, _) = watch::channel(ConnectionState::Closed);
        Self {
            connector,
            store,
            ws_base: ws_base.into().trim_end_matches('/').to_string(),
            state: Arc::new(ChannelState {
                current: AtomicU64::new(0),
                next_id: AtomicU64::new(1),
                tx,
            }),
            active: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.tx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.tx.subscribe()
    }

    /// Identity the channel was last opened for, until [`close`](Self::close).
    pub fn user_id(&self) -> Option<UserId> {
        self.active().as_ref().map(|a| a.user_id)
    }

    pub fn url_for(&self, user_id: UserId) -> String {
        format!("{}/ws/notify/{}", self.ws_base, user_id)
    }

    /// Start a connection for `user_id`, closing any existing one first.
    ///
    /// Returns immediately; the handshake completes in the background and is
    /// observable through [`subscribe_state`](Self::subscribe_state). Must be
    /// called from within a Tokio runtime. Returns `false` for an empty
    /// identity.
    pub fn open(&self, user_id: UserId) -> bool {
        if user_id <= 0 {
            warn!("Refusing to open notification channel for user id {}", user_id);
            return false;
        }

        let mut active = self.active();
        if let Some(prev) = active.take() {
            info!("Closing notification channel for user {}", prev.user_id);
            prev.task.abort();
        }

        let conn_id = self.state.next_id.fetch_add(1, Ordering::Relaxed);
        self.state.switch_to(conn_id, ConnectionState::Connecting);

        let url = self.url_for(user_id);
        info!("Opening notification channel {}", url);

        let task = tokio::spawn(run_connection(
            self.connector.clone(),
            url,
            self.store.clone(),
            self.state.clone(),
            conn_id,
        ));

        *active = Some(ActiveConnection { user_id, task });
        true
    }

    /// Tear down the current connection, if any. Synchronous.
    pub fn close(&self) {
        let prev = self.active().take();
        // Orphan whatever the old task might still publish.
        self.state.switch_to(0, ConnectionState::Closed);

        if let Some(prev) = prev {
            info!("Closing notification channel for user {}", prev.user_id);
            prev.task.abort();
        }
    }

    fn active(&self) -> MutexGuard<'_, Option<ActiveConnection>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        if let Some(prev) = self.active().take() {
            prev.task.abort();
        }
    }
}

async fn run_connection(
    connector: Arc<dyn Connector>,
    url: String,
    store: NotificationStore,
    state: Arc<ChannelState>,
    conn_id: u64,
) {
    let mut frames = match connector.connect(&url).await {
        Ok(frames) => frames,
        Err(e) => {
            warn!("Notification channel {} failed to connect: {}", url, e);
            state.set(conn_id, ConnectionState::Erroring);
            state.set(conn_id, ConnectionState::Closed);
            return;
        }
    };

    info!("Notification channel connected: {}", url);
    state.set(conn_id, ConnectionState::Open);

    while let Some(frame) = frames.next().await {
        match frame {
            Ok(Inbound::Text(text)) => match PushFrame::decode(&text) {
                Ok(push) => {
                    debug!(
                        "Push {} ({}) received on {}",
                        push.notification_id, push.event, url
                    );
                    store.ingest_pushed(push.into_item());
                }
                Err(e) => {
                    let raw: String = text.chars().take(200).collect();
                    warn!("Discarding malformed push frame: {} -- raw: {}", e, raw);
                }
            },
            Ok(Inbound::Close) => {
                info!("Notification channel closed by server: {}", url);
                break;
            }
            Ok(Inbound::Other) => {}
            Err(e) => {
                warn!("Notification channel {} errored: {}", url, e);
                state.set(conn_id, ConnectionState::Erroring);
                break;
            }
        }
    }

    state.set(conn_id, ConnectionState::Closed);
    debug!("Notification channel task for {} finished", url);
}
