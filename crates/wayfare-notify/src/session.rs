use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use wayfare_types::api::UserProfile;

use crate::api::{HttpApi, NotificationApi};
use crate::auth::{TokenCell, TokenSource};
use crate::channel::{Connector, LiveChannel, WsConnector};
use crate::config::{Config, DuplicatePolicy};
use crate::error::ApiError;
use crate::store::NotificationStore;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    SignedOut,
    SignedIn(UserProfile),
}

struct Resolved {
    token: String,
    profile: UserProfile,
}

/// Page bootstrap for the notification center: resolves who is signed in,
/// pulls the list once and opens the push channel for that identity.
///
/// [`start`](Self::start) is safe to call repeatedly; the profile is fetched
/// once per token and the channel is only reopened when the identity changes
/// or the previous connection has ended.
pub struct Session {
    api: Arc<dyn NotificationApi>,
    tokens: TokenCell,
    store: NotificationStore,
    channel: LiveChannel,
    resolved: Mutex<Option<Resolved>>,
}

impl Session {
    pub fn new(config: &Config, tokens: TokenCell) -> Result<Self, ApiError> {
        let api = Arc::new(HttpApi::from_config(config)?);
        Ok(Self::with_parts(
            api,
            Arc::new(WsConnector),
            tokens,
            &config.ws_base,
            config.duplicate_policy,
        ))
    }

    pub fn with_parts(
        api: Arc<dyn NotificationApi>,
        connector: Arc<dyn Connector>,
        tokens: TokenCell,
        ws_base: &str,
        policy: DuplicatePolicy,
    ) -> Self {
        let store = NotificationStore::new(api.clone(), Arc::new(tokens.clone()), policy);
        let channel = LiveChannel::new(connector, store.clone(), ws_base);
        Self {
            api,
            tokens,
            store,
            channel,
            resolved: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    pub fn channel(&self) -> &LiveChannel {
        &self.channel
    }

    pub fn tokens(&self) -> &TokenCell {
        &self.tokens
    }

    pub async fn start(&self) -> SessionStatus {
        let mut resolved = self.resolved.lock().await;

        let Some(token) = self.tokens.token() else {
            info!("No access token, notification center signed out");
            *resolved = None;
            self.reset();
            return SessionStatus::SignedOut;
        };

        let cached = resolved
            .as_ref()
            .filter(|r| r.token == token)
            .map(|r| r.profile.clone());

        let profile = match cached {
            Some(profile) => profile,
            None => match self.api.profile(&token).await {
                Ok(profile) if profile.is_complete() => {
                    info!("Signed in as {} ({})", profile.display_name(), profile.id);
                    profile
                }
                Ok(profile) => {
                    info!("Profile {} has no nickname, discarding token", profile.id);
                    self.tokens.clear();
                    *resolved = None;
                    self.reset();
                    return SessionStatus::SignedOut;
                }
                Err(e) => {
                    warn!("Failed to resolve profile: {}", e);
                    *resolved = None;
                    self.reset();
                    return SessionStatus::SignedOut;
                }
            },
        };

        // Another identity's socket must not feed this one's list.
        let same_identity = resolved.as_ref().map(|r| r.profile.id) == Some(profile.id);
        if !same_identity {
            self.reset();
        }

        self.store.refresh().await;

        let connected = self.channel.user_id() == Some(profile.id) && self.channel.state().is_live();
        if !connected {
            self.channel.open(profile.id);
        }

        *resolved = Some(Resolved {
            token,
            profile: profile.clone(),
        });
        SessionStatus::SignedIn(profile)
    }

    /// Forget the token and everything derived from it.
    pub async fn sign_out(&self) {
        let mut resolved = self.resolved.lock().await;
        self.tokens.clear();
        *resolved = None;
        self.reset();
        info!("Signed out");
    }

    /// Close the push channel, as on page unload. Store contents are kept.
    pub fn shutdown(&self) {
        self.channel.close();
    }

    fn reset(&self) {
        self.channel.close();
        self.store.clear();
    }
}
