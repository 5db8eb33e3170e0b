//! In-memory fakes shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use reqwest::{Method, StatusCode};
use tokio::sync::{mpsc, oneshot};

use wayfare_types::api::UserProfile;
use wayfare_types::{NotificationId, NotificationItem};

use crate::api::NotificationApi;
use crate::channel::{Connector, Inbound, InboundStream};
use crate::error::{ApiError, ChannelError};

pub enum ListReply {
    Items(Vec<NotificationItem>),
    Fail(StatusCode),
    /// Resolves when the test sends the items, so the test controls ordering.
    Gated(oneshot::Receiver<Vec<NotificationItem>>),
}

#[derive(Default)]
pub struct FakeApi {
    pub lists: Mutex<VecDeque<ListReply>>,
    pub delete_failure: Mutex<Option<StatusCode>>,
    pub profile: Mutex<Option<UserProfile>>,
    pub deleted: Mutex<Vec<NotificationId>>,
    pub delete_all_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
}

impl FakeApi {
    pub fn with_lists(replies: Vec<ListReply>) -> Self {
        Self {
            lists: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    pub fn push_list(&self, reply: ListReply) {
        self.lists.lock().unwrap().push_back(reply);
    }

    pub fn fail_deletes(&self, status: StatusCode) {
        *self.delete_failure.lock().unwrap() = Some(status);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn status_error(method: Method, path: String, status: StatusCode) -> ApiError {
        ApiError::Status {
            method,
            path,
            status,
        }
    }
}

#[async_trait]
impl NotificationApi for FakeApi {
    async fn list(&self, _token: &str) -> Result<Vec<NotificationItem>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.lists.lock().unwrap().pop_front();
        match reply {
            Some(ListReply::Items(items)) => Ok(items),
            Some(ListReply::Fail(status)) => Err(Self::status_error(
                Method::GET,
                "/notifications/".into(),
                status,
            )),
            Some(ListReply::Gated(rx)) => Ok(rx.await.unwrap_or_default()),
            None => Ok(Vec::new()),
        }
    }

    async fn delete(&self, _token: &str, id: NotificationId) -> Result<(), ApiError> {
        if let Some(status) = *self.delete_failure.lock().unwrap() {
            return Err(Self::status_error(
                Method::DELETE,
                format!("/notifications/{id}"),
                status,
            ));
        }
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }

    async fn delete_all(&self, _token: &str) -> Result<(), ApiError> {
        self.delete_all_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = *self.delete_failure.lock().unwrap() {
            return Err(Self::status_error(
                Method::DELETE,
                "/notifications/".into(),
                status,
            ));
        }
        Ok(())
    }

    async fn profile(&self, _token: &str) -> Result<UserProfile, ApiError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.profile.lock().unwrap().clone().ok_or_else(|| {
            Self::status_error(Method::GET, "/user/profile".into(), StatusCode::UNAUTHORIZED)
        })
    }
}

pub fn item(id: NotificationId, kind: &str, is_read: Option<bool>) -> NotificationItem {
    NotificationItem {
        is_read,
        ..NotificationItem::new(id, kind, format!("notification {id}"))
    }
}

pub type FrameTx = mpsc::UnboundedSender<Result<Inbound, ChannelError>>;

/// Connector whose frames the test pushes through an mpsc sender.
#[derive(Default)]
pub struct FakeConnector {
    pub opened: Mutex<Vec<(String, FrameTx)>>,
    pub refuse: bool,
}

impl FakeConnector {
    pub fn urls(&self) -> Vec<String> {
        self.opened.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
    }

    pub fn sender(&self, index: usize) -> FrameTx {
        self.opened.lock().unwrap()[index].1.clone()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, url: &str) -> Result<InboundStream, ChannelError> {
        if self.refuse {
            return Err(ChannelError::Connect(
                tokio_tungstenite::tungstenite::Error::ConnectionClosed,
            ));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.opened.lock().unwrap().push((url.to_string(), tx));
        let frames = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|frame| (frame, rx))
        });
        Ok(frames.boxed())
    }
}
