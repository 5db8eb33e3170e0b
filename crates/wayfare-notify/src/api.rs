use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use wayfare_types::api::UserProfile;
use wayfare_types::{NotificationId, NotificationItem};

use crate::config::Config;
use crate::error::ApiError;

/// REST calls the notification center depends on. Every call is
/// authenticated with the caller's bearer token.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// `GET /notifications/`
    async fn list(&self, token: &str) -> Result<Vec<NotificationItem>, ApiError>;

    /// `DELETE /notifications/{id}`
    async fn delete(&self, token: &str, id: NotificationId) -> Result<(), ApiError>;

    /// `DELETE /notifications/`
    async fn delete_all(&self, token: &str) -> Result<(), ApiError>;

    /// `GET /user/profile`
    async fn profile(&self, token: &str) -> Result<UserProfile, ApiError>;
}

/// [`NotificationApi`] over HTTP with `reqwest`.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base: String,
}

impl HttpApi {
    pub fn new(base: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base: base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(&config.api_base, config.request_timeout)
    }

    async fn send(&self, method: Method, path: &str, token: &str) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base, path);
        debug!("{} {}", method, url);

        let res = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(token)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                method,
                path: path.to_string(),
                status,
            });
        }
        Ok(res)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, ApiError> {
        let body = self.send(Method::GET, path, token).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl NotificationApi for HttpApi {
    async fn list(&self, token: &str) -> Result<Vec<NotificationItem>, ApiError> {
        self.get_json("/notifications/", token).await
    }

    async fn delete(&self, token: &str, id: NotificationId) -> Result<(), ApiError> {
        self.send(Method::DELETE, &format!("/notifications/{id}"), token)
            .await
            .map(drop)
    }

    async fn delete_all(&self, token: &str) -> Result<(), ApiError> {
        self.send(Method::DELETE, "/notifications/", token)
            .await
            .map(drop)
    }

    async fn profile(&self, token: &str) -> Result<UserProfile, ApiError> {
        self.get_json("/user/profile", token).await
    }
}
