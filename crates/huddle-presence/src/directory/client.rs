//! REST directory client backed by reqwest.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use huddle_core::config::directory::DirectoryConfig;
use huddle_core::error::{AppError, ErrorKind};
use huddle_core::result::AppResult;
use huddle_core::traits::directory::DirectoryClient;
use huddle_core::types::friend::{PendingFriends, UserProfile};
use huddle_core::types::id::UserId;

/// HTTP implementation of the directory contract.
pub struct RestDirectoryClient {
    http: reqwest::Client,
    base_url: String,
}

impl RestDirectoryClient {
    /// Build a client against the configured base URL.
    pub fn new(config: &DirectoryConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    "failed to build directory HTTP client",
                    e,
                )
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// `POST /users/bulk-status` response body.
#[derive(Debug, Deserialize)]
struct BulkStatusResponse {
    #[serde(default)]
    statuses: HashMap<UserId, String>,
}

#[async_trait]
impl DirectoryClient for RestDirectoryClient {
    async fn pending_friends(&self) -> AppResult<PendingFriends> {
        let response = self
            .http
            .get(self.url("/friends/pending"))
            .send()
            .await
            .map_err(http_error)?
            .error_for_status()
            .map_err(http_error)?;
        response.json().await.map_err(http_error)
    }

    async fn bulk_status(&self, user_ids: &[UserId]) -> AppResult<HashMap<UserId, String>> {
        let body = serde_json::json!({ "user_ids": user_ids });
        let response = self
            .http
            .post(self.url("/users/bulk-status"))
            .json(&body)
            .send()
            .await
            .map_err(http_error)?
            .error_for_status()
            .map_err(http_error)?;
        let parsed: BulkStatusResponse = response.json().await.map_err(http_error)?;
        Ok(parsed.statuses)
    }

    async fn profile(&self, user_id: &UserId) -> AppResult<UserProfile> {
        let response = self
            .http
            .get(self.url(&format!("/users/{user_id}/profile")))
            .send()
            .await
            .map_err(http_error)?
            .error_for_status()
            .map_err(http_error)?;
        response.json().await.map_err(http_error)
    }
}

fn http_error(err: reqwest::Error) -> AppError {
    AppError::with_source(
        ErrorKind::ExternalService,
        format!("directory request failed: {err}"),
        err,
    )
}
