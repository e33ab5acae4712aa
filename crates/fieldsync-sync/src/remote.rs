//! HTTP client for the hosted photo store.
//!
//! The remote store is at-least-once: every request carries the entry's
//! `local_id` as an idempotency key, so a retry of an upload the server
//! already accepted does not create a duplicate photo.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use tracing::debug;

use fieldsync_core::{Error, PhotoUpload, RemoteStore, Result};

/// Default request timeout for the HTTP client itself. The executor's
/// per-item timeout is the authoritative bound; this is a backstop.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Connection settings for the hosted photo store.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the photo API, e.g. `https://api.example.com/v1`.
    pub base_url: String,
    /// Bearer token attached to every request.
    pub api_token: Option<String>,
    /// HTTP client timeout.
    pub request_timeout: Duration,
}

impl RemoteConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Required | Description |
    /// |----------|----------|-------------|
    /// | `FIELDSYNC_REMOTE_URL` | yes | Base URL of the photo API |
    /// | `FIELDSYNC_API_TOKEN` | no | Bearer token |
    /// | `FIELDSYNC_REMOTE_TIMEOUT_SECS` | no | HTTP client timeout (default 300) |
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("FIELDSYNC_REMOTE_URL")
            .map_err(|_| Error::Config("FIELDSYNC_REMOTE_URL is not set".into()))?;

        let api_token = std::env::var("FIELDSYNC_API_TOKEN").ok();

        let request_timeout = std::env::var("FIELDSYNC_REMOTE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));

        Ok(Self {
            base_url,
            api_token,
            request_timeout,
        })
    }

    /// Create config for a known endpoint (tests, embedded setups).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }
}

/// [`RemoteStore`] implementation speaking multipart HTTP to the hosted
/// photo API.
pub struct HttpRemoteStore {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl HttpRemoteStore {
    /// Build the client for the given configuration.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn upload(&self, upload: &PhotoUpload) -> Result<()> {
        let url = format!(
            "{}/projects/{}/photos",
            self.config.base_url.trim_end_matches('/'),
            upload.project_id
        );

        let metadata = serde_json::to_string(&serde_json::json!({
            "local_id": upload.local_id,
            "org_id": upload.org_id,
            "user_id": upload.user_id,
            "filename": upload.filename,
            "caption": upload.caption,
            "category": upload.category,
            "taken_at": upload.taken_at,
            "location": upload.location,
            "phase_id": upload.phase_id,
            "album_id": upload.album_id,
            "task_id": upload.task_id,
        }))?;

        let form = Form::new()
            .text("metadata", metadata)
            .part(
                "photo",
                Part::bytes(upload.blob.clone())
                    .file_name(upload.filename.clone())
                    .mime_str("application/octet-stream")?,
            )
            .part(
                "thumbnail",
                Part::bytes(upload.thumbnail.clone())
                    .file_name(format!("thumb-{}", upload.filename))
                    .mime_str("image/jpeg")?,
            );

        let mut request = self
            .client
            .post(&url)
            .header("Idempotency-Key", upload.local_id.to_string())
            .multipart(form);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(format!("upload request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            debug!(
                subsystem = "sync",
                component = "remote",
                op = "upload",
                photo_id = %upload.local_id,
                status = status.as_u16(),
                "Remote store acknowledged upload"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, &body))
    }
}

/// Map a non-success HTTP status to the error taxonomy.
fn classify_status(status: StatusCode, body: &str) -> Error {
    let detail = if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::RemoteRejection(format!("authorization refused ({detail})"))
        }
        StatusCode::PAYLOAD_TOO_LARGE | StatusCode::INSUFFICIENT_STORAGE => {
            Error::RemoteRejection(format!("storage quota refused the upload ({detail})"))
        }
        s if s.is_client_error() => Error::RemoteRejection(detail),
        _ => Error::Network(format!("remote store unavailable ({detail})")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_authorization_statuses() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = classify_status(status, "");
            match err {
                Error::RemoteRejection(msg) => assert!(msg.contains("authorization")),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_classify_quota_statuses() {
        let err = classify_status(StatusCode::PAYLOAD_TOO_LARGE, "too big");
        match err {
            Error::RemoteRejection(msg) => {
                assert!(msg.contains("quota"));
                assert!(msg.contains("too big"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_classify_validation_rejection() {
        let err = classify_status(StatusCode::UNPROCESSABLE_ENTITY, "bad category");
        assert!(matches!(err, Error::RemoteRejection(_)));
    }

    #[test]
    fn test_classify_server_errors_are_network() {
        let err = classify_status(StatusCode::BAD_GATEWAY, "");
        assert!(matches!(err, Error::Network(_)));
    }

    #[test]
    fn test_remote_config_builder() {
        let config = RemoteConfig::new("https://api.example.com/v1/").with_token("abc");
        assert_eq!(config.base_url, "https://api.example.com/v1/");
        assert_eq!(config.api_token.as_deref(), Some("abc"));
        assert_eq!(
            config.request_timeout,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
    }
}
