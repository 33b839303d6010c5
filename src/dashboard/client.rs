use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::middleware::MANAGER_OVERRIDE_HEADER;
use crate::model::{Decision, RequestView};

/// Shown whenever the server gave no usable reason.
pub const UPDATE_FAILED: &str = "Unable to update request status.";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server refused and said why.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response (status {0})")]
    Unexpected(u16),
}

impl ClientError {
    /// Text to show the person who clicked.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Rejected { message, .. } => message.clone(),
            _ => UPDATE_FAILED.to_string(),
        }
    }
}

/// Server calls the dashboard makes.
#[async_trait]
pub trait RequestsApi: Send + Sync {
    async fn update_status(&self, id: &str, decision: Decision) -> Result<RequestView, ClientError>;
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    ok: bool,
    request: Option<RequestView>,
    error: Option<String>,
}

/// `reqwest` client for the time-off API.
pub struct HttpRequestsApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    manager_override: bool,
}

impl HttpRequestsApi {
    /// `base_url` includes the API prefix, e.g. `http://localhost:8080/api`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            manager_override: false,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Ask the server to treat this caller as a manager. Only honoured for
    /// allow-listed users.
    pub fn with_manager_override(mut self) -> Self {
        self.manager_override = true;
        self
    }
}

#[async_trait]
impl RequestsApi for HttpRequestsApi {
    async fn update_status(&self, id: &str, decision: Decision) -> Result<RequestView, ClientError> {
        let url = format!("{}/requests/{}", self.base_url, id);
        let mut request = self
            .client
            .patch(&url)
            .json(&json!({ "status": decision.to_string() }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if self.manager_override {
            request = request.header(MANAGER_OVERRIDE_HEADER, "1");
        }

        let response = request.send().await?;
        let status = response.status();
        let envelope = match response.json::<Envelope>().await {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, %status, "Unreadable status update response");
                return Err(ClientError::Unexpected(status.as_u16()));
            }
        };
        debug!(%status, ok = envelope.ok, "Status update answered");
        interpret(status, envelope)
    }
}

fn interpret(status: StatusCode, envelope: Envelope) -> Result<RequestView, ClientError> {
    match envelope {
        Envelope {
            ok: true,
            request: Some(view),
            ..
        } if status.is_success() => Ok(view),
        Envelope {
            error: Some(message),
            ..
        } if !message.trim().is_empty() => Err(ClientError::Rejected {
            status: status.as_u16(),
            message,
        }),
        _ => Err(ClientError::Unexpected(status.as_u16())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(value: serde_json::Value) -> Envelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn base_url_loses_its_trailing_slash() {
        let api = HttpRequestsApi::new("http://localhost:8080/api/")
            .unwrap()
            .with_token("session")
            .with_manager_override();
        assert_eq!(api.base_url, "http://localhost:8080/api");
        assert_eq!(api.token.as_deref(), Some("session"));
        assert!(api.manager_override);
    }

    #[test]
    fn server_reasons_are_kept_verbatim() {
        let err = interpret(
            StatusCode::FORBIDDEN,
            envelope(json!({"ok": false, "error": "You do not have permission to modify this request."})),
        )
        .unwrap_err();
        assert_eq!(
            err.user_message(),
            "You do not have permission to modify this request."
        );
    }

    #[test]
    fn anything_else_collapses_to_the_fallback() {
        let err = interpret(StatusCode::BAD_GATEWAY, envelope(json!({}))).unwrap_err();
        assert_eq!(err.user_message(), UPDATE_FAILED);

        // ok without a request body is not a success
        let err = interpret(StatusCode::OK, envelope(json!({"ok": true}))).unwrap_err();
        assert_eq!(err.user_message(), UPDATE_FAILED);
    }
}
