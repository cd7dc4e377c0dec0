//! Client for the hosted identity and storage backend.
//!
//! The backend speaks a Supabase-style REST API: `/auth/v1/*` for accounts
//! and sessions, `/storage/v1/*` for objects. A [`BackendClient`] is built once
//! at startup and handed to whatever needs it; there is no global instance.

pub mod auth;
pub mod storage;

use reqwest::{Client, RequestBuilder, Response, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with an error; `message` is its own wording.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl BackendError {
    /// Message suitable for showing to the user as-is.
    pub fn message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Rejected { status, .. } if (400..500).contains(status))
    }
}

/// Error bodies differ between the auth and storage APIs; take whichever
/// human-readable field is present.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<serde_json::Value>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or_else(|| match self.error {
                Some(serde_json::Value::String(s)) => Some(s),
                _ => None,
            })
            .filter(|m| !m.trim().is_empty())
    }
}

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
    anon_key: SecretString,
}

impl BackendClient {
    pub fn new(http: Client, base_url: Url, anon_key: SecretString) -> Self {
        Self {
            http,
            base_url,
            anon_key,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::InvalidUrl(e.to_string()))
    }

    /// Request carrying the project key; `bearer` defaults to the anon key.
    pub(crate) fn request(
        &self,
        method: reqwest::Method,
        url: Url,
        bearer: Option<&SecretString>,
    ) -> RequestBuilder {
        let bearer = bearer.unwrap_or(&self.anon_key);
        self.http
            .request(method, url)
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(bearer.expose_secret())
    }
}

/// Turn a non-success response into [`BackendError::Rejected`].
pub(crate) async fn check(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Backend request failed")
                .to_string()
        });

    tracing::debug!(status = status.as_u16(), %message, "backend rejected request");
    Err(BackendError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_of(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(ErrorBody::into_message)
    }

    #[test]
    fn picks_storage_message() {
        let body = r#"{"statusCode":"403","error":"Unauthorized","message":"new row violates row-level security policy"}"#;
        assert_eq!(
            message_of(body).as_deref(),
            Some("new row violates row-level security policy")
        );
    }

    #[test]
    fn picks_auth_error_description() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(message_of(body).as_deref(), Some("Invalid login credentials"));
    }

    #[test]
    fn falls_back_to_error_string() {
        assert_eq!(message_of(r#"{"error":"nope"}"#).as_deref(), Some("nope"));
        assert_eq!(message_of(r#"{"error":{"code":1}}"#), None);
    }

    #[test]
    fn rejected_message_is_verbatim() {
        let err = BackendError::Rejected {
            status: 400,
            message: "User already registered".to_string(),
        };
        assert_eq!(err.message(), "User already registered");
        assert!(err.is_client_error());
    }
}
