//! HTTP client for the Jotter REST API.

use std::fmt;
use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Note, NoteDraft, NoteId, UserId};
use crate::util::normalize_base_url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid client configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Not signed in")]
    NotAuthenticated,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message} ({status})")]
    Api { status: u16, message: String },
}

impl ClientError {
    /// HTTP status for API errors
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404))
    }

    /// 401 or 403: the stored token is missing, expired or was rejected
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Clone)]
pub struct NotesApiClient {
    base_url: String,
    client: reqwest::Client,
    token: Option<String>,
}

impl fmt::Debug for NotesApiClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("NotesApiClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterResponse {
    user_id: UserId,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
struct MessageResponse {
    message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl NotesApiClient {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let base_url = normalize_base_url(base_url).ok_or_else(|| {
            ClientError::InvalidConfiguration(
                "API URL must include http:// or https://".to_string(),
            )
        })?;
        Ok(Self {
            base_url,
            client: reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            token: None,
        })
    }

    /// Attach a bearer token for the `/notes` routes
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn register(&self, email: &str, password: &str) -> ClientResult<UserId> {
        let request = self
            .client
            .post(self.url("/auth/register"))
            .json(&CredentialsBody { email, password });
        let payload: RegisterResponse = send_json(request).await?;
        Ok(payload.user_id)
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<String> {
        let request = self
            .client
            .post(self.url("/auth/login"))
            .json(&CredentialsBody { email, password });
        let payload: LoginResponse = send_json(request).await?;
        Ok(payload.token)
    }

    pub async fn list_notes(&self) -> ClientResult<Vec<Note>> {
        let request = self.authorized(self.client.get(self.url("/notes")))?;
        send_json(request).await
    }

    pub async fn get_note(&self, id: NoteId) -> ClientResult<Note> {
        let request = self.authorized(self.client.get(self.url(&format!("/notes/{id}"))))?;
        send_json(request).await
    }

    pub async fn create_note(&self, draft: &NoteDraft) -> ClientResult<Note> {
        let request = self.authorized(self.client.post(self.url("/notes")).json(draft))?;
        send_json(request).await
    }

    pub async fn update_note(&self, id: NoteId, draft: &NoteDraft) -> ClientResult<Note> {
        let request = self.authorized(
            self.client
                .put(self.url(&format!("/notes/{id}")))
                .json(draft),
        )?;
        send_json(request).await
    }

    pub async fn delete_note(&self, id: NoteId) -> ClientResult<String> {
        let request = self.authorized(self.client.delete(self.url(&format!("/notes/{id}"))))?;
        let payload: MessageResponse = send_json(request).await?;
        Ok(payload.message)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> ClientResult<RequestBuilder> {
        let token = self.token.as_deref().ok_or(ClientError::NotAuthenticated)?;
        Ok(request.bearer_auth(token))
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<T> {
    let response = request.header("Accept", "application/json").send().await?;
    Ok(check_status(response).await?.json::<T>().await?)
}

async fn check_status(response: Response) -> ClientResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Api {
        status: status.as_u16(),
        message: parse_api_error(status, &body),
    })
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = payload.error.or(payload.message) {
            return message.trim().to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string)
    } else {
        trimmed.chars().take(180).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_urls_without_scheme() {
        let err = NotesApiClient::new("localhost:3000").unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn new_trims_trailing_slash() {
        let client = NotesApiClient::new("http://localhost:3000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.url("/notes"), "http://localhost:3000/notes");
    }

    #[test]
    fn debug_redacts_token() {
        let client = NotesApiClient::new("http://localhost:3000")
            .unwrap()
            .with_token("very-secret");
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn notes_routes_require_token() {
        let client = NotesApiClient::new("http://localhost:3000").unwrap();
        let err = client
            .authorized(client.client.get(client.url("/notes")))
            .unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
    }

    #[test]
    fn parse_api_error_prefers_error_field() {
        let message = parse_api_error(StatusCode::NOT_FOUND, r#"{"error":"Note not found"}"#);
        assert_eq!(message, "Note not found");

        let message = parse_api_error(StatusCode::FORBIDDEN, "");
        assert_eq!(message, "Forbidden");
    }

    #[test]
    fn error_status_helpers() {
        let err = ClientError::Api {
            status: 404,
            message: "Note not found".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_auth_failure());
        assert_eq!(err.to_string(), "Note not found (404)");
    }
}
