//! REST client for the NutriEyeQ backend
//!
//! Holds the session explicitly and refreshes expired access tokens through a
//! single interceptor step: one refresh, one retry, never more. Concurrent
//! 401s share a single refresh.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Session expired. Please login again.")]
    SessionExpired,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Authenticated user session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user_email: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Store tokens issued by `/auth/refresh`
    pub fn apply_refresh(&mut self, tokens: TokenPair) {
        self.access_token = Some(tokens.access_token);
        if let Some(refresh) = tokens.refresh_token {
            self.refresh_token = Some(refresh);
        }
    }

    pub fn clear(&mut self) {
        *self = Session::default();
    }
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Token pair returned by `/auth/refresh`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Error body of the backend (`{"detail": "..."}`)
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Pull a readable message out of an error response body
pub(crate) fn error_message(body: &str, status: StatusCode) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { detail: serde_json::Value::String(s) }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    }
}

/// HTTP client bound to one API base URL and one session
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<RwLock<Session>>,
    refresh_lock: Arc<Mutex<()>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Session) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            session: Arc::new(RwLock::new(session)),
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn access_token(&self) -> Option<String> {
        self.session.read().await.access_token.clone()
    }

    async fn dispatch<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        token: Option<&str>,
    ) -> ApiResult<reqwest::Response> {
        let mut request = self.http.request(method.clone(), self.url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!("{} {}", method, path);
        Ok(request.send().await?)
    }

    /// Exchange the refresh token for a new token pair. Clears the session
    /// and reports `SessionExpired` when that is not possible.
    ///
    /// `rejected` is the access token the server just refused. Refreshes are
    /// serialized; if another caller already replaced that token, its result
    /// is reused instead of refreshing again.
    async fn refresh_session(&self, rejected: &str) -> ApiResult<()> {
        let _guard = self.refresh_lock.lock().await;

        let refresh_token = {
            let session = self.session.read().await;
            match session.access_token.as_deref() {
                Some(current) if current != rejected => {
                    debug!("Access token already refreshed");
                    return Ok(());
                }
                _ => session.refresh_token.clone(),
            }
        };

        let outcome = match refresh_token {
            Some(token) => {
                let body = RefreshRequest { refresh_token: &token };
                match self.http.post(self.url("/auth/refresh")).json(&body).send().await {
                    Ok(resp) if resp.status().is_success() => resp.json::<TokenPair>().await.ok(),
                    Ok(resp) => {
                        warn!("Token refresh rejected with status {}", resp.status());
                        None
                    }
                    Err(e) => {
                        warn!("Token refresh failed: {}", e);
                        None
                    }
                }
            }
            None => None,
        };

        let mut session = self.session.write().await;
        match outcome {
            Some(tokens) => {
                session.apply_refresh(tokens);
                info!("Access token refreshed");
                Ok(())
            }
            None => {
                session.clear();
                Err(ApiError::SessionExpired)
            }
        }
    }

    /// Send a request, refreshing the session once on 401
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> ApiResult<String> {
        let token = self.access_token().await;
        let mut response = self
            .dispatch(method.clone(), path, query, body, token.as_deref())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if let Some(rejected) = token {
                self.refresh_session(&rejected).await?;
                let token = self.access_token().await;
                response = self.dispatch(method, path, query, body, token.as_deref()).await?;
            }
        }

        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            return Ok(text);
        }

        let message = error_message(&text, status);
        Err(match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => ApiError::Status { status: status.as_u16(), message },
        })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ApiResult<T> {
        let text = self.send::<()>(Method::GET, path, query, None).await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        let text = self.send(Method::POST, path, &[], Some(body)).await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let text = self.send::<()>(Method::DELETE, path, &[], None).await?;
        Ok(serde_json::from_str(&text)?)
    }
}
