// klip-client/src/http.rs
// Request client - panel REST API with session token injection

use crate::error::DEFAULT_FAILURE_MESSAGE;
use crate::session::{Session, TokenStore};
use crate::{ClientConfig, ClientError, ClientResult};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;

/// Envelope as received; `data` may be absent on failures
#[derive(serde::Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    msg: String,
}

/// Side effects of failed requests, for whoever shows them to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A request failed; carries the user-facing message
    Notice(String),
    /// The server rejected the token; the session has been cleared
    Expired,
}

/// HTTP client for the panel REST API
///
/// Cheap to clone; clones share the session token and the event channel.
#[derive(Debug, Clone)]
pub struct RequestClient {
    client: Client,
    base_url: String,
    session: Session,
    success_code: i64,
    events: broadcast::Sender<SessionEvent>,
}

impl RequestClient {
    /// Create a new request client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let session = match &config.token_file {
            Some(path) => Session::with_store(TokenStore::new(path)),
            None => Session::new(),
        };
        if let Some(token) = &config.token {
            session.set_token(token.clone());
        }
        Self::with_session(config, session)
    }

    /// Create a request client around an existing session
    pub fn with_session(config: &ClientConfig, session: Session) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;
        let (events, _) = broadcast::channel(64);

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
            success_code: config.success_code,
            events,
        })
    }

    /// Base URL requests are issued against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Subscribe to failure side effects
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.session.set_token(token);
    }

    pub fn token(&self) -> Option<String> {
        self.session.token()
    }

    pub fn clear_token(&self) {
        self.session.clear();
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.execute(self.client.get(self.url(path))).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.execute(self.client.post(self.url(path)).json(body)).await
    }

    /// Make a POST request without body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.execute(self.client.post(self.url(path))).await
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.execute(self.client.put(self.url(path)).json(body)).await
    }

    /// Make a DELETE request
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.execute(self.client.delete(self.url(path))).await
    }

    /// Make a DELETE request with JSON body
    pub async fn delete_with_body<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.execute(self.client.delete(self.url(path)).json(body)).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let result = self.send(request).await;
        if let Err(e) = &result {
            self.report(e);
        }
        result
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        tracing::debug!(url = %response.url(), status = status.as_u16(), "Panel API response");

        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::AuthExpired);
        }
        if !status.is_success() {
            return Err(ClientError::http_status(status));
        }

        let text = response.text().await?;
        let envelope: Envelope = serde_json::from_str(&text)?;
        if envelope.code != self.success_code {
            let message = if envelope.msg.is_empty() {
                DEFAULT_FAILURE_MESSAGE.to_string()
            } else {
                envelope.msg
            };
            return Err(ClientError::Logical {
                code: envelope.code,
                message,
            });
        }

        Ok(serde_json::from_value(envelope.data)?)
    }

    fn report(&self, error: &ClientError) {
        let event = match error {
            ClientError::AuthExpired => {
                self.session.clear();
                tracing::warn!("Session expired, token cleared");
                SessionEvent::Expired
            }
            other => {
                tracing::warn!(error = %other, "Panel API request failed");
                SessionEvent::Notice(other.to_string())
            }
        };
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
