use klip_client::{AuthApi, RequestClient, SessionEvent};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Logged-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub token: String,
}

/// Login state on top of the request client's session
pub struct AuthStore {
    api: AuthApi,
    user: RwLock<Option<User>>,
}

impl AuthStore {
    pub fn new(client: RequestClient) -> Self {
        Self {
            api: AuthApi::new(client),
            user: RwLock::new(None),
        }
    }

    fn client(&self) -> &RequestClient {
        self.api.client()
    }

    /// Log in and keep the token; `false` on any failure
    pub async fn login(&self, username: &str, password: &str) -> bool {
        match self.api.login(username, password).await {
            Ok(response) => {
                self.client().set_token(response.token.clone());
                self.set_user(Some(User {
                    username: username.to_string(),
                    token: response.token,
                }));
                tracing::info!(username = %username, "Logged in");
                true
            }
            Err(e) => {
                tracing::error!(username = %username, "Login failed: {}", e);
                false
            }
        }
    }

    pub fn logout(&self) {
        self.client().clear_token();
        self.set_user(None);
        tracing::info!("Logged out");
    }

    /// A token is held, restored ones included
    pub fn is_authenticated(&self) -> bool {
        self.client().token().is_some()
    }

    pub fn user(&self) -> Option<User> {
        self.user.read().map(|u| u.clone()).unwrap_or_default()
    }

    fn set_user(&self, user: Option<User>) {
        if let Ok(mut guard) = self.user.write() {
            *guard = user;
        }
    }

    pub fn handle_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Expired => {
                tracing::warn!("Session expired, logging out");
                self.logout();
            }
            SessionEvent::Notice(message) => {
                tracing::warn!("{}", message);
            }
        }
    }

    /// Feed the client's session events into [`AuthStore::handle_event`]
    pub fn spawn_event_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        let mut events = self.client().subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => store.handle_event(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Session events lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use klip_client::ClientConfig;

    fn store() -> AuthStore {
        let client = ClientConfig::new("http://127.0.0.1:9")
            .build_request_client()
            .unwrap();
        AuthStore::new(client)
    }

    #[test]
    fn test_expired_event_logs_out() {
        let store = store();
        store.client().set_token("t");
        store.set_user(Some(User {
            username: "alice".into(),
            token: "t".into(),
        }));
        assert!(store.is_authenticated());

        store.handle_event(&SessionEvent::Notice("Request failed".into()));
        assert!(store.is_authenticated());

        store.handle_event(&SessionEvent::Expired);
        assert!(!store.is_authenticated());
        assert!(store.user().is_none());
    }
}
