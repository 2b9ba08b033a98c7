// klip-client/src/session.rs
// Session token - one opaque string, optionally persisted to a file

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Token file storage
///
/// Holds nothing but the raw token string.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Make sure the parent directory exists
    pub fn ensure_dir(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    pub fn save(&self, token: &str) -> std::io::Result<()> {
        self.ensure_dir()?;
        fs::write(&self.path, token)
    }

    /// Load the token, `None` when missing or blank
    pub fn load(&self) -> Option<String> {
        let token = fs::read_to_string(&self.path).ok()?;
        let token = token.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn delete(&self) -> std::io::Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Session token shared by a request client and its clones
///
/// No expiry and no refresh: the token lives until `clear` or until the
/// server rejects it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
    store: Option<TokenStore>,
}

impl Session {
    /// In-memory session without a token
    pub fn new() -> Self {
        Self::default()
    }

    /// Session backed by a token file, seeded with whatever the file holds
    pub fn with_store(store: TokenStore) -> Self {
        let token = store.load();
        if token.is_some() {
            tracing::debug!(path = %store.path().display(), "Restored session token");
        }
        Self {
            token: Arc::new(RwLock::new(token)),
            store: Some(store),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().map(|t| t.is_some()).unwrap_or(false)
    }

    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        if let Some(store) = &self.store
            && let Err(e) = store.save(&token)
        {
            tracing::warn!("Failed to persist session token: {}", e);
        }
        if let Ok(mut guard) = self.token.write() {
            *guard = Some(token);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.token.write() {
            *guard = None;
        }
        if let Some(store) = &self.store
            && let Err(e) = store.delete()
        {
            tracing::warn!("Failed to remove session token file: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_token_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = TokenStore::new(temp_dir.path().join("nested").join("token"));

        assert!(store.load().is_none());
        store.save("abc").unwrap();
        assert!(store.exists());
        assert_eq!(store.load().as_deref(), Some("abc"));

        store.delete().unwrap();
        assert!(!store.exists());
        // deleting twice is fine
        store.delete().unwrap();
    }

    #[test]
    fn test_session_clones_share_token() {
        let session = Session::new();
        let other = session.clone();
        assert!(!other.is_authenticated());

        session.set_token("t");
        assert_eq!(other.token().as_deref(), Some("t"));

        other.clear();
        assert!(session.token().is_none());
    }

    #[test]
    fn test_session_persists_through_store() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("token");

        let session = Session::with_store(TokenStore::new(&path));
        session.set_token("persisted");

        let restored = Session::with_store(TokenStore::new(&path));
        assert_eq!(restored.token().as_deref(), Some("persisted"));

        restored.clear();
        assert!(!path.exists());
        assert!(Session::with_store(TokenStore::new(&path)).token().is_none());
    }
}
