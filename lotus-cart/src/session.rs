//! Persisted authenticated session
//!
//! The storefront keeps the customer's token and profile in a JSON
//! file so a restart resumes in authenticated mode. The cart engine
//! only reads this state; writing it is the login flow's job.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use shared::models::CustomerProfile;
use shared::util::now_secs;

use crate::error::CartResult;

const SESSION_FILE: &str = "session.json";

/// Token plus the profile it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub customer: CustomerProfile,
    /// Unix seconds from the token's exp claim, when present
    pub expires_at: Option<u64>,
}

impl AuthSession {
    pub fn new(token: String, customer: CustomerProfile) -> Self {
        let expires_at = parse_jwt_exp(&token);
        Self {
            token,
            customer,
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(exp) => now_secs() >= exp,
            None => false,
        }
    }
}

/// Pull `exp` out of a JWT payload without verifying the signature.
/// Expiry enforcement belongs to the backend; this only avoids
/// opening the app with a token that is already dead.
fn parse_jwt_exp(token: &str) -> Option<u64> {
    let payload = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Value = serde_json::from_slice(&decoded).ok()?;
    claims.get("exp")?.as_u64()
}

/// File-backed session storage.
#[derive(Debug, Clone)]
pub struct SessionStore {
    file_path: PathBuf,
}

impl SessionStore {
    /// `root` is the app's data directory; the session lives at
    /// `root/auth/session.json`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            file_path: root.as_ref().join("auth").join(SESSION_FILE),
        }
    }

    /// Read the persisted session, dropping it when expired.
    pub fn load(&self) -> Option<AuthSession> {
        if !self.file_path.exists() {
            return None;
        }

        let content = match fs::read_to_string(&self.file_path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("failed to read session file: {}", err);
                return None;
            }
        };

        let session: AuthSession = match serde_json::from_str(&content) {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!("failed to parse session file: {}", err);
                return None;
            }
        };

        if session.is_expired() {
            tracing::info!("persisted session is expired, ignoring");
            return None;
        }

        Some(session)
    }

    pub fn token(&self) -> Option<String> {
        self.load().map(|session| session.token)
    }

    pub fn is_authenticated(&self) -> bool {
        self.load().is_some()
    }

    pub fn save(&self, session: &AuthSession) -> CartResult<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        fs::write(&self.file_path, content)?;
        tracing::debug!("session saved for customer {}", session.customer.id);
        Ok(())
    }

    pub fn clear(&self) -> CartResult<()> {
        if self.file_path.exists() {
            fs::remove_file(&self.file_path)?;
            tracing::debug!("session file removed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> CustomerProfile {
        CustomerProfile {
            id: "cus-1".to_string(),
            full_name: "Trần Thị Mai".to_string(),
            email: Some("mai@example.com".to_string()),
            phone: Some("0912345678".to_string()),
        }
    }

    fn jwt_with_exp(exp: u64) -> String {
        let header = URL_SAFE_NO_PAD.encode(b"{\"alg\":\"HS256\"}");
        let payload = URL_SAFE_NO_PAD.encode(format!("{{\"exp\":{exp}}}").as_bytes());
        format!("{header}.{payload}.sig")
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        let token = jwt_with_exp(now_secs() + 3600);
        store
            .save(&AuthSession::new(token.clone(), profile()))
            .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.token, token);
        assert_eq!(loaded.customer.id, "cus-1");
        assert!(store.is_authenticated());
    }

    #[test]
    fn expired_session_is_dropped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        let token = jwt_with_exp(now_secs() - 10);
        store.save(&AuthSession::new(token, profile())).unwrap();

        assert!(store.load().is_none());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn opaque_token_never_expires_locally() {
        let session = AuthSession::new("not-a-jwt".to_string(), profile());
        assert_eq!(session.expires_at, None);
        assert!(!session.is_expired());
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert!(store.load().is_none());
    }

    #[test]
    fn corrupt_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        fs::create_dir_all(dir.path().join("auth")).unwrap();
        fs::write(dir.path().join("auth").join(SESSION_FILE), "{nope").unwrap();

        assert!(store.load().is_none());
    }

    #[test]
    fn clear_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        let token = jwt_with_exp(now_secs() + 3600);
        store.save(&AuthSession::new(token, profile())).unwrap();
        store.clear().unwrap();

        assert!(store.load().is_none());
        // clearing twice is fine
        store.clear().unwrap();
    }
}
