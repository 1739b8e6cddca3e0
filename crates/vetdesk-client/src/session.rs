//! # Session Context
//!
//! Holds the bearer token and admin flag for the running console and
//! persists them to a small TOML file between runs.
//!
//! ## Login Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Session Flow                                  │
//! │                                                                         │
//! │  ┌────────────────┐     ┌─────────────────┐     ┌─────────────────┐    │
//! │  │  console       │     │  SessionStore   │     │  REST backend   │    │
//! │  └───────┬────────┘     └────────┬────────┘     └────────┬────────┘    │
//! │          │  login(user, pass)    │                       │             │
//! │          │──────────────────────►│  POST /api/login      │             │
//! │          │                       │──────────────────────►│             │
//! │          │                       │◄──────────────────────│             │
//! │          │                       │  { token }            │             │
//! │          │                       │                       │             │
//! │          │                       │  token + is_admin     │             │
//! │          │                       │  ──► session.toml     │             │
//! │          │                       │                       │             │
//! │          │  token()              │                       │             │
//! │          │──────────────────────►│  none? Unauthenticated│             │
//! │          │◄──────────────────────│                       │             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The backend login is admin-only, so a successful login always sets
//! `is_admin`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::AuthApi;
use crate::error::{ClientError, ClientResult};
use vetdesk_core::validation::validate_required;

/// What the session file holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default)]
    pub is_admin: bool,

    /// User name pre-filled on the login prompt. Survives logout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remembered_user: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Process-wide session context.
pub struct SessionStore {
    path: Option<PathBuf>,
    session: Arc<RwLock<Session>>,
}

impl SessionStore {
    /// A session that is never written to disk.
    pub fn in_memory() -> Self {
        SessionStore {
            path: None,
            session: Arc::new(RwLock::new(Session::default())),
        }
    }

    /// Opens the session file, starting logged out if it is missing or
    /// unreadable.
    pub fn open(path: Option<PathBuf>) -> Self {
        let session = path
            .as_ref()
            .filter(|p| p.exists())
            .and_then(|p| match std::fs::read_to_string(p) {
                Ok(contents) => toml::from_str::<Session>(&contents)
                    .map_err(|e| warn!(?p, "Ignoring unreadable session file: {}", e))
                    .ok(),
                Err(e) => {
                    warn!(?p, "Failed to read session file: {}", e);
                    None
                }
            })
            .unwrap_or_default();

        debug!(authenticated = session.is_authenticated(), "Session opened");
        SessionStore {
            path,
            session: Arc::new(RwLock::new(session)),
        }
    }

    /// The bearer token, or `Unauthenticated` when logged out.
    pub async fn token(&self) -> ClientResult<String> {
        self.session
            .read()
            .await
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(ClientError::Unauthenticated)
    }

    pub async fn current(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_authenticated()
    }

    pub async fn is_admin(&self) -> bool {
        let session = self.session.read().await;
        session.is_authenticated() && session.is_admin
    }

    pub async fn remembered_user(&self) -> Option<String> {
        self.session.read().await.remembered_user.clone()
    }

    /// Logs in against the backend and stores the token.
    ///
    /// `remember` keeps the user name for the next login prompt; without it
    /// any previously remembered name is forgotten.
    pub async fn login(
        &self,
        api: &dyn AuthApi,
        user: &str,
        pass: &str,
        remember: bool,
    ) -> ClientResult<()> {
        let user = validate_required("user", user)?;
        validate_required("pass", pass)?;

        let token = api.login(&user, pass).await?;

        {
            let mut session = self.session.write().await;
            session.token = Some(token);
            session.is_admin = true;
            session.remembered_user = remember.then(|| user.clone());
        }
        self.persist().await?;

        info!(user = %user, "Logged in");
        Ok(())
    }

    /// Drops the token and admin flag. The remembered user stays.
    pub async fn logout(&self) -> ClientResult<()> {
        {
            let mut session = self.session.write().await;
            session.token = None;
            session.is_admin = false;
        }
        self.persist().await?;
        info!("Logged out");
        Ok(())
    }

    async fn persist(&self) -> ClientResult<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        let contents = toml::to_string_pretty(&*self.session.read().await)
            .map_err(|e| ClientError::SessionStore(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ClientError::SessionStore(e.to_string()))?;
        }
        std::fs::write(path, contents).map_err(|e| ClientError::SessionStore(e.to_string()))?;
        debug!(?path, "Session saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeAuth {
        calls: AtomicUsize,
        reject: bool,
    }

    impl FakeAuth {
        fn new(reject: bool) -> Self {
            FakeAuth {
                calls: AtomicUsize::new(0),
                reject,
            }
        }
    }

    #[async_trait]
    impl AuthApi for FakeAuth {
        async fn login(&self, _user: &str, _pass: &str) -> ClientResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                Err(ClientError::Http {
                    status: 401,
                    message: Some("Credenciales inválidas".into()),
                })
            } else {
                Ok("tok-123".into())
            }
        }
    }

    fn temp_session_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("vetdesk-session-test-{}-{}", name, std::process::id()))
            .join("session.toml")
    }

    #[tokio::test]
    async fn test_logged_out_has_no_token() {
        let store = SessionStore::in_memory();
        assert!(matches!(store.token().await, Err(ClientError::Unauthenticated)));
        assert!(!store.is_admin().await);
    }

    #[tokio::test]
    async fn test_login_sets_token_and_admin() {
        let store = SessionStore::in_memory();
        let api = FakeAuth::new(false);
        store.login(&api, "admin", "secret", true).await.unwrap();

        assert_eq!(store.token().await.unwrap(), "tok-123");
        assert!(store.is_admin().await);
        assert_eq!(store.remembered_user().await, Some("admin".to_string()));

        store.logout().await.unwrap();
        assert!(!store.is_authenticated().await);
        assert_eq!(store.remembered_user().await, Some("admin".to_string()));
    }

    #[tokio::test]
    async fn test_blank_credentials_never_reach_backend() {
        let store = SessionStore::in_memory();
        let api = FakeAuth::new(false);
        let err = store.login(&api, "  ", "secret", false).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_session_empty() {
        let store = SessionStore::in_memory();
        let api = FakeAuth::new(true);
        let err = store.login(&api, "admin", "bad", false).await.unwrap_err();
        assert_eq!(err.user_message("Connection error"), "Credenciales inválidas");
        assert!(!store.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_session_survives_reopen() {
        let path = temp_session_path("reopen");
        let _ = std::fs::remove_file(&path);

        let store = SessionStore::open(Some(path.clone()));
        store
            .login(&FakeAuth::new(false), "admin", "secret", false)
            .await
            .unwrap();

        let reopened = SessionStore::open(Some(path.clone()));
        assert_eq!(reopened.token().await.unwrap(), "tok-123");
        assert!(reopened.is_admin().await);
        assert_eq!(reopened.remembered_user().await, None);

        let _ = std::fs::remove_file(&path);
    }
}
