//! Cookie sessions and the key-value store behind them.
//!
//! A session is a random id handed to the browser in a cookie plus a `sess:<id>` entry
//! in the store naming the logged-in user. Each request gets a [`SessionHandle`];
//! resolvers log in or out through it and the HTTP layer turns the outcome into
//! cookie headers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::infra::error::InfraError;
use crate::util::lock::mutex_lock;

const SOURCE: &str = "application::sessions";

pub const SESSION_KEY_PREFIX: &str = "sess:";

/// Minimal expiring key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), InfraError>;

    async fn get(&self, key: &str) -> Result<Option<String>, InfraError>;

    /// Returns whether the key existed.
    async fn delete(&self, key: &str) -> Result<bool, InfraError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: i32,
}

/// Typed access to session entries.
#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn load(&self, id: &str) -> Result<Option<SessionData>, InfraError> {
        let Some(raw) = self.kv.get(&session_key(id)).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(data) => Ok(Some(data)),
            Err(err) => {
                debug!(error = %err, "discarding unreadable session entry");
                Ok(None)
            }
        }
    }

    pub async fn save(&self, id: &str, data: SessionData) -> Result<(), InfraError> {
        let raw = serde_json::to_string(&data)
            .map_err(|err| InfraError::session_store(format!("encode session: {err}")))?;
        self.kv.put(&session_key(id), &raw, self.ttl).await
    }

    pub async fn destroy(&self, id: &str) -> Result<bool, InfraError> {
        self.kv.delete(&session_key(id)).await
    }
}

fn session_key(id: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{id}")
}

/// What the response should do with the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieDirective {
    Keep,
    Issue(String),
    Clear,
}

#[derive(Debug)]
struct SessionState {
    id: Option<String>,
    user_id: Option<i32>,
    directive: CookieDirective,
}

/// Per-request view of the caller's session. Clones share state.
#[derive(Clone)]
pub struct SessionHandle {
    store: SessionStore,
    state: Arc<Mutex<SessionState>>,
}

impl SessionHandle {
    /// A request without a usable session cookie.
    pub fn anonymous(store: SessionStore) -> Self {
        Self::with_state(store, None, None)
    }

    /// Look up the session named by the request cookie, if any.
    ///
    /// Ids with no stored entry are dropped so a client-chosen id never becomes a session.
    pub async fn resume(store: SessionStore, cookie: Option<String>) -> Result<Self, InfraError> {
        let Some(id) = cookie else {
            return Ok(Self::anonymous(store));
        };
        match store.load(&id).await? {
            Some(data) => Ok(Self::with_state(store, Some(id), Some(data.user_id))),
            None => {
                debug!("ignoring cookie without a stored session");
                Ok(Self::anonymous(store))
            }
        }
    }

    fn with_state(store: SessionStore, id: Option<String>, user_id: Option<i32>) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(SessionState {
                id,
                user_id,
                directive: CookieDirective::Keep,
            })),
        }
    }

    pub fn user_id(&self) -> Option<i32> {
        mutex_lock(&self.state, SOURCE, "user_id").user_id
    }

    /// Bind the session to `user_id`, creating a session id when there is none yet.
    pub async fn log_in(&self, user_id: i32) -> Result<(), InfraError> {
        let (id, fresh) = {
            let state = mutex_lock(&self.state, SOURCE, "log_in");
            match &state.id {
                Some(id) => (id.clone(), false),
                None => (Uuid::new_v4().to_string(), true),
            }
        };

        self.store.save(&id, SessionData { user_id }).await?;

        let mut state = mutex_lock(&self.state, SOURCE, "log_in");
        state.id = Some(id.clone());
        state.user_id = Some(user_id);
        // Reissued so the cookie max-age restarts with the stored entry.
        state.directive = CookieDirective::Issue(id);
        info!(user_id, fresh, "session logged in");
        Ok(())
    }

    /// Remove the session entry and ask for the cookie to be cleared.
    pub async fn destroy(&self) -> Result<(), InfraError> {
        let id = {
            let mut state = mutex_lock(&self.state, SOURCE, "destroy");
            state.user_id = None;
            state.directive = CookieDirective::Clear;
            state.id.take()
        };

        if let Some(id) = id {
            self.store.destroy(&id).await?;
        }
        info!("session destroyed");
        Ok(())
    }

    pub fn cookie_directive(&self) -> CookieDirective {
        mutex_lock(&self.state, SOURCE, "cookie_directive")
            .directive
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::sessions::MemoryStore;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(MemoryStore::new()), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn unknown_cookie_resumes_as_anonymous() {
        let handle = SessionHandle::resume(store(), Some("missing".to_string()))
            .await
            .expect("resume");
        assert_eq!(handle.user_id(), None);
        assert_eq!(handle.cookie_directive(), CookieDirective::Keep);
    }

    #[tokio::test]
    async fn login_after_unknown_cookie_mints_a_new_id() {
        let store = store();
        let handle = SessionHandle::resume(store.clone(), Some("planted-id".to_string()))
            .await
            .expect("resume");
        handle.log_in(7).await.expect("log in");

        let CookieDirective::Issue(id) = handle.cookie_directive() else {
            panic!("login should issue a cookie");
        };
        assert_ne!(id, "planted-id");
        assert_eq!(store.load("planted-id").await.expect("load"), None);

        let replay = SessionHandle::resume(store, Some("planted-id".to_string()))
            .await
            .expect("resume");
        assert_eq!(replay.user_id(), None);
    }

    #[tokio::test]
    async fn login_persists_session_for_next_request() {
        let store = store();
        let handle = SessionHandle::anonymous(store.clone());
        handle.log_in(7).await.expect("log in");

        let CookieDirective::Issue(id) = handle.cookie_directive() else {
            panic!("login should issue a cookie");
        };
        let next = SessionHandle::resume(store, Some(id)).await.expect("resume");
        assert_eq!(next.user_id(), Some(7));
    }

    #[tokio::test]
    async fn destroy_removes_entry_and_clears_cookie() {
        let store = store();
        store
            .save("abc", SessionData { user_id: 3 })
            .await
            .expect("save");
        let handle = SessionHandle::resume(store.clone(), Some("abc".to_string()))
            .await
            .expect("resume");

        handle.destroy().await.expect("destroy");

        assert_eq!(handle.user_id(), None);
        assert_eq!(handle.cookie_directive(), CookieDirective::Clear);
        assert_eq!(store.load("abc").await.expect("load"), None);
    }
}
