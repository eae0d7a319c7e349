//! Key-value stores backing sessions and password-reset tokens.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tracing::info;

use crate::application::sessions::KeyValueStore;

use super::error::InfraError;

/// Redis-backed store. Entries expire through `SET .. EX`.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str, connect_timeout: Duration) -> Result<Self, InfraError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(connect_timeout);

        let client = Client::open(url)?;
        let conn = client.get_connection_manager_with_config(config).await?;
        info!(target = "lireddit::infra::sessions", "connected to redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), InfraError> {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1);
        let _: () = conn.set_ex(key, value, seconds).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, InfraError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<bool, InfraError> {
        let mut conn = self.conn.clone();
        let removed: usize = conn.del(key).await?;
        Ok(removed > 0)
    }
}

/// Longest lifetime a [`MemoryStore`] entry can have. Larger TTLs are clamped.
const MAX_MEMORY_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Process-local store for development and tests.
///
/// Expired entries are dropped on read and swept on every write, so keys that are
/// never read again do not accumulate.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, (String, Instant)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), InfraError> {
        let now = Instant::now();
        self.entries.retain(|_, (_, expires_at)| *expires_at > now);

        let ttl = ttl.min(MAX_MEMORY_TTL);
        let expires_at = now.checked_add(ttl).unwrap_or(now);
        self.entries
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, InfraError> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.1 > now => return Ok(Some(entry.0.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, (_, expires_at)| *expires_at <= now);
        }
        Ok(None)
    }

    async fn delete(&self, key: &str) -> Result<bool, InfraError> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, (_, expires_at))| expires_at > now))
    }
}
