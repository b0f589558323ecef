use async_trait::async_trait;
use chrono::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Token-to-user mapping with expiry. The mapping is owned by an external
/// store; this crate only creates entries on login and drops them on logout.
#[async_trait]
pub trait SessionStore {
    /// Reports whether the backing store is reachable.
    async fn is_alive(&self) -> bool;

    /// Associates `token` with `user_id` for `ttl`.
    async fn put(&self, token: &str, user_id: Uuid, ttl: Duration)
        -> Result<(), SessionStoreError>;

    /// Resolves a token to a user id. Expired or unknown tokens are misses.
    async fn get(&self, token: &str) -> Result<Option<Uuid>, SessionStoreError>;

    /// Removes a token. Returns the user id it pointed to, if any.
    async fn delete(&self, token: &str) -> Result<Option<Uuid>, SessionStoreError>;
}
