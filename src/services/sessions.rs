//! Redis-backed session and password reset token store
//!
//! A signed token is only accepted while its session record exists here, so
//! deleting the record revokes the token before it expires.

use chrono::{DateTime, Utc};
use redis::{AsyncCommands, Client, RedisResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;
use crate::config::RedisConfig;
use crate::utils::errors::{EventifyError, Result};

/// Live session as stored in Redis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
#[derive(Debug)]
pub struct SessionStore {
    client: Client,
    prefix: String,
}

impl SessionStore {
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;

        Ok(Self {
            client,
            prefix: config.prefix.clone(),
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    fn session_key(&self, session_id: Uuid) -> String {
        format!("{}session:{}", self.prefix, session_id)
    }

    fn reset_key(&self, token: &str) -> String {
        format!("{}password_reset:{}", self.prefix, token)
    }

    /// Store a session until its `expires_at`
    pub async fn create_session(&self, record: &SessionRecord) -> Result<()> {
        let ttl = (record.expires_at - Utc::now()).num_seconds();
        if ttl <= 0 {
            return Err(EventifyError::InvalidInput("Session already expired".to_string()));
        }

        let mut conn = self.get_connection().await?;
        let key = self.session_key(record.session_id);
        let serialized = serde_json::to_string(record)?;

        let _: () = conn.set_ex(&key, serialized, ttl as u64).await?;

        debug!(session_id = %record.session_id, user_id = %record.user_id, ttl = ttl, "Session stored");
        Ok(())
    }

    pub async fn get_session(&self, session_id: Uuid) -> Result<Option<SessionRecord>> {
        let mut conn = self.get_connection().await?;
        let data: Option<String> = conn.get(self.session_key(session_id)).await?;

        match data {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Delete a session; returns whether it existed
    pub async fn delete_session(&self, session_id: Uuid) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let deleted: i32 = conn.del(self.session_key(session_id)).await?;

        debug!(session_id = %session_id, deleted = deleted > 0, "Session deletion attempted");
        Ok(deleted > 0)
    }

    /// Store a one-shot password reset token for `user_id`
    pub async fn store_reset_token(&self, token: &str, user_id: Uuid, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let _: () = conn.set_ex(self.reset_key(token), user_id.to_string(), ttl_seconds).await?;

        debug!(user_id = %user_id, ttl = ttl_seconds, "Password reset token stored");
        Ok(())
    }

    /// Read and delete a reset token in one step
    pub async fn consume_reset_token(&self, token: &str) -> Result<Option<Uuid>> {
        let mut conn = self.get_connection().await?;
        let key = self.reset_key(token);

        let (value, _deleted): (Option<String>, i32) = redis::pipe()
            .atomic()
            .get(&key)
            .del(&key)
            .query_async(&mut conn)
            .await?;

        match value {
            Some(raw) => Uuid::parse_str(&raw)
                .map(Some)
                .map_err(|_| EventifyError::Authentication("Invalid reset token".to_string())),
            None => Ok(None),
        }
    }

    /// Health check for the Redis connection
    pub async fn health_check(&self) -> Result<bool> {
        match self.get_connection().await {
            Ok(mut conn) => {
                let result: RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
                match result {
                    Ok(response) => Ok(response == "PONG"),
                    Err(e) => {
                        warn!(error = %e, "Redis health check failed");
                        Ok(false)
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Redis connection failed");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(&crate::config::Settings::default().redis).unwrap()
    }

    #[test]
    fn test_keys_are_prefixed() {
        let store = store();
        let id = Uuid::nil();
        assert_eq!(
            store.session_key(id),
            "eventify:session:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(store.reset_key("abc"), "eventify:password_reset:abc");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let config = RedisConfig {
            url: "not a url".to_string(),
            prefix: "x:".to_string(),
        };
        assert!(SessionStore::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_expired_session_is_not_stored() {
        let now = Utc::now();
        let record = SessionRecord {
            session_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role: "student".to_string(),
            created_at: now,
            expires_at: now - chrono::Duration::minutes(1),
        };
        assert!(matches!(
            store().create_session(&record).await,
            Err(EventifyError::InvalidInput(_))
        ));
    }
}
