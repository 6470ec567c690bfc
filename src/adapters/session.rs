use crate::core::Storage;
use crate::utils::error::{FeedError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Persists the login token between runs, one JSON file under the storage root.
#[derive(Debug, Clone)]
pub struct SessionStore<S: Storage> {
    storage: S,
}

impl<S: Storage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub async fn load(&self) -> Result<Option<Session>> {
        let data = match self.storage.read_file(SESSION_FILE).await {
            Ok(data) => data,
            Err(FeedError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(None)
            }
            Err(e) => return Err(e),
        };

        match serde_json::from_slice(&data) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!("⚠️ Ignoring unreadable session file: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn save(&self, session: &Session) -> Result<()> {
        let data = serde_json::to_vec_pretty(session)?;
        self.storage.write_file(SESSION_FILE, &data).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.storage.remove_file(SESSION_FILE).await
    }

    pub async fn token(&self) -> Result<Option<String>> {
        Ok(self.load().await?.map(|s| s.token))
    }
}
