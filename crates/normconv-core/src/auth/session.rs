use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};

/// The API key in use for this run.
///
/// A key counts as authenticated only after the service accepted it. Any
/// `Unauthorized` response invalidates it.
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    key: Option<String>,
    verified_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `key` against the service and keep it on success. On failure the
    /// session is left unauthenticated.
    pub async fn verify(&mut self, client: &ApiClient, key: &str) -> Result<(), ApiError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ApiError::Unauthorized);
        }

        match client.verify_key(key).await {
            Ok(()) => {
                self.key = Some(key.to_string());
                self.verified_at = Some(Utc::now());
                info!("API key verified");
                Ok(())
            }
            Err(e) => {
                self.invalidate();
                Err(e)
            }
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn verified_at(&self) -> Option<DateTime<Utc>> {
        self.verified_at
    }

    pub fn is_authenticated(&self) -> bool {
        self.key.is_some()
    }

    /// Client carrying this session's key, or `None` when unauthenticated.
    pub fn authorized(&self, client: &ApiClient) -> Option<ApiClient> {
        self.key.as_ref().map(|key| client.with_token(key.clone()))
    }

    pub fn invalidate(&mut self) {
        if self.key.take().is_some() {
            warn!("API key invalidated");
        }
        self.verified_at = None;
    }

    /// Drop the key if `err` says the service rejected it. Returns whether
    /// the session was invalidated.
    pub fn observe(&mut self, err: &ApiError) -> bool {
        if err.is_unauthorized() {
            self.invalidate();
            true
        } else {
            false
        }
    }
}
