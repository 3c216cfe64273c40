//! Authenticated session context.
//!
//! The current identity lives in an explicit [`SessionContext`] handed to whoever needs
//! it. It is written through to a [`SessionStore`] on login, logout and identity refresh,
//! and nowhere else.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::errors::AppError;
use crate::models::User;
use crate::store::Collection;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub signed_in_at: String,
}

impl Identity {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            signed_in_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Where a session survives between runs.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Option<Identity>, AppError>;
    async fn save(&self, identity: &Identity) -> Result<(), AppError>;
    async fn clear(&self) -> Result<(), AppError>;
}

/// Session persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<Identity>, AppError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Internal(format!(
                "Failed to read session {:?}: {}",
                self.path, e
            ))),
        }
    }

    async fn save(&self, identity: &Identity) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create {:?}: {}", parent, e)))?;
        }
        let json = serde_json::to_vec_pretty(identity)?;
        tokio::fs::write(&self.path, json).await.map_err(|e| {
            AppError::Internal(format!("Failed to write session {:?}: {}", self.path, e))
        })
    }

    async fn clear(&self) -> Result<(), AppError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!(
                "Failed to remove session {:?}: {}",
                self.path, e
            ))),
        }
    }
}

/// Session kept in memory only.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Identity>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Identity>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<Identity>, AppError> {
        Ok(self.slot().clone())
    }

    async fn save(&self, identity: &Identity) -> Result<(), AppError> {
        *self.slot() = Some(identity.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        *self.slot() = None;
        Ok(())
    }
}

/// Holds the current identity and writes every transition through to `S`.
pub struct SessionContext<S> {
    store: S,
    current: watch::Sender<Option<Identity>>,
}

impl<S: SessionStore> SessionContext<S> {
    /// Empty session. Nothing is read from `store`.
    pub fn new(store: S) -> Self {
        let (current, _) = watch::channel(None);
        Self { store, current }
    }

    /// Session seeded from whatever `store` holds. An unreadable store starts signed out.
    pub async fn restore(store: S) -> Self {
        let restored = match store.load().await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!("Ignoring unreadable session: {}", e);
                None
            }
        };
        let (current, _) = watch::channel(restored);
        Self { store, current }
    }

    pub fn current(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }

    /// Record a successful sign-in.
    pub async fn login(&self, user: &User) -> Result<Identity, AppError> {
        let identity = Identity::from_user(user);
        self.store.save(&identity).await?;
        tracing::info!(user_id = %identity.user_id, "Signed in");
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    /// Sign out. The in-memory identity is cleared even if the store refuses.
    pub async fn logout(&self) -> Result<(), AppError> {
        let previous = self.current.send_replace(None);
        if let Some(identity) = previous {
            tracing::info!(user_id = %identity.user_id, "Signed out");
        }
        self.store.clear().await
    }

    /// Re-read the signed-in user from `users`.
    ///
    /// A user that no longer exists ends the session. Returns the identity now in effect.
    pub async fn refresh_identity<C>(&self, users: &C) -> Result<Option<Identity>, AppError>
    where
        C: Collection<Record = User>,
    {
        let Some(identity) = self.current() else {
            return Ok(None);
        };

        match users.get(&identity.user_id).await? {
            Some(user) => {
                let refreshed = Identity {
                    full_name: user.full_name,
                    email: user.email,
                    ..identity
                };
                self.store.save(&refreshed).await?;
                self.current.send_replace(Some(refreshed.clone()));
                Ok(Some(refreshed))
            }
            None => {
                tracing::warn!(user_id = %identity.user_id, "Signed-in user no longer exists");
                self.logout().await?;
                Ok(None)
            }
        }
    }
}
