//! Boundary between the game and external persistence.
//!
//! [`SyncGateway`] moves whole [`ProgressState`] snapshots and profiles to and
//! from storage. [`MemoryGateway`] keeps everything in process and can be
//! switched offline to simulate transport failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lexicon::Lexicon;
use crate::progress::ProgressState;
use crate::schema::{CharacterId, ProgressDocument, PublicUser};

/// Errors crossing the persistence boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// No record exists (first run).
    #[error("not found: {0}")]
    NotFound(String),
    /// Storage unreachable or returned an unexpected response.
    #[error("transport failure: {0}")]
    Transport(String),
    /// Credential missing, invalid or expired; the player must sign in again.
    #[error("authentication required: {0}")]
    Auth(String),
    /// Input was rejected.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Record already exists.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl GatewayError {
    /// Whether the caller should fall back to defaults instead of surfacing the error.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Transport(_))
    }
}

/// Player profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Name shown to other players.
    pub display_name: String,
    /// Avatar.
    pub character_id: CharacterId,
    /// Sum of level scores.
    pub total_score: u32,
}

impl From<&PublicUser> for Profile {
    fn from(user: &PublicUser) -> Self {
        Self {
            display_name: user.display_name.clone(),
            character_id: user.character_id,
            total_score: user.total_score,
        }
    }
}

/// Profile changes; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// New avatar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<CharacterId>,
}

/// Progress and profile persistence.
#[async_trait]
pub trait SyncGateway: Send + Sync {
    /// Load a player's progress.
    ///
    /// Transient unlock bookkeeping in the result is not derived; callers
    /// run [`crate::unlock::UnlockController::rederive`].
    async fn load_progress(&self, user_id: &str) -> Result<ProgressState, GatewayError>;

    /// Store a full progress snapshot.
    async fn save_progress(&self, user_id: &str, state: &ProgressState) -> Result<(), GatewayError>;

    /// Load a player's profile.
    async fn load_profile(&self, user_id: &str) -> Result<Profile, GatewayError>;

    /// Change a player's profile and return the result.
    async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<Profile, GatewayError>;
}

/// In-process gateway.
///
/// Progress is kept in its stored document form so loads go through the same
/// normalization as any other backend.
#[derive(Clone)]
pub struct MemoryGateway {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    lexicon: Arc<Lexicon>,
    progress: RwLock<HashMap<String, ProgressDocument>>,
    profiles: RwLock<HashMap<String, Profile>>,
    offline: AtomicBool,
    saves: AtomicU64,
}

impl std::fmt::Debug for MemoryGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryGateway")
            .field("offline", &self.is_offline())
            .field("saves", &self.save_count())
            .finish_non_exhaustive()
    }
}

impl MemoryGateway {
    /// Create an empty gateway.
    #[must_use]
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                lexicon,
                progress: RwLock::new(HashMap::new()),
                profiles: RwLock::new(HashMap::new()),
                offline: AtomicBool::new(false),
                saves: AtomicU64::new(0),
            }),
        }
    }

    /// Make every call fail with [`GatewayError::Transport`] while set.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Whether the gateway is simulating an outage.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.inner.offline.load(Ordering::SeqCst)
    }

    /// Successful saves so far.
    #[must_use]
    pub fn save_count(&self) -> u64 {
        self.inner.saves.load(Ordering::SeqCst)
    }

    /// Stored document for a player.
    #[must_use]
    pub fn document(&self, user_id: &str) -> Option<ProgressDocument> {
        self.inner
            .progress
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(user_id)
            .cloned()
    }

    /// Store a raw document, as an older client might have written it.
    pub fn insert_document(&self, user_id: &str, document: ProgressDocument) {
        self.inner
            .progress
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(user_id.to_string(), document);
    }

    /// Create or replace a profile.
    pub fn insert_profile(&self, user_id: &str, profile: Profile) {
        self.inner
            .profiles
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(user_id.to_string(), profile);
    }

    fn check_online(&self) -> Result<(), GatewayError> {
        if self.is_offline() {
            Err(GatewayError::Transport("gateway offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SyncGateway for MemoryGateway {
    async fn load_progress(&self, user_id: &str) -> Result<ProgressState, GatewayError> {
        self.check_online()?;
        self.document(user_id)
            .map(|doc| doc.into_state(&self.inner.lexicon))
            .ok_or_else(|| GatewayError::NotFound(format!("progress for {user_id}")))
    }

    async fn save_progress(&self, user_id: &str, state: &ProgressState) -> Result<(), GatewayError> {
        self.check_online()?;
        let mut doc = ProgressDocument::from_state(state);
        doc.user_id = Some(user_id.to_string());
        let total = doc.total_score();
        self.insert_document(user_id, doc);

        if let Some(profile) = self
            .inner
            .profiles
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get_mut(user_id)
        {
            profile.total_score = total;
        }
        self.inner.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_profile(&self, user_id: &str) -> Result<Profile, GatewayError> {
        self.check_online()?;
        self.inner
            .profiles
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(user_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("profile for {user_id}")))
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<Profile, GatewayError> {
        self.check_online()?;
        let mut profiles = self
            .inner
            .profiles
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let profile = profiles
            .get_mut(user_id)
            .ok_or_else(|| GatewayError::NotFound(format!("profile for {user_id}")))?;
        if let Some(name) = update.display_name {
            profile.display_name = name;
        }
        if let Some(character) = update.character_id {
            profile.character_id = character;
        }
        Ok(profile.clone())
    }
}
