//! Shared document storage for accounts, progress and leaderboards.
//!
//! Everything lives in memory behind one [`RwLock`]. With a data directory,
//! every mutation also writes the touched document to disk as JSON:
//!
//! ```text
//! data_dir/
//!   users/{id}.json
//!   progress/{user_id}.json
//!   leaderboard/{period}.json
//! ```
//!
//! and [`DocumentStore::with_data_dir`] reads them back at startup. Files are
//! written while the write lock is held, so disk order matches memory order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use kham_core::{LeaderboardEntry, Period, ProgressDocument, UserDocument};
use serde::de::DeserializeOwned;
use serde::Serialize;

const USERS_DIR: &str = "users";
const PROGRESS_DIR: &str = "progress";
const LEADERBOARD_DIR: &str = "leaderboard";

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another account already uses this username.
    #[error("Username already exists: {0}")]
    UsernameTaken(String),
    /// No account with this id.
    #[error("User not found: {0}")]
    UserNotFound(String),
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Default)]
struct Collections {
    users: HashMap<String, UserDocument>,
    /// username -> user id
    usernames: HashMap<String, String>,
    progress: HashMap<String, ProgressDocument>,
    leaderboard: HashMap<(String, Period), LeaderboardEntry>,
}

impl Collections {
    fn period_entries(&self, period: Period) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<_> = self
            .leaderboard
            .values()
            .filter(|e| e.period == period)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.date.cmp(&b.date)));
        entries
    }
}

/// Thread-safe document storage shared by all request handlers.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    inner: Arc<RwLock<Collections>>,
    /// Optional data directory for filesystem persistence.
    data_dir: Option<PathBuf>,
}

impl DocumentStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store persisted under `data_dir`, loading whatever is there.
    ///
    /// Unreadable documents are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directories cannot be created or listed.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        for sub in [USERS_DIR, PROGRESS_DIR, LEADERBOARD_DIR] {
            std::fs::create_dir_all(data_dir.join(sub))?;
        }

        let mut collections = Collections::default();
        for user in load_dir::<UserDocument>(&data_dir.join(USERS_DIR))? {
            collections
                .usernames
                .insert(user.username.clone(), user.id.clone());
            collections.users.insert(user.id.clone(), user);
        }
        for doc in load_dir::<ProgressDocument>(&data_dir.join(PROGRESS_DIR))? {
            if let Some(user_id) = doc.user_id.clone() {
                collections.progress.insert(user_id, doc);
            }
        }
        for entries in load_dir::<Vec<LeaderboardEntry>>(&data_dir.join(LEADERBOARD_DIR))? {
            for entry in entries {
                collections
                    .leaderboard
                    .insert((entry.user_id.clone(), entry.period), entry);
            }
        }

        tracing::info!(
            users = collections.users.len(),
            progress = collections.progress.len(),
            leaderboard = collections.leaderboard.len(),
            dir = %data_dir.display(),
            "Loaded persisted documents"
        );

        Ok(Self {
            inner: Arc::new(RwLock::new(collections)),
            data_dir: Some(data_dir),
        })
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Collections> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Collections> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Insert a new account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UsernameTaken`] if the username is in use.
    pub fn insert_user(&self, user: UserDocument) -> Result<(), StoreError> {
        {
            let mut collections = self.write();
            if collections.usernames.contains_key(&user.username) {
                return Err(StoreError::UsernameTaken(user.username));
            }
            collections
                .usernames
                .insert(user.username.clone(), user.id.clone());
            self.persist(USERS_DIR, &user.id, &user);
            collections.users.insert(user.id.clone(), user);
        }
        Ok(())
    }

    /// Look up an account by id.
    #[must_use]
    pub fn user(&self, id: &str) -> Option<UserDocument> {
        self.read().users.get(id).cloned()
    }

    /// Look up an account by username.
    #[must_use]
    pub fn user_by_username(&self, username: &str) -> Option<UserDocument> {
        let collections = self.read();
        collections
            .usernames
            .get(username)
            .and_then(|id| collections.users.get(id))
            .cloned()
    }

    /// Modify an account and return the updated record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] if the account does not exist.
    pub fn update_user<F>(&self, id: &str, f: F) -> Result<UserDocument, StoreError>
    where
        F: FnOnce(&mut UserDocument),
    {
        let mut collections = self.write();
        let user = collections
            .users
            .get_mut(id)
            .ok_or_else(|| StoreError::UserNotFound(id.to_string()))?;
        f(user);
        self.persist(USERS_DIR, id, &*user);
        Ok(user.clone())
    }

    /// Number of accounts.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.read().users.len()
    }

    /// Whether the store can serve requests: the lock is not poisoned and the
    /// data directory, if any, is still present.
    #[must_use]
    pub fn is_available(&self) -> bool {
        if self.inner.is_poisoned() {
            return false;
        }
        match &self.data_dir {
            Some(dir) => [USERS_DIR, PROGRESS_DIR, LEADERBOARD_DIR]
                .iter()
                .all(|sub| dir.join(sub).is_dir()),
            None => true,
        }
    }

    // -----------------------------------------------------------------------
    // Progress
    // -----------------------------------------------------------------------

    /// A player's progress document.
    #[must_use]
    pub fn progress(&self, user_id: &str) -> Option<ProgressDocument> {
        self.read().progress.get(user_id).cloned()
    }

    /// Insert or replace a player's progress document, stamping its `userId`.
    pub fn put_progress(&self, user_id: &str, mut doc: ProgressDocument) {
        doc.user_id = Some(user_id.to_string());
        let mut collections = self.write();
        self.persist(PROGRESS_DIR, user_id, &doc);
        collections.progress.insert(user_id.to_string(), doc);
    }

    /// Replace a player's progress with `f(current)` under the write lock, so
    /// concurrent writers each see the other's result.
    pub fn upsert_progress<F>(&self, user_id: &str, f: F) -> ProgressDocument
    where
        F: FnOnce(Option<&ProgressDocument>) -> ProgressDocument,
    {
        let mut collections = self.write();
        let mut doc = f(collections.progress.get(user_id));
        doc.user_id = Some(user_id.to_string());
        self.persist(PROGRESS_DIR, user_id, &doc);
        collections.progress.insert(user_id.to_string(), doc.clone());
        doc
    }

    // -----------------------------------------------------------------------
    // Leaderboard
    // -----------------------------------------------------------------------

    /// Insert or replace the entry for `(entry.user_id, entry.period)`.
    pub fn upsert_leaderboard(&self, entry: LeaderboardEntry) {
        let period = entry.period;
        let mut collections = self.write();
        collections
            .leaderboard
            .insert((entry.user_id.clone(), period), entry);
        self.persist(
            LEADERBOARD_DIR,
            period.as_str(),
            &collections.period_entries(period),
        );
    }

    /// Entries for a period by score descending; earlier submissions win ties.
    #[must_use]
    pub fn leaderboard(&self, period: Period, limit: usize) -> Vec<LeaderboardEntry> {
        let mut entries = self.read().period_entries(period);
        entries.truncate(limit);
        entries
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Write one document to disk. Callers hold the write lock.
    ///
    /// No-op if the store was created without a data directory.
    fn persist<T: Serialize>(&self, collection: &str, key: &str, doc: &T) {
        let Some(ref data_dir) = self.data_dir else {
            return;
        };
        let json = match serde_json::to_string_pretty(doc) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("Failed to serialize {collection}/{key}: {e}");
                return;
            }
        };
        let path = data_dir
            .join(collection)
            .join(format!("{}.json", sanitize_filename(key)));
        if let Err(e) = std::fs::write(&path, json) {
            tracing::warn!("Failed to persist {collection}/{key} to {}: {e}", path.display());
        }
    }
}

fn load_dir<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>, StoreError> {
    let mut docs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }
        match read_json(&path) {
            Ok(doc) => docs.push(doc),
            Err(e) => tracing::warn!("Skipping {}: {e}", path.display()),
        }
    }
    Ok(docs)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Sanitize a document key for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, or `_` with `_`.
fn sanitize_filename(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
