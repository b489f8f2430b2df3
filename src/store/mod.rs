//! Flat-file user store.
//!
//! The whole user list lives in one JSON array. Every operation re-reads the
//! file; mutations rewrite it in full.

pub mod user;

pub use user::{normalize_email, User, UserProfile};

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Errors from UserStore
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed users file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize users for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("User already exists: {0}")]
    DuplicateUser(String),

    #[error("User not found: {0}")]
    NotFound(String),
}

pub struct UserStore {
    path: PathBuf,
    // Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl UserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full user list. A missing or blank file is an empty list.
    pub async fn load(&self) -> Result<Vec<User>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Users file {} does not exist yet", self.path.display());
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Linear scan for an exact username match.
    pub async fn find(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.load().await?;
        Ok(users.into_iter().find(|u| u.username == username))
    }

    pub async fn insert(&self, user: User) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut users = self.load().await?;
        if users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::DuplicateUser(user.username));
        }

        let username = user.username.clone();
        users.push(user);
        self.save(&users).await?;

        info!("Stored user '{}' ({} total)", username, users.len());
        Ok(())
    }

    pub async fn remove(&self, username: &str) -> Result<User, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut users = self.load().await?;
        let index = users
            .iter()
            .position(|u| u.username == username)
            .ok_or_else(|| StoreError::NotFound(username.to_string()))?;

        let removed = users.remove(index);
        self.save(&users).await?;

        info!("Removed user '{}'", removed.username);
        Ok(removed)
    }

    /// Overwrite the file with `users`. Writes to a sibling temp file then renames.
    async fn save(&self, users: &[User]) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
            }
        }

        let content = serde_json::to_string_pretty(users).map_err(|source| StoreError::Serialize {
            path: self.path.clone(),
            source,
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, content).await.map_err(io_err)?;
        tokio::fs::rename(&temp_path, &self.path).await.map_err(io_err)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_test_store() -> (UserStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = UserStore::new(dir.path().join("users.json"));
        (store, dir)
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let (store, _dir) = create_test_store();
        assert!(store.load().await.unwrap().is_empty());
        assert!(store.find("anyone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_file_is_empty() {
        let (store, _dir) = create_test_store();
        std::fs::write(store.path(), "  \n").unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file_is_error() {
        let (store, _dir) = create_test_store();
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load().await, Err(StoreError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let (store, _dir) = create_test_store();
        store
            .insert(User::new("alice", "h1", Some("alice@example.com".to_string())))
            .await
            .unwrap();
        store.insert(User::new("bob", "h2", None)).await.unwrap();

        let alice = store.find("alice").await.unwrap().unwrap();
        assert_eq!(alice.password_hash, "h1");
        assert_eq!(alice.email.as_deref(), Some("alice@example.com"));

        // Exact, case-sensitive match
        assert!(store.find("Alice").await.unwrap().is_none());

        // File holds a JSON array with the hash under "password"
        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[1]["password"], "h2");
    }

    #[tokio::test]
    async fn test_duplicate_rejected_and_file_unchanged() {
        let (store, _dir) = create_test_store();
        store.insert(User::new("alice", "h1", None)).await.unwrap();

        let result = store.insert(User::new("alice", "other", None)).await;
        assert!(matches!(result, Err(StoreError::DuplicateUser(name)) if name == "alice"));

        let users = store.load().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].password_hash, "h1");
    }

    #[tokio::test]
    async fn test_remove() {
        let (store, _dir) = create_test_store();
        store.insert(User::new("alice", "h1", None)).await.unwrap();
        store.insert(User::new("bob", "h2", None)).await.unwrap();

        let removed = store.remove("alice").await.unwrap();
        assert_eq!(removed.username, "alice");
        assert!(store.find("alice").await.unwrap().is_none());
        assert!(store.find("bob").await.unwrap().is_some());

        assert!(matches!(store.remove("alice").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = UserStore::new(dir.path().join("nested/data/users.json"));
        store.insert(User::new("alice", "h1", None)).await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_concurrent_inserts_are_not_lost() {
        let (store, _dir) = create_test_store();
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert(User::new(format!("user{i}"), "h", None)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.load().await.unwrap().len(), 16);
    }
}
