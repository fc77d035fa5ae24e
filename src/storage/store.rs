use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use super::profile::{ProfileRecord, UserProfile};
use super::StorageError;
use crate::utils::logging::{log_storage_error, log_storage_operation};

#[derive(Debug, Default)]
struct Inner {
    profiles: BTreeMap<i64, UserProfile>,
    dirty: bool,
    last_persist_failed: bool,
}

/// Sole owner of all user profiles.
///
/// Every read-modify-write happens under one mutex which is held only for
/// the in-memory change or the file write. Callers get clones back and never
/// hold the lock across network calls.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl StateStore {
    /// Loads the store from `path`.
    ///
    /// A missing file yields an empty store. A file that cannot be read or
    /// parsed is an error; callers must not fall back to empty state.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("State file {} not found, starting with an empty store", path.display());
                return Ok(Self::empty(path));
            }
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        let records: BTreeMap<String, ProfileRecord> = if raw.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?
        };

        let mut profiles = BTreeMap::new();
        for (key, record) in records {
            let id: i64 = key.trim().parse().map_err(|_| StorageError::Corrupt {
                path: path.clone(),
                reason: format!("user id '{}' is not an integer", key),
            })?;
            profiles.insert(id, UserProfile::from_record(id, record));
        }

        log_storage_operation("load", Some(&format!("{} profiles from {}", profiles.len(), path.display())));

        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                profiles,
                ..Inner::default()
            }),
        })
    }

    /// Creates an explicitly empty store backed by `path`
    pub fn empty(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, user_id: i64) -> Option<UserProfile> {
        self.inner.lock().await.profiles.get(&user_id).cloned()
    }

    /// Inserts or replaces the profile with the same id
    pub async fn upsert(&self, profile: UserProfile) {
        let mut inner = self.inner.lock().await;
        let changed = inner.profiles.get(&profile.id) != Some(&profile);
        if changed {
            inner.profiles.insert(profile.id, profile);
            inner.dirty = true;
        }
    }

    /// Applies `f` to the user's profile, creating it first if absent.
    ///
    /// The store is only marked dirty when the profile actually changed.
    pub async fn update<F, R>(&self, user_id: i64, f: F) -> R
    where
        F: FnOnce(&mut UserProfile) -> R,
    {
        let mut inner = self.inner.lock().await;
        let existed = inner.profiles.contains_key(&user_id);
        let profile = inner
            .profiles
            .entry(user_id)
            .or_insert_with(|| UserProfile::new(user_id));
        let before = profile.clone();
        let result = f(profile);
        let changed = !existed || *profile != before;
        if changed {
            inner.dirty = true;
        }
        result
    }

    /// Records a successful digest delivery
    pub async fn mark_sent(&self, user_id: i64, at: DateTime<Utc>) {
        self.update(user_id, |profile| profile.last_sent = Some(at)).await;
    }

    /// Profiles with a configured delivery time, ordered by user id
    pub async fn list_subscribed(&self) -> Vec<UserProfile> {
        self.inner
            .lock()
            .await
            .profiles
            .values()
            .filter(|p| p.is_subscribed())
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.profiles.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.profiles.is_empty()
    }

    pub async fn is_dirty(&self) -> bool {
        self.inner.lock().await.dirty
    }

    pub async fn last_persist_failed(&self) -> bool {
        self.inner.lock().await.last_persist_failed
    }

    /// Writes the whole store to disk atomically.
    ///
    /// The snapshot goes to a temp file in the same directory which is
    /// synced and then renamed over the target, so a crash leaves either the
    /// old or the new file in place.
    pub async fn persist(&self) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;

        let records: BTreeMap<String, ProfileRecord> = inner
            .profiles
            .iter()
            .map(|(id, profile)| (id.to_string(), profile.to_record()))
            .collect();

        match self.write_atomic(&records).await {
            Ok(()) => {
                inner.dirty = false;
                inner.last_persist_failed = false;
                log_storage_operation("persist", Some(&format!("{} profiles", records.len())));
                Ok(())
            }
            Err(e) => {
                inner.last_persist_failed = true;
                log_storage_error("persist", &e.to_string(), Some(&self.path.display().to_string()));
                Err(e)
            }
        }
    }

    /// Persists only when there are unsaved changes
    pub async fn persist_if_dirty(&self) -> Result<bool, StorageError> {
        if !self.is_dirty().await {
            return Ok(false);
        }
        self.persist().await.map(|_| true)
    }

    async fn write_atomic(&self, records: &BTreeMap<String, ProfileRecord>) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(records)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "state".to_string());
        let tmp_path = dir.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StorageError::Io { path, source }
        };

        let result = async {
            let mut file = tokio::fs::File::create(&tmp_path).await.map_err(io_err(&tmp_path))?;
            file.write_all(&json).await.map_err(io_err(&tmp_path))?;
            file.sync_all().await.map_err(io_err(&tmp_path))?;
            drop(file);
            tokio::fs::rename(&tmp_path, &self.path)
                .await
                .map_err(io_err(&self.path))
        }
        .await;

        if result.is_err() {
            let _ = tokio::fs::remove_file(&tmp_path).await;
        }
        result
    }
}
