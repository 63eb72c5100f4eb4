//! User store: attempt history and per-item counters for each user.
//!
//! Reads hand out cloned snapshots taken under one read lock, so a stats
//! computation never sees a half-applied write. When a data path is set the
//! whole map is written to JSON (temp file + rename) after each change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::domain::{AttemptRecord, ItemKind, PerformanceCounters};
use crate::error::StoreError;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
  pub username: String,
  #[serde(default)]
  pub attempts: Vec<AttemptRecord>,
  #[serde(default)]
  pub counters: PerformanceCounters,
}

/// Cloned view of one user's data.
#[derive(Clone, Debug, PartialEq)]
pub struct UserSnapshot {
  pub user_id: String,
  pub username: String,
  pub attempts: Vec<AttemptRecord>,
  pub counters: PerformanceCounters,
}

/// Per-item outcome of a graded quiz, keyed by the item's prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemOutcome {
  pub prompt: String,
  pub correct: bool,
}

#[derive(Clone)]
pub struct UserStore {
  users: Arc<RwLock<BTreeMap<String, UserRecord>>>,
  path: Option<PathBuf>,
}

impl UserStore {
  pub fn in_memory() -> Self {
    Self { users: Arc::new(RwLock::new(BTreeMap::new())), path: None }
  }

  /// Open a JSON-backed store; a missing file starts empty.
  pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
    let path = path.as_ref().to_path_buf();
    let users = if path.exists() {
      let bytes = std::fs::read(&path)?;
      serde_json::from_slice::<BTreeMap<String, UserRecord>>(&bytes)?
    } else {
      BTreeMap::new()
    };
    info!(target: "hsk_quiz", path = %path.display(), users = users.len(), "Opened user store");
    Ok(Self { users: Arc::new(RwLock::new(users)), path: Some(path) })
  }

  /// Create the user on first contact. An existing name is kept unless a new one is given.
  #[instrument(level = "debug", skip(self))]
  pub async fn ensure_user(&self, user_id: &str, username: Option<&str>) -> Result<(), StoreError> {
    let mut users = self.users.write().await;
    let updated = match users.get(user_id) {
      Some(rec) => match username {
        Some(name) if rec.username != name => UserRecord { username: name.to_string(), ..rec.clone() },
        _ => return Ok(()),
      },
      None => UserRecord { username: username.unwrap_or("Anonymous").to_string(), ..UserRecord::default() },
    };
    self.commit(&mut users, user_id, updated).await
  }

  /// Append one attempt and bump the counters of every answered item, atomically.
  #[instrument(level = "debug", skip(self, attempt, outcomes), fields(attempt_id = %attempt.id, items = outcomes.len()))]
  pub async fn record_attempt(&self, user_id: &str, attempt: AttemptRecord, outcomes: &[ItemOutcome]) -> Result<(), StoreError> {
    let mut users = self.users.write().await;
    let mut updated = users
      .get(user_id)
      .cloned()
      .unwrap_or_else(|| UserRecord { username: "Anonymous".into(), ..UserRecord::default() });
    let kind: ItemKind = attempt.item_type;
    let counters = updated.counters.for_kind_mut(kind);
    for o in outcomes {
      counters.entry(o.prompt.clone()).or_default().record(o.correct);
    }
    updated.attempts.push(attempt);
    self.commit(&mut users, user_id, updated).await
  }

  /// Swap in `updated` and persist. On a failed write the previous record is
  /// put back, so memory never holds a change the file does not.
  async fn commit(&self, users: &mut BTreeMap<String, UserRecord>, user_id: &str, updated: UserRecord) -> Result<(), StoreError> {
    let previous = users.insert(user_id.to_string(), updated);
    if let Err(e) = self.persist(users).await {
      warn!(target: "hsk_quiz", %user_id, error = %e, "Persist failed; change rolled back");
      match previous {
        Some(rec) => {
          users.insert(user_id.to_string(), rec);
        }
        None => {
          users.remove(user_id);
        }
      }
      return Err(e);
    }
    Ok(())
  }

  pub async fn snapshot(&self, user_id: &str) -> Option<UserSnapshot> {
    let users = self.users.read().await;
    users.get(user_id).map(|rec| to_snapshot(user_id, rec))
  }

  /// All users, ordered by user id.
  pub async fn snapshot_all(&self) -> Vec<UserSnapshot> {
    let users = self.users.read().await;
    users.iter().map(|(id, rec)| to_snapshot(id, rec)).collect()
  }

  async fn persist(&self, users: &BTreeMap<String, UserRecord>) -> Result<(), StoreError> {
    let Some(path) = &self.path else { return Ok(()) };
    let bytes = serde_json::to_vec_pretty(users)?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(dir).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    debug!(target: "hsk_quiz", path = %path.display(), bytes = bytes.len(), "User store persisted");
    Ok(())
  }
}

fn to_snapshot(user_id: &str, rec: &UserRecord) -> UserSnapshot {
  UserSnapshot {
    user_id: user_id.to_string(),
    username: rec.username.clone(),
    attempts: rec.attempts.clone(),
    counters: rec.counters.clone(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn outcome(prompt: &str, correct: bool) -> ItemOutcome {
    ItemOutcome { prompt: prompt.into(), correct }
  }

  #[tokio::test]
  async fn record_attempt_updates_history_and_counters() {
    let store = UserStore::in_memory();
    store.ensure_user("u1", Some("Lin")).await.unwrap();
    let attempt = AttemptRecord::new(ItemKind::Words, 1, 2, 30, Utc::now());
    store.record_attempt("u1", attempt, &[outcome("爱", true), outcome("八", false)]).await.unwrap();
    let attempt = AttemptRecord::new(ItemKind::Words, 1, 1, 10, Utc::now());
    store.record_attempt("u1", attempt, &[outcome("爱", true)]).await.unwrap();

    let snap = store.snapshot("u1").await.unwrap();
    assert_eq!(snap.username, "Lin");
    assert_eq!(snap.attempts.len(), 2);
    assert_eq!(snap.counters.words["爱"].correct, 2);
    assert_eq!(snap.counters.words["八"].incorrect, 1);
    assert!(snap.counters.sentences.is_empty());
  }

  #[tokio::test]
  async fn ensure_user_keeps_name_unless_given() {
    let store = UserStore::in_memory();
    store.ensure_user("u1", None).await.unwrap();
    assert_eq!(store.snapshot("u1").await.unwrap().username, "Anonymous");
    store.ensure_user("u1", Some("Mei")).await.unwrap();
    store.ensure_user("u1", None).await.unwrap();
    assert_eq!(store.snapshot("u1").await.unwrap().username, "Mei");
  }

  #[tokio::test]
  async fn json_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("users.json");

    let store = UserStore::open(&path).unwrap();
    store.ensure_user("u2", Some("Wang")).await.unwrap();
    let attempt = AttemptRecord::new(ItemKind::Sentences, 3, 4, 45, Utc::now());
    store.record_attempt("u2", attempt.clone(), &[outcome("我爱你。", true)]).await.unwrap();

    let reopened = UserStore::open(&path).unwrap();
    let snap = reopened.snapshot("u2").await.unwrap();
    assert_eq!(snap.username, "Wang");
    assert_eq!(snap.attempts, vec![attempt]);
    assert_eq!(snap.counters.sentences["我爱你。"].correct, 1);
  }

  #[tokio::test]
  async fn snapshot_all_is_ordered_by_user_id() {
    let store = UserStore::in_memory();
    for id in ["c", "a", "b"] {
      store.ensure_user(id, None).await.unwrap();
    }
    let ids: Vec<String> = store.snapshot_all().await.into_iter().map(|s| s.user_id).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
  }

  #[tokio::test]
  async fn failed_write_leaves_memory_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let store = UserStore::open(data_dir.join("users.json")).unwrap();
    store.ensure_user("u1", Some("Lin")).await.unwrap();

    // A plain file where the data directory should be makes every write fail.
    std::fs::remove_dir_all(&data_dir).unwrap();
    std::fs::write(&data_dir, b"not a directory").unwrap();

    let attempt = AttemptRecord::new(ItemKind::Words, 1, 1, 5, Utc::now());
    assert!(store.record_attempt("u1", attempt, &[outcome("爱", true)]).await.is_err());
    assert!(store.ensure_user("u1", Some("Mei")).await.is_err());
    assert!(store.ensure_user("u9", None).await.is_err());

    let snap = store.snapshot("u1").await.unwrap();
    assert!(snap.attempts.is_empty());
    assert!(snap.counters.words.is_empty());
    assert_eq!(snap.username, "Lin");
    assert!(store.snapshot("u9").await.is_none());
  }
}
