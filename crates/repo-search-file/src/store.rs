//! Filesystem storage for the file-backed directory.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use repo_search_core::Result;
use repo_search_core::error::{Error, InvalidInputError};
use repo_search_core::{
    ActionKind, Did, Handle, ModerationAction, Nsid, PROFILE_COLLECTION, RecordValue,
    RelatedRecord, Repo,
};

fn map_io(err: std::io::Error) -> Error {
    Error::store_unavailable(format!("IO error: {}", err))
}

fn map_json(err: serde_json::Error) -> Error {
    Error::InvalidInput(InvalidInputError::Other {
        message: err.to_string(),
    })
}

/// A stored file exists but does not decode.
fn corrupt(path: &Path, err: serde_json::Error) -> Error {
    Error::store_unavailable(format!("corrupt file {}: {}", path.display(), err))
}

fn conflict(message: String) -> Error {
    Error::InvalidInput(InvalidInputError::Other { message })
}

/// One line of the moderation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLogEntry {
    pub op: ActionLogOp,
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_did: Option<Did>,
    /// ISO 8601 timestamp.
    pub time: String,
}

/// The type of moderation log operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionLogOp {
    /// An action was taken.
    Take,
    /// A previously taken action was reversed.
    Reverse,
}

impl ActionLogEntry {
    fn as_action(&self) -> Option<ModerationAction> {
        match (self.op, self.action, &self.subject_did) {
            (ActionLogOp::Take, Some(action), Some(did)) => Some(ModerationAction {
                id: self.id,
                action,
                subject_did: did.clone(),
            }),
            _ => None,
        }
    }
}

/// Filesystem-backed storage for a repo directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a new file store at the given root directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pds_dir(&self) -> PathBuf {
        self.root.join("pds")
    }

    fn accounts_dir(&self) -> PathBuf {
        self.pds_dir().join("accounts")
    }

    fn repos_dir(&self) -> PathBuf {
        self.pds_dir().join("repos")
    }

    fn moderation_dir(&self) -> PathBuf {
        self.pds_dir().join("moderation")
    }

    /// Convert a DID into a filesystem-safe directory name.
    ///
    /// The name must be a single normal path component.
    fn did_dir_name(did: &Did) -> Result<String> {
        // Windows does not allow ':' in path segments.
        let name = did.as_str().replace(':', "_");
        let mut components = Path::new(&name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(name),
            _ => Err(Error::InvalidInput(InvalidInputError::Did {
                value: did.to_string(),
                reason: "not usable as a directory name".to_string(),
            })),
        }
    }

    fn account_path(&self, did: &Did) -> Result<PathBuf> {
        Ok(self
            .accounts_dir()
            .join(Self::did_dir_name(did)?)
            .join("account.json"))
    }

    fn collection_dir(&self, did: &Did, collection: &Nsid) -> Result<PathBuf> {
        Ok(self
            .repos_dir()
            .join(Self::did_dir_name(did)?)
            .join("collections")
            .join(collection.as_str()))
    }

    fn actions_path(&self) -> PathBuf {
        self.moderation_dir().join("actions.jsonl")
    }

    fn actions_lock_path(&self) -> PathBuf {
        self.moderation_dir().join("actions.lock")
    }

    /// Write `content` next to `path` and rename it into place.
    fn write_atomic(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(map_io)?;
        }
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content).map_err(map_io)?;
        fs::rename(&temp_path, path).map_err(map_io)?;
        Ok(())
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Create an account with a freshly generated `did:plc`.
    #[instrument(skip(self, email))]
    pub fn create_account(&self, handle: &Handle, email: Option<&str>) -> Result<Repo> {
        let uuid_str = Uuid::new_v4().simple().to_string();
        let did = Did::new(format!("did:plc:{}", &uuid_str[..24]))?;

        let mut repo = Repo::new(did, handle.clone(), Utc::now());
        repo.email = email.map(str::to_string);
        self.put_account(&repo)?;

        Ok(repo)
    }

    /// Create or replace an account. Fails if another DID holds the handle.
    #[instrument(skip(self, repo), fields(did = %repo.did, handle = %repo.handle))]
    pub fn put_account(&self, repo: &Repo) -> Result<()> {
        if let Some(owner) = self.find_account_by_handle(&repo.handle)? {
            if owner.did != repo.did {
                return Err(conflict(format!(
                    "handle {} is taken by {}",
                    repo.handle, owner.did
                )));
            }
        }

        let content = serde_json::to_string_pretty(repo).map_err(map_json)?;
        Self::write_atomic(&self.account_path(&repo.did)?, &content)?;

        debug!("Stored account");
        Ok(())
    }

    pub fn get_account(&self, did: &Did) -> Result<Option<Repo>> {
        let path = self.account_path(did)?;
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(map_io)?;
        let repo = serde_json::from_str(&content).map_err(|e| corrupt(&path, e))?;
        Ok(Some(repo))
    }

    /// Every account. A corrupt account file fails the whole read.
    pub fn list_accounts(&self) -> Result<Vec<Repo>> {
        let accounts_dir = self.accounts_dir();
        if !accounts_dir.exists() {
            return Ok(Vec::new());
        }

        let mut accounts = Vec::new();
        for entry in fs::read_dir(&accounts_dir).map_err(map_io)? {
            let entry = entry.map_err(map_io)?;
            let account_file = entry.path().join("account.json");
            if !account_file.exists() {
                continue;
            }

            let content = fs::read_to_string(&account_file).map_err(map_io)?;
            let repo = serde_json::from_str::<Repo>(&content)
                .map_err(|e| corrupt(&account_file, e))?;
            accounts.push(repo);
        }

        Ok(accounts)
    }

    pub fn find_account_by_handle(&self, handle: &Handle) -> Result<Option<Repo>> {
        let accounts = self.list_accounts()?;
        Ok(accounts.into_iter().find(|a| &a.handle == handle))
    }

    /// Rename an account. Its `indexedAt` is left unchanged.
    #[instrument(skip(self))]
    pub fn update_handle(&self, did: &Did, handle: &Handle) -> Result<Repo> {
        let mut repo = self.get_account(did)?.ok_or_else(|| {
            Error::InvalidInput(InvalidInputError::Did {
                value: did.to_string(),
                reason: "no such account".to_string(),
            })
        })?;
        repo.handle = handle.clone();
        self.put_account(&repo)?;
        Ok(repo)
    }

    // ========================================================================
    // Records
    // ========================================================================

    #[instrument(skip(self, value))]
    pub fn put_record(
        &self,
        did: &Did,
        collection: &Nsid,
        rkey: &str,
        value: &RecordValue,
    ) -> Result<()> {
        if rkey.is_empty() || rkey.contains(['/', '\\', '.']) {
            return Err(conflict(format!("invalid record key '{}'", rkey)));
        }

        let path = self
            .collection_dir(did, collection)?
            .join(format!("{}.json", rkey));
        let content = serde_json::to_string_pretty(value.as_value()).map_err(map_json)?;
        Self::write_atomic(&path, &content)?;

        debug!("Stored record");
        Ok(())
    }

    /// Records of a collection ordered by record key. Undecodable files are
    /// skipped.
    pub fn list_records(&self, did: &Did, collection: &Nsid) -> Result<Vec<(String, RecordValue)>> {
        let dir = self.collection_dir(did, collection)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries: Vec<_> = fs::read_dir(&dir)
            .map_err(map_io)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .collect();
        entries.sort_by_key(|e| e.file_name());

        let mut records = Vec::new();
        for entry in entries {
            let path = entry.path();
            let Some(rkey) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = fs::read_to_string(&path).map_err(map_io)?;
            match serde_json::from_str::<RecordValue>(&content) {
                Ok(value) => records.push((rkey.to_string(), value)),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping undecodable record"),
            }
        }

        Ok(records)
    }

    /// Profile records of a repo, decoded.
    pub fn profile_records(&self, did: &Did) -> Result<Vec<RelatedRecord>> {
        let collection = Nsid::new(PROFILE_COLLECTION)?;
        let records = self
            .list_records(did, &collection)?
            .into_iter()
            .filter_map(|(rkey, value)| match RelatedRecord::from_value(&value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(%did, rkey = %rkey, error = %e, "Skipping malformed profile");
                    None
                }
            })
            .collect();
        Ok(records)
    }

    // ========================================================================
    // Moderation log
    // ========================================================================

    /// Run `f` while holding the moderation log lock.
    fn with_log_lock<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        fs::create_dir_all(self.moderation_dir()).map_err(map_io)?;

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.actions_lock_path())
            .map_err(map_io)?;
        lock_file.lock_exclusive().map_err(map_io)?;

        let result = f();
        lock_file.unlock().map_err(map_io)?;
        result
    }

    fn append_log(&self, entry: &ActionLogEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.actions_path())
            .map_err(map_io)?;

        let line = serde_json::to_string(entry).map_err(map_json)?;
        writeln!(file, "{}", line).map_err(map_io)?;
        file.sync_data().map_err(map_io)?;
        Ok(())
    }

    /// All readable moderation log entries, oldest first.
    pub fn action_log(&self) -> Result<Vec<ActionLogEntry>> {
        let path = self.actions_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).map_err(map_io)?;
        let entries: Vec<ActionLogEntry> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed moderation log line");
                    None
                }
            })
            .collect();
        Ok(entries)
    }

    /// Append a new action against `did`.
    #[instrument(skip(self))]
    pub fn take_action(&self, did: &Did, kind: ActionKind) -> Result<ModerationAction> {
        if self.get_account(did)?.is_none() {
            return Err(Error::InvalidInput(InvalidInputError::Did {
                value: did.to_string(),
                reason: "no such account".to_string(),
            }));
        }

        self.with_log_lock(|| {
            let id = self.action_log()?.iter().map(|e| e.id).max().unwrap_or(0) + 1;
            let entry = ActionLogEntry {
                op: ActionLogOp::Take,
                id,
                action: Some(kind),
                subject_did: Some(did.clone()),
                time: Utc::now().to_rfc3339(),
            };
            self.append_log(&entry)?;

            debug!(id, "Took moderation action");
            Ok(ModerationAction {
                id,
                action: kind,
                subject_did: did.clone(),
            })
        })
    }

    /// Reverse the action with `id`.
    #[instrument(skip(self))]
    pub fn reverse_action(&self, id: u64) -> Result<()> {
        self.with_log_lock(|| {
            let known = self
                .action_log()?
                .iter()
                .any(|e| e.op == ActionLogOp::Take && e.id == id);
            if !known {
                return Err(conflict(format!("no moderation action {}", id)));
            }

            self.append_log(&ActionLogEntry {
                op: ActionLogOp::Reverse,
                id,
                action: None,
                subject_did: None,
                time: Utc::now().to_rfc3339(),
            })
        })
    }

    /// The latest non-reversed action against `did`.
    pub fn current_action(&self, did: &Did) -> Result<Option<ModerationAction>> {
        let log = self.action_log()?;
        let reversed: HashSet<u64> = log
            .iter()
            .filter(|e| e.op == ActionLogOp::Reverse)
            .map(|e| e.id)
            .collect();

        Ok(log
            .iter()
            .filter_map(ActionLogEntry::as_action)
            .filter(|a| &a.subject_did == did && !reversed.contains(&a.id))
            .max_by_key(|a| a.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, FileStore) {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        (tmp, store)
    }

    fn handle(s: &str) -> Handle {
        Handle::new(s).unwrap()
    }

    #[test]
    fn test_create_and_get_account() {
        let (_tmp, store) = create_test_store();

        let repo = store
            .create_account(&handle("alice.test"), Some("alice@example.com"))
            .unwrap();
        assert!(repo.did.as_str().starts_with("did:plc:"));

        let stored = store.get_account(&repo.did).unwrap().unwrap();
        assert_eq!(stored, repo);
        assert_eq!(stored.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn test_handles_are_unique() {
        let (_tmp, store) = create_test_store();

        store.create_account(&handle("alice.test"), None).unwrap();
        let err = store
            .create_account(&handle("alice.test"), None)
            .unwrap_err();
        assert!(err.to_string().contains("taken"));
    }

    #[test]
    fn test_corrupt_account_fails_reads() {
        let (_tmp, store) = create_test_store();

        store.create_account(&handle("a.test"), None).unwrap();
        let b = store.create_account(&handle("b.test"), None).unwrap();
        store.create_account(&handle("c.test"), None).unwrap();
        fs::write(store.account_path(&b.did).unwrap(), "{ truncated").unwrap();

        let err = store.list_accounts().unwrap_err();
        assert_eq!(err.kind(), "StoreUnavailable");
        let err = store.get_account(&b.did).unwrap_err();
        assert_eq!(err.kind(), "StoreUnavailable");
    }

    #[test]
    fn test_did_dir_name_is_one_component() {
        let did = Did::new("did:web:example.com:user:alice").unwrap();
        assert_eq!(
            FileStore::did_dir_name(&did).unwrap(),
            "did_web_example.com_user_alice"
        );
    }

    #[test]
    fn test_update_handle_keeps_indexed_at() {
        let (_tmp, store) = create_test_store();

        let repo = store.create_account(&handle("alice.test"), None).unwrap();
        let renamed = store.update_handle(&repo.did, &handle("alicia.test")).unwrap();

        assert_eq!(renamed.indexed_at, repo.indexed_at);
        assert!(store.find_account_by_handle(&handle("alice.test")).unwrap().is_none());
        assert_eq!(store.list_accounts().unwrap(), vec![renamed]);
    }

    #[test]
    fn test_list_records_sorted_and_skips_garbage() {
        let (_tmp, store) = create_test_store();
        let did = Did::new("did:plc:test123").unwrap();
        let collection = Nsid::new(PROFILE_COLLECTION).unwrap();

        for rkey in ["b", "a"] {
            let value = RecordValue::new(json!({
                "$type": PROFILE_COLLECTION,
                "displayName": rkey,
            }))
            .unwrap();
            store.put_record(&did, &collection, rkey, &value).unwrap();
        }
        let dir = store.collection_dir(&did, &collection).unwrap();
        fs::write(dir.join("c.json"), "not json").unwrap();

        let rkeys: Vec<_> = store
            .list_records(&did, &collection)
            .unwrap()
            .into_iter()
            .map(|(rkey, _)| rkey)
            .collect();
        assert_eq!(rkeys, ["a", "b"]);
    }

    #[test]
    fn test_rejects_path_like_rkeys() {
        let (_tmp, store) = create_test_store();
        let did = Did::new("did:plc:test123").unwrap();
        let collection = Nsid::new(PROFILE_COLLECTION).unwrap();
        let value = RecordValue::new(json!({ "$type": PROFILE_COLLECTION })).unwrap();

        assert!(store.put_record(&did, &collection, "../x", &value).is_err());
    }

    #[test]
    fn test_moderation_log_replay() {
        let (_tmp, store) = create_test_store();
        let repo = store.create_account(&handle("alice.test"), None).unwrap();

        assert!(store.current_action(&repo.did).unwrap().is_none());

        let flag = store.take_action(&repo.did, ActionKind::Flag).unwrap();
        let takedown = store.take_action(&repo.did, ActionKind::Takedown).unwrap();
        assert_eq!(takedown.id, flag.id + 1);
        assert_eq!(store.current_action(&repo.did).unwrap(), Some(takedown.clone()));

        store.reverse_action(takedown.id).unwrap();
        assert_eq!(store.current_action(&repo.did).unwrap(), Some(flag));

        assert!(store.reverse_action(99).is_err());
        assert_eq!(store.action_log().unwrap().len(), 3);
    }

    #[test]
    fn test_action_requires_account() {
        let (_tmp, store) = create_test_store();
        let did = Did::new("did:plc:missing").unwrap();
        assert!(store.take_action(&did, ActionKind::Takedown).is_err());
    }
}
