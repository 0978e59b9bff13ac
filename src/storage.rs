//! Key-value persistence for the access token and cached claims.
//!
//! [`KeyValueStore`] is the pluggable contract; [`MemoryStore`] keeps
//! values for the life of the process and [`FileStore`] writes them
//! through to a JSON file. [`Credentials`] reads and writes the two keys
//! the client cares about under the configured prefix.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{OnixError, Result};

/// Subject used when no claims are available.
pub const ANONYMOUS_SUBJECT: &str = "$anonymous";

/// String key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
    /// Remove every key.
    fn clear(&self) -> Result<()>;
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.lock().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.items.lock().clear();
        Ok(())
    }
}

/// Store persisted as a JSON object in a single file.
///
/// Every mutation rewrites the whole file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, loading existing content if the file exists.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let items = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                OnixError::Storage(format!("{} is not a valid store: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<()> {
        let content = serde_json::to_string_pretty(items)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.lock();
        items.insert(key.to_string(), value.to_string());
        self.persist(&items)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.items.lock();
        if items.remove(key).is_some() {
            self.persist(&items)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut items = self.items.lock();
        items.clear();
        self.persist(&items)
    }
}

/// OIDC claims of the current user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, sent as `caller` on every call.
    pub sub: String,
    /// Every other claim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    pub fn new(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            extra: Map::new(),
        }
    }

    /// Claims used when nobody is logged in.
    pub fn anonymous() -> Self {
        Self::new(ANONYMOUS_SUBJECT)
    }

    pub fn is_anonymous(&self) -> bool {
        self.sub == ANONYMOUS_SUBJECT
    }
}

/// Token and claims persisted under a key prefix.
#[derive(Clone)]
pub struct Credentials {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl Credentials {
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    fn token_key(&self) -> String {
        format!("{}:access_token", self.prefix)
    }

    fn claims_key(&self) -> String {
        format!("{}:claims", self.prefix)
    }

    /// Stored access token. An empty string counts as no token.
    pub fn token(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get_item(&self.token_key())?
            .filter(|token| !token.is_empty()))
    }

    pub fn set_token(&self, token: &str) -> Result<()> {
        self.store.set_item(&self.token_key(), token)
    }

    /// Persisted claims, if any.
    pub fn stored_claims(&self) -> Result<Option<Claims>> {
        match self.store.get_item(&self.claims_key())? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn set_claims(&self, claims: &Claims) -> Result<()> {
        let raw = serde_json::to_string(claims)?;
        self.store.set_item(&self.claims_key(), &raw)
    }

    /// Subject to send as `caller`: persisted claims or anonymous.
    pub fn subject(&self) -> Result<String> {
        Ok(self
            .stored_claims()?
            .map_or_else(|| ANONYMOUS_SUBJECT.to_string(), |c| c.sub))
    }

    /// Wipe the store.
    pub fn logout(&self) -> Result<()> {
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn credentials() -> Credentials {
        Credentials::new(Arc::new(MemoryStore::new()), "test")
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get_item("a").unwrap(), None);

        store.set_item("a", "1").unwrap();
        assert_eq!(store.get_item("a").unwrap(), Some("1".to_string()));

        store.remove_item("a").unwrap();
        assert_eq!(store.get_item("a").unwrap(), None);

        store.set_item("b", "2").unwrap();
        store.clear().unwrap();
        assert_eq!(store.get_item("b").unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let store = FileStore::open(&path).unwrap();
            store.set_item("onixjs:sdk:access_token", "abc").unwrap();
            store.set_item("other", "x").unwrap();
            store.remove_item("other").unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(
            store.get_item("onixjs:sdk:access_token").unwrap(),
            Some("abc".to_string())
        );
        assert_eq!(store.get_item("other").unwrap(), None);

        store.clear().unwrap();
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get_item("onixjs:sdk:access_token").unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "[not a map").unwrap();

        assert!(matches!(FileStore::open(&path), Err(OnixError::Storage(_))));
    }

    #[test]
    fn test_token_uses_prefix() {
        let store = Arc::new(MemoryStore::new());
        let creds = Credentials::new(store.clone(), "app");

        assert_eq!(creds.token().unwrap(), None);
        creds.set_token("t0k3n").unwrap();

        assert_eq!(creds.token().unwrap(), Some("t0k3n".to_string()));
        assert_eq!(
            store.get_item("app:access_token").unwrap(),
            Some("t0k3n".to_string())
        );
    }

    #[test]
    fn test_empty_token_is_none() {
        let creds = credentials();
        creds.set_token("").unwrap();
        assert_eq!(creds.token().unwrap(), None);
    }

    #[test]
    fn test_claims_round_trip_keeps_extra() {
        let creds = credentials();
        let claims: Claims =
            serde_json::from_value(json!({ "sub": "user-1", "email": "a@b.c" })).unwrap();

        creds.set_claims(&claims).unwrap();
        let stored = creds.stored_claims().unwrap().unwrap();

        assert_eq!(stored.sub, "user-1");
        assert_eq!(stored.extra.get("email"), Some(&json!("a@b.c")));
        assert_eq!(creds.subject().unwrap(), "user-1");
    }

    #[test]
    fn test_subject_defaults_to_anonymous() {
        let creds = credentials();
        assert_eq!(creds.subject().unwrap(), "$anonymous");
        assert!(Claims::anonymous().is_anonymous());
    }

    #[test]
    fn test_logout_clears_everything() {
        let creds = credentials();
        creds.set_token("t").unwrap();
        creds.set_claims(&Claims::new("u")).unwrap();

        creds.logout().unwrap();

        assert_eq!(creds.token().unwrap(), None);
        assert_eq!(creds.stored_claims().unwrap(), None);
    }
}
