//! Client-side key/value storage: the durable store that survives between
//! runs (bearer token, password prompt timestamps) and the process-scoped
//! store for values that must not outlive the process (session id).

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Bearer token for the current login.
pub const TOKEN_KEY: &str = "ayniline_token";
/// Per-process identifier used to correlate log lines.
pub const SESSION_ID_KEY: &str = "ayniline_session_id";
/// Prefix of the per-user "last password change prompt" timestamp.
pub const PASSWORD_PROMPT_KEY_PREFIX: &str = "ayniline_password_prompt_";

pub fn password_prompt_key(user_id: &str) -> String {
    format!("{PASSWORD_PROMPT_KEY_PREFIX}{user_id}")
}

pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

fn lock(
    map: &Mutex<BTreeMap<String, String>>,
) -> MutexGuard<'_, BTreeMap<String, String>> {
    // a poisoned map is still a valid map
    map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        lock(&self.values).insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        lock(&self.values).remove(key);
    }
}

/// A JSON object on disk, rewritten on every change.
///
/// Write failures are logged and otherwise ignored; the in-memory copy
/// stays authoritative for the rest of the process.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(
                |e| {
                    tracing::warn!(
                        path = %path.display(),
                        "Ignoring unreadable storage file: {e}"
                    );
                    BTreeMap::new()
                },
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                BTreeMap::new()
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    "Could not read storage file: {e}"
                );
                BTreeMap::new()
            }
        };
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    fn persist(&self, values: &BTreeMap<String, String>) {
        let result = serde_json::to_string_pretty(values)
            .map_err(std::io::Error::other)
            .and_then(|json| std::fs::write(&self.path, json));
        if let Err(e) = result {
            tracing::warn!(
                path = %self.path.display(),
                "Could not write storage file: {e}"
            );
        }
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = lock(&self.values);
        values.insert(key.to_string(), value.to_string());
        self.persist(&values);
    }

    fn remove(&self, key: &str) {
        let mut values = lock(&self.values);
        if values.remove(key).is_some() {
            self.persist(&values);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_survives_reopen() {
        let path = std::env::temp_dir()
            .join(format!("ayniline-storage-{}.json", std::process::id()));
        let storage = FileStorage::open(&path);
        storage.set(TOKEN_KEY, "abc");
        storage.set(&password_prompt_key("7"), "2025-01-01T00:00:00Z");

        let reopened = FileStorage::open(&path);
        assert_eq!(reopened.get(TOKEN_KEY).as_deref(), Some("abc"));
        reopened.remove(TOKEN_KEY);
        assert_eq!(FileStorage::open(&path).get(TOKEN_KEY), None);

        std::fs::remove_file(&path).unwrap();
    }
}
