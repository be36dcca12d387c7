//! Core PlanStore implementation

use eyre::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Filename prefix separating session documents from plan documents
const SESSION_PREFIX: &str = "session_";

/// Directory-backed store of named JSON documents
pub struct PlanStore {
    /// Base path for document files
    docs_dir: PathBuf,
}

impl PlanStore {
    /// Open or create a store at the given directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let docs_dir = path.as_ref().to_path_buf();
        fs::create_dir_all(&docs_dir).context("Failed to create plan store directory")?;
        debug!(?docs_dir, "Opened plan store");
        Ok(Self { docs_dir })
    }

    /// Resolve a document name to its file path, sanitizing hostile characters
    fn doc_path(&self, name: &str) -> PathBuf {
        let safe: String = name
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.docs_dir.join(format!("{}.json", safe))
    }

    fn write_doc<T: Serialize>(&self, name: &str, doc: &T) -> Result<PathBuf> {
        let path = self.doc_path(name);
        let json = serde_json::to_string_pretty(doc).context("Failed to serialize document")?;
        fs::write(&path, json).context(format!("Failed to write document: {}", path.display()))?;
        debug!(%name, path = %path.display(), "Saved document");
        Ok(path)
    }

    /// Load a document by name
    ///
    /// Missing and unreadable documents both yield `None`; a corrupt file is
    /// logged and skipped rather than surfaced as an error.
    fn read_doc<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.doc_path(name);
        if !path.exists() {
            return None;
        }

        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!(%name, error = %e, "Failed to read document");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(%name, error = %e, "Failed to parse document");
                None
            }
        }
    }

    fn remove_doc(&self, name: &str) -> bool {
        let path = self.doc_path(name);
        if path.exists() {
            if let Err(e) = fs::remove_file(&path) {
                warn!(%name, error = %e, "Failed to delete document");
                return false;
            }
            return true;
        }
        false
    }

    /// Save a plan document, returning the file path
    pub fn save_plan<T: Serialize>(&self, name: &str, plan: &T) -> Result<PathBuf> {
        self.write_doc(name, plan)
    }

    /// Load a plan document by name
    pub fn load_plan<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.read_doc(name)
    }

    /// Delete a plan, returning whether a file was removed
    pub fn delete_plan(&self, name: &str) -> bool {
        self.remove_doc(name)
    }

    /// Save a session document under the session namespace
    pub fn save_session<T: Serialize>(&self, name: &str, session: &T) -> Result<PathBuf> {
        self.write_doc(&format!("{}{}", SESSION_PREFIX, name), session)
    }

    /// Load a session document by name
    pub fn load_session<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.read_doc(&format!("{}{}", SESSION_PREFIX, name))
    }

    /// Delete a session, returning whether a file was removed
    pub fn delete_session(&self, name: &str) -> bool {
        self.remove_doc(&format!("{}{}", SESSION_PREFIX, name))
    }

    /// List saved plan names, sorted
    pub fn list_plans(&self) -> Result<Vec<String>> {
        Ok(self
            .json_stems()?
            .into_iter()
            .filter(|stem| !stem.starts_with(SESSION_PREFIX))
            .collect())
    }

    /// List saved session names, sorted
    pub fn list_sessions(&self) -> Result<Vec<String>> {
        Ok(self
            .json_stems()?
            .into_iter()
            .filter_map(|stem| stem.strip_prefix(SESSION_PREFIX).map(str::to_string))
            .collect())
    }

    fn json_stems(&self) -> Result<Vec<String>> {
        let pattern = self.docs_dir.join("*.json");
        let pattern = pattern.to_string_lossy();
        let mut stems = Vec::new();

        for entry in glob::glob(&pattern).context("Invalid store glob pattern")? {
            let path = entry?;
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                stems.push(stem.to_string());
            }
        }

        stems.sort();
        Ok(stems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Doc {
        title: String,
        days: Vec<u32>,
    }

    fn sample() -> Doc {
        Doc {
            title: "Lisbon".to_string(),
            days: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_save_and_load_plan() {
        let temp = TempDir::new().unwrap();
        let store = PlanStore::open(temp.path()).unwrap();

        let path = store.save_plan("lisbon", &sample()).unwrap();
        assert!(path.exists());

        let loaded: Option<Doc> = store.load_plan("lisbon");
        assert_eq!(loaded, Some(sample()));
    }

    #[test]
    fn test_load_missing_plan_is_none() {
        let temp = TempDir::new().unwrap();
        let store = PlanStore::open(temp.path()).unwrap();

        let loaded: Option<Doc> = store.load_plan("nope");
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_corrupt_plan_is_none() {
        let temp = TempDir::new().unwrap();
        let store = PlanStore::open(temp.path()).unwrap();

        std::fs::write(temp.path().join("bad.json"), "{not json").unwrap();
        let loaded: Option<Doc> = store.load_plan("bad");
        assert!(loaded.is_none());
    }

    #[test]
    fn test_hostile_names_are_sanitized() {
        let temp = TempDir::new().unwrap();
        let store = PlanStore::open(temp.path()).unwrap();

        store.save_plan("../escape/attempt", &sample()).unwrap();

        // The document stays inside the store directory
        let plans = store.list_plans().unwrap();
        assert_eq!(plans, vec![".._escape_attempt".to_string()]);
        let loaded: Option<Doc> = store.load_plan("../escape/attempt");
        assert_eq!(loaded, Some(sample()));
    }

    #[test]
    fn test_plans_and_sessions_are_separate() {
        let temp = TempDir::new().unwrap();
        let store = PlanStore::open(temp.path()).unwrap();

        store.save_plan("trip", &sample()).unwrap();
        store.save_session("trip", &sample()).unwrap();

        assert_eq!(store.list_plans().unwrap(), vec!["trip".to_string()]);
        assert_eq!(store.list_sessions().unwrap(), vec!["trip".to_string()]);

        assert!(store.delete_session("trip"));
        assert!(store.list_sessions().unwrap().is_empty());
        assert_eq!(store.list_plans().unwrap(), vec!["trip".to_string()]);
    }

    #[test]
    fn test_delete_missing_returns_false() {
        let temp = TempDir::new().unwrap();
        let store = PlanStore::open(temp.path()).unwrap();

        assert!(!store.delete_plan("ghost"));
    }

    #[test]
    fn test_list_plans_sorted() {
        let temp = TempDir::new().unwrap();
        let store = PlanStore::open(temp.path()).unwrap();

        store.save_plan("zanzibar", &sample()).unwrap();
        store.save_plan("andes", &sample()).unwrap();

        assert_eq!(
            store.list_plans().unwrap(),
            vec!["andes".to_string(), "zanzibar".to_string()]
        );
    }
}
