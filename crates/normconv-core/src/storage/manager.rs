use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::ChildInfo;
use crate::scores::ScoreEntryState;
use crate::selection::SelectionState;

/// Envelope version. Files written with another version are discarded on load.
pub const STORAGE_VERSION: u32 = 1;

const CHILD_INFO_KEY: &str = "norm-converter-child-info";
const SCORE_ENTRY_KEY: &str = "norm-converter-score-entry";
const TEST_SELECTION_KEY: &str = "norm-converter-test-selection";

const ALL_KEYS: [&str; 3] = [CHILD_INFO_KEY, SCORE_ENTRY_KEY, TEST_SELECTION_KEY];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persisted<T> {
    pub state: T,
    pub version: u32,
    #[serde(rename = "savedAt")]
    pub saved_at: DateTime<Utc>,
}

impl<T> Persisted<T> {
    pub fn new(state: T) -> Self {
        Self {
            state,
            version: STORAGE_VERSION,
            saved_at: Utc::now(),
        }
    }
}

/// Everything one clinician session keeps between runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub child: Option<ChildInfo>,
    pub selection: SelectionState,
    pub scores: ScoreEntryState,
}

/// Reads and writes the session's state containers as JSON files, one per
/// container, in a single directory.
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create session directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<Persisted<T>>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read session file: {}", key))?;

        let persisted: Persisted<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session file: {}", key))?;

        if persisted.version != STORAGE_VERSION {
            warn!(key, version = persisted.version, "Discarding session file with unknown version");
            return Ok(None);
        }

        Ok(Some(persisted))
    }

    fn save<T: Serialize>(&self, key: &str, state: &T) -> Result<()> {
        let persisted = Persisted::new(state);
        let contents = serde_json::to_string_pretty(&persisted)?;
        std::fs::write(self.path(key), contents)
            .with_context(|| format!("Failed to write session file: {}", key))?;
        debug!(key, "Session file saved");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove session file: {}", key))?;
        }
        Ok(())
    }

    // ===== Child info =====

    pub fn load_child_info(&self) -> Result<Option<ChildInfo>> {
        Ok(self
            .load::<Option<ChildInfo>>(CHILD_INFO_KEY)?
            .and_then(|p| p.state))
    }

    pub fn save_child_info(&self, child: Option<&ChildInfo>) -> Result<()> {
        self.save(CHILD_INFO_KEY, &child)
    }

    // ===== Scores =====

    pub fn load_scores(&self) -> Result<ScoreEntryState> {
        Ok(self
            .load::<ScoreEntryState>(SCORE_ENTRY_KEY)?
            .map(|p| p.state)
            .unwrap_or_default())
    }

    pub fn save_scores(&self, scores: &ScoreEntryState) -> Result<()> {
        self.save(SCORE_ENTRY_KEY, scores)
    }

    // ===== Selection =====

    pub fn load_selection(&self) -> Result<SelectionState> {
        Ok(self
            .load::<SelectionState>(TEST_SELECTION_KEY)?
            .map(|p| p.state)
            .unwrap_or_default())
    }

    pub fn save_selection(&self, selection: &SelectionState) -> Result<()> {
        self.save(TEST_SELECTION_KEY, selection)
    }

    // ===== Whole session =====

    pub fn load_all(&self) -> Result<SessionState> {
        Ok(SessionState {
            child: self.load_child_info()?,
            selection: self.load_selection()?,
            scores: self.load_scores()?,
        })
    }

    pub fn save_all(&self, state: &SessionState) -> Result<()> {
        self.save_child_info(state.child.as_ref())?;
        self.save_selection(&state.selection)?;
        self.save_scores(&state.scores)
    }

    /// Remove every stored container.
    pub fn clear_all(&self) -> Result<()> {
        for key in ALL_KEYS {
            self.remove(key)?;
        }
        debug!(dir = %self.dir.display(), "Session cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, ToolId};
    use chrono::NaiveDate;

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("default")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_missing_files_load_as_empty() {
        let (_dir, store) = store();
        assert_eq!(store.load_all().unwrap(), SessionState::default());
    }

    #[test]
    fn test_envelope_shape() {
        let (_dir, store) = store();
        let mut selection = SelectionState::new();
        selection.add(ToolId::Selsi);
        store.save_selection(&selection).unwrap();

        let raw = std::fs::read_to_string(store.path(TEST_SELECTION_KEY)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["state"]["selectedTools"], serde_json::json!(["selsi"]));
        assert_eq!(value["version"], STORAGE_VERSION);
        assert!(value["savedAt"].is_string());
    }

    #[test]
    fn test_child_info_accepts_timestamp_dates() {
        let (_dir, store) = store();
        let raw = format!(
            r#"{{"state":{{"name":"이서준","gender":"male","birthDate":"2020-05-01","testDate":"2023-05-20"}},"version":{},"savedAt":"2023-05-20T01:00:00Z"}}"#,
            STORAGE_VERSION
        );
        std::fs::write(store.path(CHILD_INFO_KEY), raw).unwrap();

        let child = store.load_child_info().unwrap().unwrap();
        assert_eq!(child.name, "이서준");
        assert_eq!(child.gender, Gender::Male);
        assert_eq!(child.birth_date, NaiveDate::from_ymd_opt(2020, 5, 1).unwrap());
    }

    #[test]
    fn test_unknown_version_is_discarded() {
        let (_dir, store) = store();
        std::fs::write(
            store.path(TEST_SELECTION_KEY),
            r#"{"state":{"selectedTools":["pres"]},"version":99,"savedAt":"2023-05-20T01:00:00Z"}"#,
        )
        .unwrap();
        assert!(store.load_selection().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let (_dir, store) = store();
        std::fs::write(store.path(SCORE_ENTRY_KEY), "{not json").unwrap();
        let err = store.load_scores().unwrap_err();
        assert!(err.to_string().contains(SCORE_ENTRY_KEY));
    }

    #[test]
    fn test_clear_all_removes_files() {
        let (_dir, store) = store();
        store.save_all(&SessionState::default()).unwrap();
        assert!(store.path(SCORE_ENTRY_KEY).exists());
        store.clear_all().unwrap();
        for key in ALL_KEYS {
            assert!(!store.path(key).exists());
        }
        store.clear_all().unwrap();
    }
}
