use crate::error::{Result, StepperError};
use crate::paths;
use crate::progress::StepProgress;
use crate::state::WizardSnapshot;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// PersistenceAdapter
// ---------------------------------------------------------------------------

/// Storage behind a wizard session.
///
/// The controller only ever reads once (at construction) and writes either a
/// single step payload or the whole session. A missing record is `Ok(None)`,
/// not an error.
pub trait PersistenceAdapter {
    fn load_wizard_state(&self, session_key: &str) -> Result<Option<WizardSnapshot>>;

    fn save_step_payload(&mut self, session_key: &str, step_id: &str, payload: &Value)
        -> Result<()>;

    fn save_wizard_state(&mut self, session_key: &str, snapshot: &WizardSnapshot) -> Result<()>;
}

fn upsert_payload(snapshot: &mut WizardSnapshot, step_id: &str, payload: &Value) {
    match snapshot.progress.iter_mut().find(|p| p.step_id == step_id) {
        Some(entry) => entry.payload = payload.clone(),
        None => {
            let mut entry = StepProgress::new(step_id);
            entry.payload = payload.clone();
            snapshot.progress.push(entry);
        }
    }
    snapshot.updated_at = Utc::now();
}

// ---------------------------------------------------------------------------
// MemoryAdapter
// ---------------------------------------------------------------------------

/// Process-local adapter. `fail_saves` makes every write fail, which is how
/// an unreachable backend looks to the controller.
#[derive(Debug, Default, Clone)]
pub struct MemoryAdapter {
    sessions: HashMap<String, WizardSnapshot>,
    pub fail_saves: bool,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, session_key: impl Into<String>, snapshot: WizardSnapshot) -> Self {
        self.sessions.insert(session_key.into(), snapshot);
        self
    }

    pub fn with_failing_saves(mut self, fail: bool) -> Self {
        self.fail_saves = fail;
        self
    }

    pub fn session(&self, session_key: &str) -> Option<&WizardSnapshot> {
        self.sessions.get(session_key)
    }

    fn check_online(&self) -> Result<()> {
        if self.fail_saves {
            return Err(StepperError::Persistence("backend unavailable".to_string()));
        }
        Ok(())
    }
}

impl PersistenceAdapter for MemoryAdapter {
    fn load_wizard_state(&self, session_key: &str) -> Result<Option<WizardSnapshot>> {
        Ok(self.sessions.get(session_key).cloned())
    }

    fn save_step_payload(
        &mut self,
        session_key: &str,
        step_id: &str,
        payload: &Value,
    ) -> Result<()> {
        self.check_online()?;
        let snapshot = self
            .sessions
            .entry(session_key.to_string())
            .or_insert_with(WizardSnapshot::empty);
        upsert_payload(snapshot, step_id, payload);
        Ok(())
    }

    fn save_wizard_state(&mut self, session_key: &str, snapshot: &WizardSnapshot) -> Result<()> {
        self.check_online()?;
        self.sessions
            .insert(session_key.to_string(), snapshot.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileAdapter
// ---------------------------------------------------------------------------

/// One YAML file per session at `.stepper/sessions/<wizard>/<session>.yaml`.
#[derive(Debug, Clone)]
pub struct FileAdapter {
    root: PathBuf,
    wizard: String,
}

impl FileAdapter {
    pub fn new(root: impl Into<PathBuf>, wizard: impl Into<String>) -> Result<Self> {
        let wizard = wizard.into();
        paths::validate_step_id(&wizard)?;
        Ok(Self {
            root: root.into(),
            wizard,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn wizard(&self) -> &str {
        &self.wizard
    }

    pub fn session_path(&self, session_key: &str) -> Result<PathBuf> {
        paths::validate_session_key(session_key)?;
        Ok(paths::session_path(&self.root, &self.wizard, session_key))
    }

    fn read(&self, path: &Path) -> Result<Option<WizardSnapshot>> {
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(path)?;
        let snapshot: WizardSnapshot = serde_yaml::from_str(&data)?;
        Ok(Some(snapshot))
    }

    fn write(&self, path: &Path, snapshot: &WizardSnapshot) -> Result<()> {
        let data = serde_yaml::to_string(snapshot)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// Remove a session file. Returns true if one existed.
    pub fn delete(&self, session_key: &str) -> Result<bool> {
        let path = self.session_path(session_key)?;
        crate::io::remove_if_exists(&path)
    }

    /// Session keys with a stored record, sorted.
    pub fn list_sessions(&self) -> Result<Vec<String>> {
        let dir = paths::wizard_sessions_dir(&self.root, &self.wizard);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(paths::SESSION_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl PersistenceAdapter for FileAdapter {
    fn load_wizard_state(&self, session_key: &str) -> Result<Option<WizardSnapshot>> {
        let path = self.session_path(session_key)?;
        self.read(&path)
    }

    fn save_step_payload(
        &mut self,
        session_key: &str,
        step_id: &str,
        payload: &Value,
    ) -> Result<()> {
        let path = self.session_path(session_key)?;
        let mut snapshot = self.read(&path)?.unwrap_or_else(WizardSnapshot::empty);
        upsert_payload(&mut snapshot, step_id, payload);
        self.write(&path, &snapshot)
    }

    fn save_wizard_state(&mut self, session_key: &str, snapshot: &WizardSnapshot) -> Result<()> {
        let path = self.session_path(session_key)?;
        self.write(&path, snapshot)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
