use crate::error::Result;
use crate::progress::{ProgressStore, StepProgress};
use crate::registry::StepRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const HISTORY_LIMIT: usize = 200;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub from: String,
    pub to: String,
    pub at: DateTime<Utc>,
}

/// Persisted form of a wizard session.
///
/// Everything is optional on the way in: a snapshot written by an older
/// wizard definition may name steps that no longer exist, and those are
/// dropped when the state is rebuilt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_step: Option<String>,
    #[serde(default)]
    pub progress: Vec<StepProgress>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,
    /// Steps whose latest payload save failed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unsaved: Vec<String>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

impl WizardSnapshot {
    pub fn empty() -> Self {
        Self {
            version: 1,
            active_step: None,
            progress: Vec::new(),
            history: Vec::new(),
            unsaved: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn progress_for(&self, step_id: &str) -> Option<&StepProgress> {
        self.progress.iter().find(|p| p.step_id == step_id)
    }
}

// ---------------------------------------------------------------------------
// WizardState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WizardState {
    active_step_id: String,
    store: ProgressStore,
    history: Vec<HistoryEntry>,
    /// Steps whose most recent payload save failed.
    unsaved: BTreeSet<String>,
    updated_at: DateTime<Utc>,
}

impl WizardState {
    pub fn new(registry: StepRegistry) -> Self {
        let active_step_id = registry.first().id.clone();
        Self {
            active_step_id,
            store: ProgressStore::new(registry),
            history: Vec::new(),
            unsaved: BTreeSet::new(),
            updated_at: Utc::now(),
        }
    }

    /// Rebuild state from a persisted snapshot.
    ///
    /// Entries for unknown steps are skipped with a warning. Percents are
    /// re-clamped and composite steps recomputed from their sections, so a
    /// hand-edited file cannot break the `0..=100` invariant.
    pub fn from_snapshot(registry: StepRegistry, snapshot: &WizardSnapshot) -> Result<Self> {
        let mut state = Self::new(registry);

        for record in &snapshot.progress {
            if !state.store.registry().contains(&record.step_id) {
                tracing::warn!(step = %record.step_id, "dropping progress for unknown step");
                continue;
            }
            let step = state.store.registry().get(&record.step_id)?.clone();
            state
                .store
                .set_payload(&record.step_id, record.payload.clone())?;
            if step.is_composite() && !record.sections.is_empty() {
                for (section, pct) in &record.sections {
                    if step.section(section).is_none() {
                        tracing::warn!(step = %step.id, %section, "dropping unknown section");
                        continue;
                    }
                    state
                        .store
                        .set_section(&step.id, section, i64::from(*pct))?;
                }
            } else {
                state
                    .store
                    .set_percent(&record.step_id, i64::from(record.percent))?;
            }
        }

        if let Some(active) = &snapshot.active_step {
            if state.store.registry().contains(active) {
                state.active_step_id = active.clone();
            } else {
                tracing::warn!(step = %active, "persisted active step is unknown; starting over");
            }
        }

        for step_id in &snapshot.unsaved {
            if state.store.registry().contains(step_id) {
                state.unsaved.insert(step_id.clone());
            }
        }

        state.history = snapshot.history.clone();
        trim_history(&mut state.history);
        state.updated_at = snapshot.updated_at;
        Ok(state)
    }

    pub fn to_snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            version: 1,
            active_step: Some(self.active_step_id.clone()),
            progress: self.store.snapshot(),
            history: self.history.clone(),
            unsaved: self.unsaved.iter().cloned().collect(),
            updated_at: self.updated_at,
        }
    }

    // ---------------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------------

    pub fn active_step_id(&self) -> &str {
        &self.active_step_id
    }

    pub fn registry(&self) -> &StepRegistry {
        self.store.registry()
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_unsaved(&self, step_id: &str) -> bool {
        self.unsaved.contains(step_id)
    }

    // ---------------------------------------------------------------------------
    // Mutations (controller only)
    // ---------------------------------------------------------------------------

    pub(crate) fn store_mut(&mut self) -> &mut ProgressStore {
        self.updated_at = Utc::now();
        &mut self.store
    }

    pub(crate) fn move_to(&mut self, target: &str) {
        if target == self.active_step_id {
            return;
        }
        self.history.push(HistoryEntry {
            from: self.active_step_id.clone(),
            to: target.to_string(),
            at: Utc::now(),
        });
        trim_history(&mut self.history);
        self.active_step_id = target.to_string();
        self.updated_at = Utc::now();
    }

    /// Reposition without recording history; used when a resume point is
    /// corrected on load.
    pub(crate) fn rewind_to(&mut self, target: &str) {
        self.active_step_id = target.to_string();
    }

    pub(crate) fn mark_saved(&mut self, step_id: &str, saved: bool) {
        if saved {
            self.unsaved.remove(step_id);
        } else {
            self.unsaved.insert(step_id.to_string());
        }
    }
}

fn trim_history(history: &mut Vec<HistoryEntry>) {
    if history.len() > HISTORY_LIMIT {
        history.drain(..history.len() - HISTORY_LIMIT);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
