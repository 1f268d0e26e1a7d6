use crate::error::{Result, StepperError};
use crate::form::FormSet;
use crate::gating::{self, Decision, DenyReason};
use crate::persistence::PersistenceAdapter;
use crate::progress::StepProgress;
use crate::registry::StepRegistry;
use crate::state::WizardState;
use crate::types::Step;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Navigation {
    Moved {
        from: String,
        to: String,
    },
    Denied {
        blocking_step: String,
        reason: DenyReason,
    },
    /// `advance()` on the last step.
    AtEnd,
    /// `back()` on the first step.
    AtStart,
}

impl Navigation {
    pub fn is_moved(&self) -> bool {
        matches!(self, Navigation::Moved { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved,
    /// The payload is kept in memory; only the backend write failed.
    Failed { reason: String },
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerOptions {
    /// Deny forward navigation off a step whose latest save failed.
    #[serde(default)]
    pub block_on_unsaved: bool,
}

// ---------------------------------------------------------------------------
// ActiveStep
// ---------------------------------------------------------------------------

/// Write access to the active step only. Handed to forms by
/// [`WizardController::render`] and returned by [`WizardController::active`].
pub struct ActiveStep<'c> {
    state: &'c mut WizardState,
    adapter: &'c mut dyn PersistenceAdapter,
    session_key: &'c str,
}

impl ActiveStep<'_> {
    pub fn step_id(&self) -> &str {
        self.state.active_step_id()
    }

    pub fn step(&self) -> Result<&Step> {
        self.state.registry().get(self.state.active_step_id())
    }

    pub fn progress(&self) -> Result<&StepProgress> {
        self.state.store().get(self.state.active_step_id())
    }

    pub fn report_percent(&mut self, percent: i64) -> Result<u8> {
        let id = self.state.active_step_id().to_string();
        let stored = self.state.store_mut().set_percent(&id, percent)?;
        tracing::debug!(step = %id, percent = stored, "percent reported");
        Ok(stored)
    }

    pub fn report_section(&mut self, section: &str, percent: i64) -> Result<u8> {
        let id = self.state.active_step_id().to_string();
        let stored = self.state.store_mut().set_section(&id, section, percent)?;
        tracing::debug!(step = %id, %section, percent = stored, "section reported");
        Ok(stored)
    }

    /// Store the payload in memory, then hand it to the adapter. A failed
    /// write is reported, never rolled back.
    pub fn save_payload(&mut self, payload: Value) -> Result<SaveOutcome> {
        let id = self.state.active_step_id().to_string();
        self.state.store_mut().set_payload(&id, payload.clone())?;
        match self
            .adapter
            .save_step_payload(self.session_key, &id, &payload)
        {
            Ok(()) => {
                self.state.mark_saved(&id, true);
                Ok(SaveOutcome::Saved)
            }
            Err(e) => {
                tracing::warn!(step = %id, error = %e, "payload save failed; keeping local copy");
                self.state.mark_saved(&id, false);
                Ok(SaveOutcome::Failed {
                    reason: e.to_string(),
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// WizardController
// ---------------------------------------------------------------------------

/// Owns one wizard session: the active step, per-step progress, and the
/// adapter the session is persisted through.
pub struct WizardController<A: PersistenceAdapter> {
    state: WizardState,
    adapter: A,
    session_key: String,
    options: ControllerOptions,
}

impl<A: PersistenceAdapter> WizardController<A> {
    pub fn new(registry: StepRegistry, adapter: A, session_key: impl Into<String>) -> Result<Self> {
        Self::with_options(registry, adapter, session_key, ControllerOptions::default())
    }

    /// Load the session from `adapter`, or start fresh at the first step.
    ///
    /// A persisted resume point ahead of incomplete work is pulled back to
    /// the first blocking step.
    pub fn with_options(
        registry: StepRegistry,
        adapter: A,
        session_key: impl Into<String>,
        options: ControllerOptions,
    ) -> Result<Self> {
        let session_key = session_key.into();
        let mut state = match adapter.load_wizard_state(&session_key)? {
            Some(snapshot) => WizardState::from_snapshot(registry, &snapshot)?,
            None => WizardState::new(registry),
        };

        let resume = state.active_step_id().to_string();
        let first = state.registry().first().id.clone();
        let blocking = gating::first_blocking(&state, &resume)?.map(str::to_string);
        if let Some(blocking) = blocking {
            tracing::info!(
                resume = %resume,
                blocking = %blocking,
                "resume point is gated; rewinding"
            );
            state.rewind_to(&blocking);
        } else if resume != first {
            tracing::debug!(resume = %resume, "resuming session");
        }

        Ok(Self {
            state,
            adapter,
            session_key,
            options,
        })
    }

    // ---------------------------------------------------------------------------
    // Read side
    // ---------------------------------------------------------------------------

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub fn options(&self) -> ControllerOptions {
        self.options
    }

    pub fn registry(&self) -> &StepRegistry {
        self.state.registry()
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    pub fn into_adapter(self) -> A {
        self.adapter
    }

    pub fn active_step_id(&self) -> &str {
        self.state.active_step_id()
    }

    pub fn active_step(&self) -> Result<&Step> {
        self.registry().get(self.active_step_id())
    }

    pub fn steps_progress(&self) -> Vec<StepProgress> {
        self.state.store().snapshot()
    }

    pub fn progress(&self, step_id: &str) -> Result<&StepProgress> {
        self.state.store().get(step_id)
    }

    /// The last step is complete. Nothing else happens at this point.
    pub fn is_finished(&self) -> bool {
        let last = &self.registry().last().id;
        self.state.store().is_complete(last).unwrap_or(false)
    }

    /// Mean of all step percents, rounded.
    pub fn overall_percent(&self) -> u8 {
        let entries = self.state.store().snapshot();
        let sum: u32 = entries.iter().map(|p| p.percent as u32).sum();
        let n = entries.len() as u32;
        ((sum + n / 2) / n) as u8
    }

    pub fn check(&self, target: &str) -> Result<Decision> {
        if self.options.block_on_unsaved {
            gating::check_with_saves(&self.state, target)
        } else {
            gating::check(&self.state, target)
        }
    }

    pub fn can_navigate(&self, target: &str) -> Result<bool> {
        self.check(target).map(|d| d.is_allowed())
    }

    // ---------------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------------

    pub fn request_navigate(&mut self, target: &str) -> Result<Navigation> {
        match self.check(target)? {
            Decision::Denied {
                blocking_step,
                reason,
            } => {
                tracing::debug!(
                    to = %target,
                    blocking = %blocking_step,
                    %reason,
                    "navigation denied"
                );
                Ok(Navigation::Denied {
                    blocking_step,
                    reason,
                })
            }
            Decision::Allowed => {
                let from = self.active_step_id().to_string();
                self.state.move_to(target);
                tracing::info!(from = %from, to = %target, "navigated");
                if let Err(e) = self.persist() {
                    tracing::warn!(error = %e, "failed to persist wizard position");
                }
                Ok(Navigation::Moved {
                    from,
                    to: target.to_string(),
                })
            }
        }
    }

    pub fn advance(&mut self) -> Result<Navigation> {
        let next = self
            .registry()
            .next_after(self.active_step_id())?
            .map(|s| s.id.clone());
        match next {
            Some(id) => self.request_navigate(&id),
            None => Ok(Navigation::AtEnd),
        }
    }

    pub fn back(&mut self) -> Result<Navigation> {
        let prev = self
            .registry()
            .previous_before(self.active_step_id())?
            .map(|s| s.id.clone());
        match prev {
            Some(id) => self.request_navigate(&id),
            None => Ok(Navigation::AtStart),
        }
    }

    // ---------------------------------------------------------------------------
    // Active step callbacks
    // ---------------------------------------------------------------------------

    pub fn active(&mut self) -> ActiveStep<'_> {
        ActiveStep {
            state: &mut self.state,
            adapter: &mut self.adapter,
            session_key: &self.session_key,
        }
    }

    pub fn report_percent(&mut self, percent: i64) -> Result<u8> {
        self.active().report_percent(percent)
    }

    pub fn report_section(&mut self, section: &str, percent: i64) -> Result<u8> {
        self.active().report_section(section, percent)
    }

    pub fn save_payload(&mut self, payload: Value) -> Result<SaveOutcome> {
        self.active().save_payload(payload)
    }

    /// Invoke the form bound to the active step with its saved payload.
    pub fn render(&mut self, forms: &FormSet) -> Result<()> {
        let id = self.active_step_id().to_string();
        let form = forms
            .get(&id)
            .ok_or_else(|| StepperError::NoFormBound(id.clone()))?;
        let payload = self.state.store().get(&id)?.payload.clone();
        let mut step = self.active();
        form.render(&payload, &mut step)
    }

    /// Write the whole session through the adapter.
    pub fn persist(&mut self) -> Result<()> {
        let snapshot = self.state.to_snapshot();
        self.adapter.save_wizard_state(&self.session_key, &snapshot)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
