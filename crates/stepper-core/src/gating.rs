use crate::error::Result;
use crate::state::WizardState;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// A prior, non-skippable step is below 100%.
    Incomplete,
    /// The step being left has a payload whose last save failed.
    UnsavedPayload,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DenyReason::Incomplete => "incomplete",
            DenyReason::UnsavedPayload => "unsaved_payload",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Allowed,
    Denied {
        blocking_step: String,
        reason: DenyReason,
    },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    pub fn blocking_step(&self) -> Option<&str> {
        match self {
            Decision::Allowed => None,
            Decision::Denied { blocking_step, .. } => Some(blocking_step.as_str()),
        }
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Decide whether `target` may become the active step.
///
/// Going backward or staying put is always allowed. Going forward requires
/// every non-skippable step ordered before `target` to be complete; the
/// first one that is not becomes the blocking step.
pub fn check(state: &WizardState, target: &str) -> Result<Decision> {
    let registry = state.registry();
    let target_ordinal = registry.ordinal_of(target)?;
    let active_ordinal = registry.ordinal_of(state.active_step_id())?;

    if target_ordinal <= active_ordinal {
        return Ok(Decision::Allowed);
    }

    Ok(match first_blocking(state, target)? {
        Some(step) => Decision::Denied {
            blocking_step: step.to_string(),
            reason: DenyReason::Incomplete,
        },
        None => Decision::Allowed,
    })
}

/// First non-skippable, incomplete step ordered before `target`, ignoring
/// where the wizard currently is.
pub fn first_blocking<'s>(state: &'s WizardState, target: &str) -> Result<Option<&'s str>> {
    for step in state.registry().before(target)? {
        if !step.skippable && !state.store().is_complete(&step.id)? {
            return Ok(Some(step.id.as_str()));
        }
    }
    Ok(None)
}

/// Like [`check`], but additionally denies leaving the active step forward
/// while its latest payload save has failed.
pub fn check_with_saves(state: &WizardState, target: &str) -> Result<Decision> {
    let decision = check(state, target)?;
    if !decision.is_allowed() {
        return Ok(decision);
    }
    let registry = state.registry();
    let active = state.active_step_id();
    if registry.ordinal_of(target)? > registry.ordinal_of(active)? && state.is_unsaved(active) {
        return Ok(Decision::Denied {
            blocking_step: active.to_string(),
            reason: DenyReason::UnsavedPayload,
        });
    }
    Ok(decision)
}

pub fn can_navigate(state: &WizardState, target: &str) -> Result<bool> {
    check(state, target).map(|d| d.is_allowed())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
