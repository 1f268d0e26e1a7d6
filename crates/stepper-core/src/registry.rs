use crate::error::{Result, StepperError};
use crate::paths;
use crate::types::Step;
use std::collections::HashSet;

/// Ordered, immutable set of steps for one wizard.
///
/// Construction sorts by ordinal and rejects empty lists, duplicate ids,
/// duplicate ordinals, malformed ids and duplicate section ids. After that
/// the registry never changes for the lifetime of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRegistry {
    steps: Vec<Step>,
}

impl StepRegistry {
    pub fn new(mut steps: Vec<Step>) -> Result<Self> {
        if steps.is_empty() {
            return Err(StepperError::EmptyWizard);
        }

        let mut ids = HashSet::new();
        for step in &steps {
            paths::validate_step_id(&step.id)?;
            if !ids.insert(step.id.as_str()) {
                return Err(StepperError::DuplicateStep(step.id.clone()));
            }
            let mut sections = HashSet::new();
            for section in &step.sections {
                paths::validate_step_id(&section.id)?;
                if !sections.insert(section.id.as_str()) {
                    return Err(StepperError::DuplicateSection {
                        step: step.id.clone(),
                        section: section.id.clone(),
                    });
                }
            }
        }

        steps.sort_by_key(|s| s.ordinal);
        if let Some(pair) = steps.windows(2).find(|w| w[0].ordinal == w[1].ordinal) {
            return Err(StepperError::DuplicateOrdinal {
                ordinal: pair[0].ordinal,
                first: pair[0].id.clone(),
                second: pair[1].id.clone(),
            });
        }

        Ok(Self { steps })
    }

    /// Steps in ordinal order.
    pub fn list_steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &str) -> Result<&Step> {
        self.steps
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| StepperError::UnknownStep(id.to_string()))
    }

    pub fn ordinal_of(&self, id: &str) -> Result<u32> {
        self.get(id).map(|s| s.ordinal)
    }

    /// Index of `id` in ordinal order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    pub fn index_of(&self, id: &str) -> Result<usize> {
        self.position(id)
            .ok_or_else(|| StepperError::UnknownStep(id.to_string()))
    }

    pub fn first(&self) -> &Step {
        &self.steps[0]
    }

    pub fn last(&self) -> &Step {
        &self.steps[self.steps.len() - 1]
    }

    pub fn next_after(&self, id: &str) -> Result<Option<&Step>> {
        let i = self.index_of(id)?;
        Ok(self.steps.get(i + 1))
    }

    pub fn previous_before(&self, id: &str) -> Result<Option<&Step>> {
        let i = self.index_of(id)?;
        Ok(i.checked_sub(1).and_then(|p| self.steps.get(p)))
    }

    /// Steps with an ordinal strictly below `id`'s, in order.
    pub fn before(&self, id: &str) -> Result<&[Step]> {
        let i = self.index_of(id)?;
        Ok(&self.steps[..i])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
