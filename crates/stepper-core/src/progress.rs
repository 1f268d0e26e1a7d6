use crate::error::{Result, StepperError};
use crate::registry::StepRegistry;
use crate::types::{clamp_percent, Section, COMPLETE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Combine part percents into one percent.
///
/// Without weights each part already reports its own slice of the 100%, so
/// the parts are summed. With weights each part reports 0..=100 of itself
/// and `weight` is the share of the total it owns. Either way the result is
/// clamped to 100.
pub fn aggregate_percents(percents: &[u8], weights: Option<&[u32]>) -> Result<u8> {
    let total: u64 = match weights {
        None => percents.iter().map(|&p| p as u64).sum(),
        Some(weights) => {
            if weights.len() != percents.len() {
                return Err(StepperError::WeightMismatch {
                    expected: percents.len(),
                    got: weights.len(),
                });
            }
            let weighted: u64 = percents
                .iter()
                .zip(weights)
                .map(|(&p, &w)| p as u64 * w as u64)
                .sum();
            // Round half up.
            (weighted + 50) / 100
        }
    };
    Ok(total.min(COMPLETE as u64) as u8)
}

fn composite_percent(sections: &[Section], reported: &BTreeMap<String, u8>) -> u8 {
    let percents: Vec<u8> = sections
        .iter()
        .map(|s| reported.get(&s.id).copied().unwrap_or(0))
        .collect();
    let weights: Vec<u32> = sections.iter().map(|s| s.weight).collect();
    // Lengths always match here.
    aggregate_percents(&percents, Some(weights.as_slice())).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// StepProgress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepProgress {
    pub step_id: String,
    pub percent: u8,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sections: BTreeMap<String, u8>,
}

impl StepProgress {
    pub fn new(step_id: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            percent: 0,
            payload: Value::Null,
            sections: BTreeMap::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.percent == COMPLETE
    }

    pub fn has_payload(&self) -> bool {
        !self.payload.is_null()
    }
}

// ---------------------------------------------------------------------------
// ProgressStore
// ---------------------------------------------------------------------------

/// Per-step completion state, one entry per registry step in ordinal order.
///
/// The store owns a copy of the registry so that every lookup can be
/// validated; an id outside the registry is always `UnknownStep`.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    registry: StepRegistry,
    entries: Vec<StepProgress>,
}

impl ProgressStore {
    pub fn new(registry: StepRegistry) -> Self {
        let entries = registry
            .list_steps()
            .iter()
            .map(|s| StepProgress::new(s.id.clone()))
            .collect();
        Self { registry, entries }
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn get(&self, step_id: &str) -> Result<&StepProgress> {
        let i = self.registry.index_of(step_id)?;
        Ok(&self.entries[i])
    }

    fn get_mut(&mut self, step_id: &str) -> Result<&mut StepProgress> {
        let i = self.registry.index_of(step_id)?;
        Ok(&mut self.entries[i])
    }

    /// Store `value` clamped into `0..=100`. Returns the stored percent.
    pub fn set_percent(&mut self, step_id: &str, value: i64) -> Result<u8> {
        let entry = self.get_mut(step_id)?;
        entry.percent = clamp_percent(value);
        Ok(entry.percent)
    }

    /// Replace the payload verbatim. Last write wins.
    pub fn set_payload(&mut self, step_id: &str, payload: Value) -> Result<()> {
        self.get_mut(step_id)?.payload = payload;
        Ok(())
    }

    /// Record one section's percent and recompute the step percent from all
    /// declared sections. Returns the new step percent.
    pub fn set_section(&mut self, step_id: &str, section_id: &str, value: i64) -> Result<u8> {
        let i = self.registry.index_of(step_id)?;
        let step = &self.registry.list_steps()[i];
        if step.section(section_id).is_none() {
            return Err(StepperError::UnknownSection {
                step: step_id.to_string(),
                section: section_id.to_string(),
            });
        }
        let entry = &mut self.entries[i];
        entry
            .sections
            .insert(section_id.to_string(), clamp_percent(value));
        entry.percent = composite_percent(&step.sections, &entry.sections);
        Ok(entry.percent)
    }

    pub fn is_complete(&self, step_id: &str) -> Result<bool> {
        self.get(step_id).map(StepProgress::is_complete)
    }

    /// Aggregate the percents of several steps. See [`aggregate_percents`].
    pub fn aggregate(&self, step_ids: &[&str], weights: Option<&[u32]>) -> Result<u8> {
        let percents = step_ids
            .iter()
            .map(|id| self.get(id).map(|p| p.percent))
            .collect::<Result<Vec<u8>>>()?;
        aggregate_percents(&percents, weights)
    }

    /// Read-only copy of every entry, in ordinal order.
    pub fn snapshot(&self) -> Vec<StepProgress> {
        self.entries.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepProgress> {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Step;
    use serde_json::json;

    fn store() -> ProgressStore {
        let reg = StepRegistry::new(vec![
            Step::new("a", 0, "A"),
            Step::new("b", 1, "B"),
            Step::new("issue", 2, "Issue").with_sections(vec![
                Section::new("basic", 20),
                Section::new("terms", 30),
                Section::new("documents", 50),
            ]),
        ])
        .unwrap();
        ProgressStore::new(reg)
    }

    #[test]
    fn one_entry_per_step_defaulted() {
        let s = store();
        let ids: Vec<&str> = s.iter().map(|p| p.step_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "issue"]);
        assert!(s.iter().all(|p| p.percent == 0 && p.payload.is_null()));
    }

    #[test]
    fn set_percent_clamps() {
        let mut s = store();
        assert_eq!(s.set_percent("a", 150).unwrap(), 100);
        assert_eq!(s.get("a").unwrap().percent, 100);
        s.set_percent("a", -5).unwrap();
        assert_eq!(s.get("a").unwrap().percent, 0);
    }

    #[test]
    fn completeness_is_not_sticky() {
        let mut s = store();
        s.set_percent("a", 100).unwrap();
        assert!(s.is_complete("a").unwrap());
        s.set_percent("a", 50).unwrap();
        assert!(!s.is_complete("a").unwrap());
    }

    #[test]
    fn payload_replaced_and_percent_untouched() {
        let mut s = store();
        s.set_percent("b", 40).unwrap();
        s.set_payload("b", json!({"lender": "x", "amount": 10})).unwrap();
        s.set_payload("b", json!({"lender": "y"})).unwrap();
        let b = s.get("b").unwrap();
        assert_eq!(b.payload, json!({"lender": "y"}));
        assert_eq!(b.percent, 40);
    }

    #[test]
    fn unknown_step() {
        let mut s = store();
        assert!(matches!(s.get("nonexistent"), Err(StepperError::UnknownStep(_))));
        assert!(s.set_percent("nonexistent", 10).is_err());
        assert!(s.set_payload("nonexistent", Value::Null).is_err());
        assert!(s.is_complete("nonexistent").is_err());
    }

    #[test]
    fn aggregate_weighted_sub_forms() {
        assert_eq!(aggregate_percents(&[100, 100], Some(&[20, 30][..])).unwrap(), 50);
        assert_eq!(aggregate_percents(&[50, 100], Some(&[20, 30][..])).unwrap(), 40);
        assert_eq!(aggregate_percents(&[0, 0], Some(&[20, 30][..])).unwrap(), 0);
        assert_eq!(aggregate_percents(&[100, 100], Some(&[80, 80][..])).unwrap(), 100);
    }

    #[test]
    fn aggregate_unweighted_sums_and_clamps() {
        assert_eq!(aggregate_percents(&[20, 30], None).unwrap(), 50);
        assert_eq!(aggregate_percents(&[60, 70], None).unwrap(), 100);
        assert_eq!(aggregate_percents(&[], None).unwrap(), 0);
    }

    #[test]
    fn aggregate_weight_mismatch() {
        assert!(matches!(
            aggregate_percents(&[10, 20], Some(&[50][..])),
            Err(StepperError::WeightMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn store_aggregate_over_steps() {
        let mut s = store();
        s.set_percent("a", 100).unwrap();
        s.set_percent("b", 50).unwrap();
        assert_eq!(s.aggregate(&["a", "b"], Some(&[50, 50][..])).unwrap(), 75);
        assert!(s.aggregate(&["a", "zzz"], None).is_err());
    }

    #[test]
    fn sections_drive_step_percent() {
        let mut s = store();
        assert_eq!(s.set_section("issue", "basic", 100).unwrap(), 20);
        assert_eq!(s.set_section("issue", "terms", 100).unwrap(), 50);
        assert_eq!(s.set_section("issue", "documents", 50).unwrap(), 75);
        assert!(!s.is_complete("issue").unwrap());
        s.set_section("issue", "documents", 200).unwrap();
        assert!(s.is_complete("issue").unwrap());
        assert_eq!(s.get("issue").unwrap().sections["documents"], 100);
    }

    #[test]
    fn unknown_section() {
        let mut s = store();
        assert!(matches!(
            s.set_section("issue", "nope", 10),
            Err(StepperError::UnknownSection { .. })
        ));
        assert!(matches!(
            s.set_section("a", "basic", 10),
            Err(StepperError::UnknownSection { .. })
        ));
    }
}
