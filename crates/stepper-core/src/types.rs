use serde::{Deserialize, Serialize};
use std::fmt;

/// Percent at which a step (or section) counts as complete.
pub const COMPLETE: u8 = 100;

/// Clamp an arbitrary reported value into `0..=100`.
pub fn clamp_percent(value: i64) -> u8 {
    value.clamp(0, COMPLETE as i64) as u8
}

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// A sub-form of a step and the share of the step's 100% it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Section {
    pub id: String,
    pub weight: u32,
}

impl Section {
    pub fn new(id: impl Into<String>, weight: u32) -> Self {
        Self {
            id: id.into(),
            weight,
        }
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub ordinal: u32,
    pub label: String,
    /// Optional steps never block forward navigation.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skippable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
}

impl Step {
    pub fn new(id: impl Into<String>, ordinal: u32, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ordinal,
            label: label.into(),
            skippable: false,
            sections: Vec::new(),
        }
    }

    pub fn skippable(mut self) -> Self {
        self.skippable = true;
        self
    }

    pub fn with_sections(mut self, sections: Vec<Section>) -> Self {
        self.sections = sections;
        self
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn is_composite(&self) -> bool {
        !self.sections.is_empty()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp_percent(150), 100);
        assert_eq!(clamp_percent(-5), 0);
        assert_eq!(clamp_percent(42), 42);
        assert_eq!(clamp_percent(i64::MAX), 100);
        assert_eq!(clamp_percent(i64::MIN), 0);
    }

    #[test]
    fn step_defaults_from_yaml() {
        let yaml = "id: borrowing\nordinal: 2\nlabel: Borrowing\n";
        let step: Step = serde_yaml::from_str(yaml).unwrap();
        assert!(!step.skippable);
        assert!(step.sections.is_empty());
    }

    #[test]
    fn skippable_omitted_when_false() {
        let step = Step::new("a", 0, "A");
        let yaml = serde_yaml::to_string(&step).unwrap();
        assert!(!yaml.contains("skippable"));
        assert!(!yaml.contains("sections"));
    }

    #[test]
    fn section_lookup() {
        let step = Step::new("issue", 0, "Issue")
            .with_sections(vec![Section::new("basic", 20), Section::new("docs", 80)]);
        assert!(step.is_composite());
        assert_eq!(step.section("docs").map(|s| s.weight), Some(80));
        assert!(step.section("missing").is_none());
    }
}
