use crate::controller::ControllerOptions;
use crate::error::{Result, StepperError};
use crate::paths;
use crate::registry::StepRegistry;
use crate::types::{Section, Step, COMPLETE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Error,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// StepDefinition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepDefinition {
    pub id: String,
    pub label: String,
    /// Defaults to the step's position in the list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skippable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
}

impl StepDefinition {
    fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            ordinal: None,
            skippable: false,
            sections: Vec::new(),
        }
    }

    fn skippable(mut self) -> Self {
        self.skippable = true;
        self
    }

    fn sections(mut self, sections: &[(&str, u32)]) -> Self {
        self.sections = sections
            .iter()
            .map(|(id, weight)| Section::new(*id, *weight))
            .collect();
        self
    }
}

// ---------------------------------------------------------------------------
// WizardDefinition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WizardDefinition {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hold forward navigation while the active step's last save failed.
    #[serde(default)]
    pub block_on_unsaved: bool,
    pub steps: Vec<StepDefinition>,
}

impl WizardDefinition {
    pub fn registry(&self) -> Result<StepRegistry> {
        let steps = self
            .steps
            .iter()
            .enumerate()
            .map(|(i, def)| Step {
                id: def.id.clone(),
                ordinal: def.ordinal.unwrap_or(i as u32),
                label: def.label.clone(),
                skippable: def.skippable,
                sections: def.sections.clone(),
            })
            .collect();
        StepRegistry::new(steps)
    }

    pub fn options(&self) -> ControllerOptions {
        ControllerOptions {
            block_on_unsaved: self.block_on_unsaved,
        }
    }
}

// ---------------------------------------------------------------------------
// Built-in wizards
// ---------------------------------------------------------------------------

fn bond_estimation() -> WizardDefinition {
    WizardDefinition {
        label: "Bond Estimation".to_string(),
        description: Some("Estimate issue size from fund position and financials".to_string()),
        block_on_unsaved: false,
        steps: vec![
            StepDefinition::new("fund_position", "Fund Position"),
            StepDefinition::new("audited_financial", "Audited Financials").sections(&[
                ("balance_sheet", 50),
                ("profit_loss", 30),
                ("auditor_report", 20),
            ]),
            StepDefinition::new("borrowing", "Borrowing Details"),
            StepDefinition::new("estimate", "Estimate Review"),
        ],
    }
}

fn issuer_services() -> WizardDefinition {
    WizardDefinition {
        label: "Issuer Services".to_string(),
        description: Some("Pre-issue application through issue launch".to_string()),
        block_on_unsaved: true,
        steps: vec![
            StepDefinition::new("pre_issue_application", "Pre-Issue Application").sections(&[
                ("issuer_details", 20),
                ("issue_structure", 30),
                ("documents", 50),
            ]),
            StepDefinition::new("intermediary_appointment", "Intermediary Appointment")
                .skippable(),
            StepDefinition::new("regulatory_filing", "Regulatory Filing"),
            StepDefinition::new("isin_activation", "ISIN Activation"),
            StepDefinition::new("issue_launch", "Issue Launch"),
        ],
    }
}

fn my_bond() -> WizardDefinition {
    WizardDefinition {
        label: "My Bond".to_string(),
        description: None,
        block_on_unsaved: false,
        steps: vec![
            StepDefinition::new("bond_details", "Bond Details"),
            StepDefinition::new("intermediaries", "Intermediaries").skippable(),
            StepDefinition::new("documents", "Documents"),
            StepDefinition::new("review", "Review & Submit"),
        ],
    }
}

pub fn default_wizards() -> BTreeMap<String, WizardDefinition> {
    let mut m = BTreeMap::new();
    m.insert("bond_estimation".to_string(), bond_estimation());
    m.insert("issuer_services".to_string(), issuer_services());
    m.insert("my_bond".to_string(), my_bond());
    m
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: ProjectConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_wizard: Option<String>,
    #[serde(default)]
    pub wizards: BTreeMap<String, WizardDefinition>,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: ProjectConfig {
                name: project_name.into(),
                description: None,
            },
            default_wizard: Some("bond_estimation".to_string()),
            wizards: default_wizards(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(StepperError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn wizard(&self, name: &str) -> Result<&WizardDefinition> {
        self.wizards
            .get(name)
            .ok_or_else(|| StepperError::UnknownWizard(name.to_string()))
    }

    /// Pick the wizard named explicitly, else `default_wizard`, else the only
    /// wizard when exactly one is defined.
    pub fn resolve_wizard<'a>(
        &'a self,
        name: Option<&'a str>,
    ) -> Result<(&'a str, &'a WizardDefinition)> {
        let name = match (name, self.default_wizard.as_deref()) {
            (Some(n), _) => n,
            (None, Some(d)) => d,
            (None, None) if self.wizards.len() == 1 => {
                let (n, def) = self
                    .wizards
                    .iter()
                    .next()
                    .ok_or_else(|| StepperError::UnknownWizard(String::new()))?;
                return Ok((n.as_str(), def));
            }
            (None, None) => return Err(StepperError::UnknownWizard("<none>".to_string())),
        };
        Ok((name, self.wizard(name)?))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        // 1. default_wizard must name a defined wizard
        if let Some(default) = &self.default_wizard {
            if !self.wizards.contains_key(default) {
                warnings.push(ConfigWarning::error(format!(
                    "default_wizard '{default}' is not defined"
                )));
            }
        }

        if self.wizards.is_empty() {
            warnings.push(ConfigWarning::warning("no wizards defined"));
        }

        for (name, def) in &self.wizards {
            // 2. Wizard names double as directory names
            if paths::validate_step_id(name).is_err() {
                warnings.push(ConfigWarning::error(format!(
                    "wizard name '{name}' must be lowercase alphanumeric with '_' or '-'"
                )));
            }

            // 3. Steps must form a valid registry
            if let Err(e) = def.registry() {
                warnings.push(ConfigWarning::error(format!("wizard '{name}': {e}")));
                continue;
            }

            // 4. Section weights should split exactly 100%
            for step in &def.steps {
                if step.sections.is_empty() {
                    continue;
                }
                let total: u32 = step.sections.iter().map(|s| s.weight).sum();
                if total != COMPLETE as u32 {
                    warnings.push(ConfigWarning::warning(format!(
                        "wizard '{name}' step '{}': section weights sum to {total}, not 100",
                        step.id
                    )));
                }
                for section in step.sections.iter().filter(|s| s.weight == 0) {
                    warnings.push(ConfigWarning::warning(format!(
                        "wizard '{name}' step '{}': section '{}' has weight 0 and never counts",
                        step.id, section.id
                    )));
                }
            }

            // 5. A wizard where nothing gates is almost certainly a typo
            if def.steps.len() > 1 && def.steps.iter().all(|s| s.skippable) {
                warnings.push(ConfigWarning::warning(format!(
                    "wizard '{name}': every step is skippable, gating never applies"
                )));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::new("bond-desk");
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.project.name, "bond-desk");
        assert_eq!(parsed.version, 1);
        assert_eq!(parsed.wizards.len(), 3);
        assert_eq!(parsed.wizards, cfg.wizards);
    }

    #[test]
    fn default_config_is_clean() {
        let warnings = Config::new("p").validate();
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }

    #[test]
    fn built_in_wizards_build_registries() {
        for (name, def) in default_wizards() {
            let reg = def
                .registry()
                .unwrap_or_else(|e| panic!("{name}: {e}"));
            assert_eq!(reg.len(), def.steps.len());
        }
    }

    #[test]
    fn load_missing_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(StepperError::NotInitialized)
        ));
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        Config::new("p").save(dir.path()).unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.default_wizard.as_deref(), Some("bond_estimation"));
    }

    #[test]
    fn explicit_ordinals_override_position() {
        let yaml = r#"
label: Custom
steps:
  - id: second
    label: Second
    ordinal: 20
  - id: first
    label: First
    ordinal: 10
"#;
        let def: WizardDefinition = serde_yaml::from_str(yaml).unwrap();
        let reg = def.registry().unwrap();
        assert_eq!(reg.first().id, "first");
    }

    #[test]
    fn rejects_unknown_step_fields() {
        let yaml = "label: X\nsteps:\n  - id: a\n    label: A\n    skipable: true\n";
        assert!(serde_yaml::from_str::<WizardDefinition>(yaml).is_err());
    }

    #[test]
    fn resolve_wizard_order() {
        let cfg = Config::new("p");
        assert_eq!(cfg.resolve_wizard(Some("my_bond")).unwrap().0, "my_bond");
        assert_eq!(cfg.resolve_wizard(None).unwrap().0, "bond_estimation");
        assert!(matches!(
            cfg.resolve_wizard(Some("nope")),
            Err(StepperError::UnknownWizard(_))
        ));

        let mut single = Config::new("p");
        single.default_wizard = None;
        single.wizards.retain(|k, _| k == "my_bond");
        assert_eq!(single.resolve_wizard(None).unwrap().0, "my_bond");
    }

    #[test]
    fn validate_flags_problems() {
        let mut cfg = Config::new("p");
        cfg.default_wizard = Some("ghost".to_string());
        let mut bad = bond_estimation();
        bad.steps[1].sections[0].weight = 10;
        cfg.wizards.insert("lopsided".to_string(), bad);
        let mut dup = my_bond();
        dup.steps[1].id = "bond_details".to_string();
        cfg.wizards.insert("duplicated".to_string(), dup);

        let warnings = cfg.validate();
        let errors: Vec<_> = warnings
            .iter()
            .filter(|w| w.level == WarnLevel::Error)
            .collect();
        assert_eq!(errors.len(), 2, "{warnings:?}");
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Warning && w.message.contains("sum to 60")));
    }
}
