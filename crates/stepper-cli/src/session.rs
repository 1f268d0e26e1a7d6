use anyhow::Context;
use std::path::Path;
use stepper_core::config::{Config, WizardDefinition};
use stepper_core::{FileAdapter, WizardController};

/// Which wizard and session a command operates on, from the global flags.
pub struct Target<'a> {
    pub wizard: Option<&'a str>,
    pub session: &'a str,
}

/// A wizard session loaded from disk for the duration of one command.
pub struct Session {
    pub wizard: String,
    pub definition: WizardDefinition,
    pub controller: WizardController<FileAdapter>,
}

impl Session {
    pub fn open(root: &Path, target: &Target<'_>) -> anyhow::Result<Self> {
        let config = Config::load(root).context("failed to load config")?;
        let (name, definition) = resolve(&config, target)?;
        let registry = definition
            .registry()
            .with_context(|| format!("wizard '{name}' is misconfigured"))?;
        let adapter = FileAdapter::new(root, name)?;
        let controller = WizardController::with_options(
            registry,
            adapter,
            target.session,
            definition.options(),
        )
        .with_context(|| format!("failed to load session '{}'", target.session))?;

        tracing::debug!(wizard = %name, session = %target.session, "session opened");
        Ok(Self {
            wizard: name.to_string(),
            definition: definition.clone(),
            controller,
        })
    }

    pub fn save(&mut self) -> anyhow::Result<()> {
        self.controller
            .persist()
            .with_context(|| format!("failed to write session '{}'", self.controller.session_key()))
    }
}

/// Resolve the wizard without loading a session.
pub fn resolve<'a>(
    config: &'a Config,
    target: &Target<'a>,
) -> anyhow::Result<(&'a str, &'a WizardDefinition)> {
    config
        .resolve_wizard(target.wizard)
        .context("failed to resolve wizard")
}

/// Adapter for the resolved wizard, for commands that manage session files
/// directly.
pub fn adapter(root: &Path, target: &Target<'_>) -> anyhow::Result<(String, FileAdapter)> {
    let config = Config::load(root).context("failed to load config")?;
    let (name, _) = resolve(&config, target)?;
    Ok((name.to_string(), FileAdapter::new(root, name)?))
}
