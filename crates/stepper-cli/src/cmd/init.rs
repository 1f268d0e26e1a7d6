use anyhow::Context;
use std::path::Path;
use stepper_core::{config::Config, io, paths};

/// Keeps session records out of version control; the config stays tracked.
const SESSIONS_GITIGNORE: &str = "*\n!.gitignore\n";

pub fn run(root: &Path) -> anyhow::Result<()> {
    let project_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());

    println!("Initializing stepper in: {}", root.display());

    for dir in [paths::STEPPER_DIR, paths::SESSIONS_DIR] {
        let p = root.join(dir);
        io::ensure_dir(&p).with_context(|| format!("failed to create {}", p.display()))?;
    }

    let config_path = paths::config_path(root);
    if !config_path.exists() {
        let cfg = Config::new(&project_name);
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }

    let ignore = paths::sessions_dir(root).join(".gitignore");
    if io::write_if_missing(&ignore, SESSIONS_GITIGNORE.as_bytes())? {
        println!("  created: {}/.gitignore", paths::SESSIONS_DIR);
    }

    let cfg = Config::load(root).context("failed to load config")?;
    println!("\nWizards:");
    for (name, def) in &cfg.wizards {
        let marker = if cfg.default_wizard.as_deref() == Some(name.as_str()) {
            " (default)"
        } else {
            ""
        };
        println!("  {name:<20} {} steps  {}{marker}", def.steps.len(), def.label);
    }

    Ok(())
}
