use crate::output::{print_json, print_table};
use crate::session::{resolve, Target};
use anyhow::Context;
use std::path::Path;
use stepper_core::config::Config;

pub fn run(root: &Path, target: &Target<'_>, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let (name, definition) = resolve(&config, target)?;
    let registry = definition
        .registry()
        .with_context(|| format!("wizard '{name}' is misconfigured"))?;

    if json {
        return print_json(&serde_json::json!({
            "wizard": name,
            "label": definition.label,
            "steps": registry.list_steps(),
        }));
    }

    println!("{} ({name})", definition.label);
    if let Some(desc) = &definition.description {
        println!("{desc}");
    }
    println!();

    let rows = registry
        .list_steps()
        .iter()
        .map(|s| {
            let sections = s
                .sections
                .iter()
                .map(|sec| format!("{}:{}", sec.id, sec.weight))
                .collect::<Vec<_>>()
                .join(", ");
            vec![
                s.ordinal.to_string(),
                s.id.clone(),
                s.label.clone(),
                if s.skippable { "yes" } else { "" }.to_string(),
                sections,
            ]
        })
        .collect();
    print_table(&["#", "STEP", "LABEL", "OPTIONAL", "SECTIONS"], rows);
    Ok(())
}
