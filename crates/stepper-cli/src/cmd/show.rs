use crate::output::{bar, percent, print_json};
use crate::session::{Session, Target};
use std::path::Path;

pub fn run(
    root: &Path,
    target: &Target<'_>,
    step: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let session = Session::open(root, target)?;
    let c = &session.controller;
    let id = step.unwrap_or_else(|| c.active_step_id());
    let step = c.registry().get(id)?;
    let progress = c.progress(id)?;

    if json {
        return print_json(&serde_json::json!({
            "step": step,
            "active": id == c.active_step_id(),
            "progress": progress,
        }));
    }

    println!("{} ({})", step.label, step.id);
    println!("  progress: {} {}", bar(progress.percent), percent(progress.percent));
    if step.is_composite() {
        println!("  sections:");
        for section in &step.sections {
            let pct = progress.sections.get(&section.id).copied().unwrap_or(0);
            println!("    {:<24} {}  (weight {})", section.id, percent(pct), section.weight);
        }
    }
    if progress.has_payload() {
        println!("  payload:");
        for line in serde_json::to_string_pretty(&progress.payload)?.lines() {
            println!("    {line}");
        }
    } else {
        println!("  payload:  (none)");
    }
    Ok(())
}
