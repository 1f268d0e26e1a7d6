use crate::output::{bar, percent, print_json};
use crate::session::{Session, Target};
use std::path::Path;

pub fn run(
    root: &Path,
    target: &Target<'_>,
    value: i64,
    section: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let mut session = Session::open(root, target)?;
    let step = session.controller.active_step()?.clone();

    let stored = match section {
        Some(section) => session.controller.report_section(section, value)?,
        None if step.is_composite() => {
            anyhow::bail!(
                "step '{}' is made of sections; report with --section <{}>",
                step.id,
                step.sections
                    .iter()
                    .map(|s| s.id.as_str())
                    .collect::<Vec<_>>()
                    .join("|")
            )
        }
        None => session.controller.report_percent(value)?,
    };
    session.save()?;

    let complete = session.controller.progress(&step.id)?.is_complete();
    if json {
        return print_json(&serde_json::json!({
            "step": step.id,
            "section": section,
            "percent": stored,
            "complete": complete,
        }));
    }

    match section {
        Some(section) => {
            let section_pct = session
                .controller
                .progress(&step.id)?
                .sections
                .get(section)
                .copied()
                .unwrap_or(0);
            println!(
                "{}/{section}: {}  step {} {}",
                step.id,
                percent(section_pct),
                bar(stored),
                percent(stored)
            );
        }
        None => println!("{}: {} {}", step.id, bar(stored), percent(stored)),
    }
    if complete {
        println!("Step complete.");
    }
    Ok(())
}
