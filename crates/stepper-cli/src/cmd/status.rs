use crate::output::{bar, percent, print_json, print_table};
use crate::session::{Session, Target};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use stepper_core::Decision;

#[derive(Serialize)]
struct StepStatus {
    id: String,
    label: String,
    ordinal: u32,
    percent: u8,
    complete: bool,
    skippable: bool,
    active: bool,
    #[serde(flatten)]
    decision: Decision,
}

#[derive(Serialize)]
struct StatusOutput<'a> {
    wizard: &'a str,
    session: &'a str,
    active_step: &'a str,
    overall_percent: u8,
    finished: bool,
    updated_at: DateTime<Utc>,
    steps: Vec<StepStatus>,
}

pub fn run(root: &Path, target: &Target<'_>, json: bool) -> anyhow::Result<()> {
    let session = Session::open(root, target)?;
    let c = &session.controller;

    let mut steps = Vec::new();
    for step in c.registry().list_steps() {
        let progress = c.progress(&step.id)?;
        steps.push(StepStatus {
            id: step.id.clone(),
            label: step.label.clone(),
            ordinal: step.ordinal,
            percent: progress.percent,
            complete: progress.is_complete(),
            skippable: step.skippable,
            active: step.id == c.active_step_id(),
            decision: c.check(&step.id)?,
        });
    }

    if json {
        return print_json(&StatusOutput {
            wizard: &session.wizard,
            session: c.session_key(),
            active_step: c.active_step_id(),
            overall_percent: c.overall_percent(),
            finished: c.is_finished(),
            updated_at: c.state().updated_at(),
            steps,
        });
    }

    println!(
        "{} / {}  {} {}",
        session.definition.label,
        c.session_key(),
        bar(c.overall_percent()),
        percent(c.overall_percent())
    );
    if c.is_finished() {
        println!("Finished.");
    }
    println!();

    let rows = steps
        .iter()
        .map(|s| {
            let gate = match &s.decision {
                Decision::Allowed => "open".to_string(),
                Decision::Denied { blocking_step, .. } => format!("needs {blocking_step}"),
            };
            vec![
                if s.active { ">" } else { "" }.to_string(),
                s.id.clone(),
                percent(s.percent),
                gate,
                if s.skippable { "optional" } else { "" }.to_string(),
            ]
        })
        .collect();
    print_table(&["", "STEP", "DONE", "GATE", "NOTE"], rows);
    Ok(())
}
