use crate::output::print_json;
use crate::session::{Session, Target};
use anyhow::Context;
use serde_json::Value;
use std::path::Path;
use stepper_core::SaveOutcome;

pub fn run(
    root: &Path,
    target: &Target<'_>,
    data: Option<&str>,
    file: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let payload: Value = match (data, file) {
        (Some(data), _) => serde_json::from_str(data).context("--data is not valid JSON")?,
        (None, Some(path)) => read_payload(path)?,
        (None, None) => anyhow::bail!("either --data or --file is required"),
    };

    let mut session = Session::open(root, target)?;
    let step = session.controller.active_step_id().to_string();
    let outcome = session.controller.save_payload(payload)?;
    // The session record keeps the payload and the pending-save marker either way.
    session.save()?;

    if json {
        print_json(&outcome_json(&step, &outcome))?;
    }
    match outcome {
        SaveOutcome::Saved => {
            if !json {
                println!("Saved payload for '{step}'.");
            }
            Ok(())
        }
        SaveOutcome::Failed { reason } => {
            anyhow::bail!("payload for '{step}' kept in the session but not saved: {reason}")
        }
    }
}

fn outcome_json(step: &str, outcome: &SaveOutcome) -> Value {
    match outcome {
        SaveOutcome::Saved => serde_json::json!({ "step": step, "saved": true }),
        SaveOutcome::Failed { reason } => {
            serde_json::json!({ "step": step, "saved": false, "reason": reason })
        }
    }
}

/// JSON by default; `.yaml`/`.yml` files are parsed as YAML.
fn read_payload(path: &Path) -> anyhow::Result<Value> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let value = if is_yaml {
        serde_yaml::from_str(&data)
            .with_context(|| format!("{} is not valid YAML", path.display()))?
    } else {
        serde_json::from_str(&data)
            .with_context(|| format!("{} is not valid JSON", path.display()))?
    };
    Ok(value)
}
