use crate::output::print_json;
use crate::session::{adapter, Target};
use std::path::Path;

pub fn run(root: &Path, target: &Target<'_>, json: bool) -> anyhow::Result<()> {
    let (wizard, adapter) = adapter(root, target)?;
    let removed = adapter.delete(target.session)?;

    if json {
        print_json(&serde_json::json!({
            "wizard": wizard,
            "session": target.session,
            "removed": removed,
        }))?;
    } else if removed {
        println!("Removed session '{}' of {wizard}.", target.session);
    } else {
        println!("No stored session '{}' for {wizard}.", target.session);
    }
    Ok(())
}

pub fn list(root: &Path, target: &Target<'_>, json: bool) -> anyhow::Result<()> {
    let (wizard, adapter) = adapter(root, target)?;
    let sessions = adapter.list_sessions()?;

    if json {
        print_json(&serde_json::json!({ "wizard": wizard, "sessions": sessions }))?;
    } else if sessions.is_empty() {
        println!("No sessions for {wizard}.");
    } else {
        for key in &sessions {
            println!("{key}");
        }
    }
    Ok(())
}
