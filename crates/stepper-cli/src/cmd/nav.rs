use crate::output::print_json;
use crate::session::{Session, Target};
use std::path::Path;
use stepper_core::{DenyReason, Navigation};

/// Gating refused the move. `main` maps this to exit status 2.
#[derive(Debug, thiserror::Error)]
#[error("navigation denied: step '{blocking_step}' is {reason}")]
pub struct NavigationDenied {
    pub blocking_step: String,
    pub reason: DenyReason,
}

pub fn goto(root: &Path, target: &Target<'_>, step: &str, json: bool) -> anyhow::Result<()> {
    let mut session = Session::open(root, target)?;
    let nav = session.controller.request_navigate(step)?;
    finish(session, nav, json)
}

pub fn next(root: &Path, target: &Target<'_>, json: bool) -> anyhow::Result<()> {
    let mut session = Session::open(root, target)?;
    let nav = session.controller.advance()?;
    finish(session, nav, json)
}

pub fn back(root: &Path, target: &Target<'_>, json: bool) -> anyhow::Result<()> {
    let mut session = Session::open(root, target)?;
    let nav = session.controller.back()?;
    finish(session, nav, json)
}

fn finish(mut session: Session, nav: Navigation, json: bool) -> anyhow::Result<()> {
    if nav.is_moved() {
        session.save()?;
    }

    if json {
        print_json(&nav)?;
    } else {
        let c = &session.controller;
        match &nav {
            Navigation::Moved { from, to } => println!("{from} -> {to}"),
            Navigation::Denied { blocking_step, .. } => {
                println!("Complete '{blocking_step}' first.")
            }
            Navigation::AtEnd if c.is_finished() => println!("Wizard finished."),
            Navigation::AtEnd => println!("'{}' is the last step.", c.active_step_id()),
            Navigation::AtStart => println!("'{}' is the first step.", c.active_step_id()),
        }
    }

    match nav {
        Navigation::Denied {
            blocking_step,
            reason,
        } => Err(NavigationDenied {
            blocking_step,
            reason,
        }
        .into()),
        _ => Ok(()),
    }
}
