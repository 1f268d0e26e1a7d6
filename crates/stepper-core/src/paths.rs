use crate::error::{Result, StepperError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const STEPPER_DIR: &str = ".stepper";
pub const SESSIONS_DIR: &str = ".stepper/sessions";
pub const CONFIG_FILE: &str = ".stepper/config.yaml";
pub const SESSION_EXT: &str = "yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn stepper_dir(root: &Path) -> PathBuf {
    root.join(STEPPER_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn sessions_dir(root: &Path) -> PathBuf {
    root.join(SESSIONS_DIR)
}

pub fn wizard_sessions_dir(root: &Path, wizard: &str) -> PathBuf {
    sessions_dir(root).join(wizard)
}

pub fn session_path(root: &Path, wizard: &str, session_key: &str) -> PathBuf {
    wizard_sessions_dir(root, wizard).join(format!("{session_key}.{SESSION_EXT}"))
}

// ---------------------------------------------------------------------------
// Identifier validation
// ---------------------------------------------------------------------------

static STEP_ID_RE: OnceLock<Regex> = OnceLock::new();
static SESSION_KEY_RE: OnceLock<Regex> = OnceLock::new();

fn step_id_re() -> &'static Regex {
    STEP_ID_RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9_\-]*[a-z0-9]$|^[a-z0-9]$").expect("static regex")
    })
}

fn session_key_re() -> &'static Regex {
    SESSION_KEY_RE
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$").expect("static regex"))
}

/// Step, section and wizard ids share one shape: `fund_position`, `isin-activation`.
pub fn validate_step_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 64 || !step_id_re().is_match(id) {
        return Err(StepperError::InvalidStepId(id.to_string()));
    }
    Ok(())
}

/// Session keys become file names, so path separators and `..` are rejected.
pub fn validate_session_key(key: &str) -> Result<()> {
    if key.is_empty() || key.len() > 128 || key.contains("..") || !session_key_re().is_match(key)
    {
        return Err(StepperError::InvalidSessionKey(key.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
