#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn stepper(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("stepper").unwrap();
    cmd.current_dir(dir.path())
        .env("STEPPER_ROOT", dir.path())
        .env_remove("STEPPER_WIZARD")
        .env_remove("STEPPER_SESSION");
    cmd
}

fn init_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    stepper(&dir).arg("init").assert().success();
    dir
}

fn json_of(dir: &TempDir, args: &[&str]) -> Value {
    let out = stepper(dir).args(args).arg("--json").output().unwrap();
    assert!(
        out.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).unwrap()
}

// ---------------------------------------------------------------------------
// stepper init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_directory_tree() {
    let dir = init_project();
    assert!(dir.path().join(".stepper").is_dir());
    assert!(dir.path().join(".stepper/sessions").is_dir());
    assert!(dir.path().join(".stepper/config.yaml").exists());
    assert!(dir.path().join(".stepper/sessions/.gitignore").exists());
}

#[test]
fn init_is_idempotent() {
    let dir = init_project();
    stepper(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:  .stepper/config.yaml"));
}

#[test]
fn commands_require_init() {
    let dir = TempDir::new().unwrap();
    stepper(&dir)
        .arg("status")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("stepper init"));
}

// ---------------------------------------------------------------------------
// stepper steps / status
// ---------------------------------------------------------------------------

#[test]
fn steps_lists_default_wizard_in_order() {
    let dir = init_project();
    let v = json_of(&dir, &["steps"]);
    assert_eq!(v["wizard"], "bond_estimation");
    let ids: Vec<&str> = v["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        ["fund_position", "audited_financial", "borrowing", "estimate"]
    );
}

#[test]
fn fresh_session_starts_at_first_step() {
    let dir = init_project();
    let v = json_of(&dir, &["status"]);
    assert_eq!(v["active_step"], "fund_position");
    assert_eq!(v["overall_percent"], 0);
    assert_eq!(v["finished"], false);
    let steps = v["steps"].as_array().unwrap();
    assert_eq!(steps[0]["decision"], "allowed");
    assert_eq!(steps[1]["decision"], "denied");
    assert_eq!(steps[1]["blocking_step"], "fund_position");
    assert_eq!(steps[3]["blocking_step"], "fund_position");
}

// ---------------------------------------------------------------------------
// Gated navigation
// ---------------------------------------------------------------------------

#[test]
fn forward_jump_is_denied_until_prior_steps_complete() {
    let dir = init_project();
    stepper(&dir).args(["report", "100"]).assert().success();

    stepper(&dir)
        .args(["goto", "borrowing"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Complete 'audited_financial' first."))
        .stderr(predicate::str::contains("audited_financial"));
    assert_eq!(json_of(&dir, &["status"])["active_step"], "fund_position");

    stepper(&dir)
        .args(["goto", "audited_financial"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fund_position -> audited_financial"));
    assert_eq!(
        json_of(&dir, &["status"])["active_step"],
        "audited_financial"
    );
}

#[test]
fn denied_navigation_json_names_blocking_step() {
    let dir = init_project();
    let out = stepper(&dir).args(["next", "--json"]).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    let v: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["result"], "denied");
    assert_eq!(v["blocking_step"], "fund_position");
    assert_eq!(v["reason"], "incomplete");
}

#[test]
fn back_is_always_allowed() {
    let dir = init_project();
    stepper(&dir)
        .arg("back")
        .assert()
        .success()
        .stdout(predicate::str::contains("'fund_position' is the first step."));

    stepper(&dir).args(["report", "100"]).assert().success();
    stepper(&dir).arg("next").assert().success();
    // Going back to an earlier step and reopening it gates the next one again.
    stepper(&dir)
        .args(["goto", "fund_position"])
        .assert()
        .success();
    stepper(&dir).args(["report", "40"]).assert().success();
    stepper(&dir)
        .arg("next")
        .assert()
        .code(2);
}

#[test]
fn unknown_step_is_an_error_not_a_denial() {
    let dir = init_project();
    stepper(&dir)
        .args(["goto", "nonexistent"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown step: nonexistent"));
}

#[test]
fn walking_the_whole_wizard_finishes_it() {
    let dir = init_project();
    stepper(&dir).args(["report", "100"]).assert().success();
    stepper(&dir).arg("next").assert().success();
    for section in ["balance_sheet", "profit_loss", "auditor_report"] {
        stepper(&dir)
            .args(["report", "100", "--section", section])
            .assert()
            .success();
    }
    stepper(&dir).arg("next").assert().success();
    stepper(&dir).args(["report", "100"]).assert().success();
    stepper(&dir).arg("next").assert().success();
    stepper(&dir).args(["report", "100"]).assert().success();

    stepper(&dir)
        .arg("next")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wizard finished."));
    let v = json_of(&dir, &["status"]);
    assert_eq!(v["finished"], true);
    assert_eq!(v["overall_percent"], 100);
}

// ---------------------------------------------------------------------------
// stepper report
// ---------------------------------------------------------------------------

#[test]
fn report_clamps_into_range() {
    let dir = init_project();
    assert_eq!(json_of(&dir, &["report", "150"])["percent"], 100);
    assert_eq!(json_of(&dir, &["report", "-5"])["percent"], 0);
}

#[test]
fn completeness_is_not_sticky() {
    let dir = init_project();
    assert_eq!(json_of(&dir, &["report", "100"])["complete"], true);
    assert_eq!(json_of(&dir, &["report", "80"])["complete"], false);
}

#[test]
fn composite_step_aggregates_weighted_sections() {
    let dir = init_project();
    stepper(&dir).args(["report", "100"]).assert().success();
    stepper(&dir).arg("next").assert().success();

    stepper(&dir)
        .args(["report", "50"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--section"));

    let v = json_of(&dir, &["report", "100", "--section", "balance_sheet"]);
    assert_eq!(v["percent"], 50);
    let v = json_of(&dir, &["report", "50", "--section", "profit_loss"]);
    assert_eq!(v["percent"], 65);

    stepper(&dir)
        .args(["report", "100", "--section", "cash_flow"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown section"));
}

// ---------------------------------------------------------------------------
// stepper save / show
// ---------------------------------------------------------------------------

#[test]
fn saved_payload_is_shown_and_survives_navigation() {
    let dir = init_project();
    stepper(&dir)
        .args(["save", "--data", r#"{"cash": 1200, "currency": "INR"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved payload for 'fund_position'."));
    stepper(&dir).args(["report", "100"]).assert().success();
    stepper(&dir).arg("next").assert().success();

    let v = json_of(&dir, &["show", "fund_position"]);
    assert_eq!(v["active"], false);
    assert_eq!(v["progress"]["percent"], 100);
    assert_eq!(v["progress"]["payload"]["cash"], 1200);

    stepper(&dir)
        .args(["show", "fund_position"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"currency\": \"INR\""));
}

#[test]
fn save_reads_yaml_file() {
    let dir = init_project();
    let file = dir.path().join("fund.yaml");
    std::fs::write(&file, "cash: 10\nbanks: [hdfc, sbi]\n").unwrap();
    stepper(&dir)
        .args(["save", "--file"])
        .arg(&file)
        .assert()
        .success();

    let v = json_of(&dir, &["show"]);
    assert_eq!(v["progress"]["payload"]["banks"][1], "sbi");
}

#[test]
fn save_rejects_malformed_json() {
    let dir = init_project();
    stepper(&dir)
        .args(["save", "--data", "{cash:"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not valid JSON"));
}

#[test]
fn last_save_wins() {
    let dir = init_project();
    stepper(&dir).args(["save", "--data", r#"{"v": 1}"#]).assert().success();
    stepper(&dir).args(["save", "--data", r#"{"v": 2}"#]).assert().success();
    assert_eq!(json_of(&dir, &["show"])["progress"]["payload"]["v"], 2);
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[test]
fn sessions_are_isolated_and_listed() {
    let dir = init_project();
    stepper(&dir)
        .args(["-s", "alice", "report", "100"])
        .assert()
        .success();
    stepper(&dir)
        .args(["-s", "bob", "report", "30"])
        .assert()
        .success();

    assert!(dir
        .path()
        .join(".stepper/sessions/bond_estimation/alice.yaml")
        .exists());
    assert_eq!(
        json_of(&dir, &["-s", "bob", "show"])["progress"]["percent"],
        30
    );
    let v = json_of(&dir, &["sessions"]);
    assert_eq!(v["sessions"], serde_json::json!(["alice", "bob"]));
}

#[test]
fn session_key_from_env() {
    let dir = init_project();
    stepper(&dir)
        .env("STEPPER_SESSION", "from-env")
        .args(["report", "20"])
        .assert()
        .success();
    assert!(dir
        .path()
        .join(".stepper/sessions/bond_estimation/from-env.yaml")
        .exists());
}

#[test]
fn invalid_session_key_is_rejected() {
    let dir = init_project();
    stepper(&dir)
        .args(["-s", "../escape", "status"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid session key"));
}

#[test]
fn reset_starts_session_over() {
    let dir = init_project();
    stepper(&dir).args(["report", "100"]).assert().success();
    stepper(&dir).arg("next").assert().success();

    stepper(&dir)
        .arg("reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed session 'default'"));
    let v = json_of(&dir, &["status"]);
    assert_eq!(v["active_step"], "fund_position");
    assert_eq!(v["overall_percent"], 0);

    stepper(&dir)
        .arg("reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("No stored session"));
}

#[test]
fn gated_resume_point_is_rewound() {
    let dir = init_project();
    let path = dir
        .path()
        .join(".stepper/sessions/bond_estimation/default.yaml");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        "active_step: estimate\nprogress:\n  - step_id: fund_position\n    percent: 100\n  - step_id: retired_step\n    percent: 100\n",
    )
    .unwrap();

    let v = json_of(&dir, &["status"]);
    assert_eq!(v["active_step"], "audited_financial");
    assert_eq!(v["steps"].as_array().unwrap().len(), 4);
}

// ---------------------------------------------------------------------------
// Other wizards
// ---------------------------------------------------------------------------

#[test]
fn skippable_step_does_not_block() {
    let dir = init_project();
    let issuer = |args: &[&str]| {
        let mut cmd = stepper(&dir);
        cmd.args(["--wizard", "issuer_services"]).args(args);
        cmd
    };
    for section in ["issuer_details", "issue_structure", "documents"] {
        issuer(&["report", "100", "--section", section])
            .assert()
            .success();
    }

    issuer(&["goto", "regulatory_filing"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "pre_issue_application -> regulatory_filing",
        ));
    issuer(&["goto", "isin_activation"]).assert().code(2);
}

#[test]
fn pending_payload_save_blocks_next_across_invocations() {
    let dir = init_project();
    let path = dir
        .path()
        .join(".stepper/sessions/issuer_services/default.yaml");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        "active_step: pre_issue_application\nprogress:\n  - step_id: pre_issue_application\n    percent: 100\n    payload: {issuer: acme}\n    sections: {issuer_details: 100, issue_structure: 100, documents: 100}\nunsaved: [pre_issue_application]\n",
    )
    .unwrap();

    let out = stepper(&dir)
        .args(["-w", "issuer_services", "next", "--json"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    let v: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["reason"], "unsaved_payload");
    assert_eq!(v["blocking_step"], "pre_issue_application");

    stepper(&dir)
        .args(["-w", "issuer_services", "save", "--data", r#"{"issuer": "acme"}"#])
        .assert()
        .success();
    stepper(&dir)
        .args(["-w", "issuer_services", "next"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "pre_issue_application -> intermediary_appointment",
        ));
}

#[test]
fn wizard_from_env() {
    let dir = init_project();
    let out = stepper(&dir)
        .env("STEPPER_WIZARD", "my_bond")
        .args(["steps", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["wizard"], "my_bond");
}

#[test]
fn unknown_wizard_fails() {
    let dir = init_project();
    stepper(&dir)
        .args(["-w", "no_such_wizard", "status"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown wizard: no_such_wizard"));
}

// ---------------------------------------------------------------------------
// stepper config
// ---------------------------------------------------------------------------

#[test]
fn default_config_is_valid() {
    let dir = init_project();
    stepper(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_show_prints_wizards() {
    let dir = init_project();
    stepper(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("issuer_services"))
        .stdout(predicate::str::contains("block_on_unsaved: true"));
}

#[test]
fn invalid_config_reports_errors() {
    let dir = init_project();
    std::fs::write(
        dir.path().join(".stepper/config.yaml"),
        "project:\n  name: broken\ndefault_wizard: missing\nwizards:\n  w:\n    label: W\n    steps:\n      - id: a\n        label: A\n        sections:\n          - id: x\n            weight: 60\n",
    )
    .unwrap();

    stepper(&dir)
        .args(["config", "validate"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[error] default_wizard 'missing'"))
        .stdout(predicate::str::contains("[warning]"));
}

#[test]
fn custom_wizard_from_config() {
    let dir = init_project();
    std::fs::write(
        dir.path().join(".stepper/config.yaml"),
        "project:\n  name: custom\ndefault_wizard: kyc\nwizards:\n  kyc:\n    label: KYC\n    steps:\n      - id: identity\n        label: Identity\n      - id: address\n        label: Address\n",
    )
    .unwrap();

    stepper(&dir)
        .arg("next")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Complete 'identity' first."));
    stepper(&dir).args(["report", "100"]).assert().success();
    stepper(&dir)
        .arg("next")
        .assert()
        .success()
        .stdout(predicate::str::contains("identity -> address"));
}
