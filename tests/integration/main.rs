//! Integration tests for Seatflow
//!
//! These tests drive the demo scenario through the library and the CLI binary.

use seatflow_core::{CancelOutcome, FixedPolicy, Scenario, StepReport};
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

fn demo_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/flights.toml")
}

fn seatflow() -> Command {
    Command::new(env!("CARGO_BIN_EXE_seatflow"))
}

/// The demo scenario runs end to end and keeps every displaced passenger
#[test]
fn test_demo_scenario() {
    let scenario = Scenario::load(demo_path()).expect("demo should parse");
    let mut alloc = scenario.build().expect("demo should be valid");
    let mut policy = scenario.policy();

    let reports = scenario.run(&mut alloc, &mut policy).unwrap();
    assert_eq!(reports.len(), 5);

    let StepReport::Solved(first) = &reports[0] else {
        panic!("first step should solve");
    };
    assert_eq!(first.max_flow, 65);

    let StepReport::Canceled {
        outcome: CancelOutcome::Canceled(r),
        ..
    } = &reports[1]
    else {
        panic!("second step should cancel");
    };
    assert_eq!(r.displaced, r.placed() + r.queued + r.refunded);
    assert_eq!(r.refunded, 0);

    let StepReport::Solved(last) = &reports[4] else {
        panic!("last step should solve");
    };
    assert_eq!(last.max_flow, 45);

    let flight2 = alloc.resource_by_name("Flight 2 (12:00 PM)").unwrap();
    assert!(!flight2.is_active());
    assert_eq!(flight2.assigned, 0);
    assert_eq!(flight2.waiting, r.queued);
}

/// Overriding the shortfall policy turns queued passengers into refunds
#[test]
fn test_demo_with_refunds() {
    let scenario = Scenario::load(demo_path()).unwrap();
    let mut alloc = scenario.build().unwrap();
    let mut policy = FixedPolicy {
        on_shortfall: seatflow_core::ShortfallPolicy::Refund,
        ..scenario.policy()
    };

    scenario.run(&mut alloc, &mut policy).unwrap();
    assert_eq!(alloc.ledger().total_waiting(), 0);
}

/// Test that the CLI can be invoked
#[test]
fn test_cli_invocation() {
    let output = seatflow().arg("--help").output().expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("seatflow"));
    assert!(stdout.contains("Max-flow seat allocation"));
}

#[test]
fn test_cli_run_demo() {
    let output = seatflow()
        .arg("run")
        .arg(demo_path())
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Initial max flow: 65"));
    assert!(stdout.contains("Solved: max flow 45"));
    assert!(stdout.contains("Flight 2 (12:00 PM): CANCELED"));
}

#[test]
fn test_cli_solve_json() {
    let output = seatflow()
        .args(["--format", "json", "solve"])
        .arg(demo_path())
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["stats"]["max_flow"], 65);
    assert_eq!(value["resources"].as_array().unwrap().len(), 3);
    assert_eq!(value["edges"].as_array().unwrap().len(), 17);
}

#[test]
fn test_cli_check_rejects_bad_scenario() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "nodes = 2\nsource = 0\nsink = 0\n").unwrap();

    let output = seatflow()
        .arg("check")
        .arg(file.path())
        .output()
        .expect("Failed to execute command");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid network"));
}
