//! `faultline validate` CLI surface.

use std::io::Write;
use std::process::Command;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_faultline")
}

#[test]
fn validate_accepts_a_well_formed_scenario_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "- path: /api/test\n  method: GET\n  responses:\n    - status: 200\n"
    )
    .unwrap();

    let output = Command::new(bin())
        .args(["validate", "--config", file.path().to_str().unwrap()])
        .output()
        .expect("failed to run faultline validate");
    assert!(output.status.success(), "{:?}", String::from_utf8_lossy(&output.stderr));
}

#[test]
fn validate_rejects_a_scenario_with_no_responses() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "- path: /api/test\n  method: GET\n  responses: []\n").unwrap();

    let output = Command::new(bin())
        .args(["validate", "--config", file.path().to_str().unwrap()])
        .output()
        .expect("failed to run faultline validate");
    assert!(!output.status.success());
}

#[test]
fn validate_requires_the_config_flag() {
    let output = Command::new(bin())
        .args(["validate"])
        .output()
        .expect("failed to run faultline validate");
    assert!(!output.status.success());
}
