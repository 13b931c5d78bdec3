//! CLI behaviour of the hostmon binary
use assert_cmd::prelude::*;
use std::process::Command;

fn output_text(out: &std::process::Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    )
}

#[test]
fn test_help_mentions_short_and_long_flags() {
    let output = Command::new(env!("CARGO_BIN_EXE_hostmon"))
        .arg("--help")
        .output()
        .expect("run hostmon --help");
    assert!(output.status.success());
    assert!(output.stdout.is_empty(), "help must not go to stdout");
    let text = output_text(&output);
    for flag in ["--interval", "-i", "--count", "-n", "--json", "--config", "-c"] {
        assert!(text.contains(flag), "help text missing {flag}\n{text}");
    }
}

#[test]
fn test_help_after_other_flags_still_exits_cleanly() {
    let out = Command::new(env!("CARGO_BIN_EXE_hostmon"))
        .args(["-i", "250", "-n", "3", "-h"])
        .output()
        .expect("run hostmon");
    assert!(out.status.success());
    assert!(output_text(&out).contains("Usage:"));
}

#[test]
fn test_bad_interval_is_rejected() {
    Command::cargo_bin("hostmon")
        .unwrap()
        .args(["--interval", "soon"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_unexpected_argument_is_rejected() {
    let out = Command::new(env!("CARGO_BIN_EXE_hostmon"))
        .arg("ws://127.0.0.1:3000/ws")
        .output()
        .expect("run hostmon");
    assert_eq!(out.status.code(), Some(2));
    assert!(output_text(&out).contains("Unexpected argument"));
}
