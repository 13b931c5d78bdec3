//! Config file location, loading and the tick loop driven by it
use std::fs;
use std::process::Command;
use std::sync::Mutex;

use hostmon::config::{config_path, Config, MonitorToggles};

// Global lock to serialize tests that mutate process-wide environment variables.
static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn test_config_path_follows_xdg() {
    let _guard = ENV_LOCK.lock().unwrap();
    let td = tempfile::tempdir().unwrap();
    std::env::set_var("XDG_CONFIG_HOME", td.path());
    assert_eq!(config_path(), td.path().join("hostmon").join("config.json"));
}

#[test]
fn test_missing_file_gives_defaults() {
    let td = tempfile::tempdir().unwrap();
    let cfg = Config::load_from(&td.path().join("nope.json")).unwrap();
    assert_eq!(cfg, Config::default());
    assert_eq!(cfg.interval_ms, 1000);
    assert_eq!(cfg.byte_precision, 2);
    assert_eq!(cfg.percent_precision, 1);
    assert!(!cfg.json);
}

#[test]
fn test_save_then_load() {
    let td = tempfile::tempdir().unwrap();
    let path = td.path().join("hostmon").join("config.json");
    let cfg = Config {
        interval_ms: 2500,
        monitors: MonitorToggles {
            network: false,
            ..MonitorToggles::default()
        },
        ..Config::default()
    };
    cfg.save_to(&path).unwrap();
    assert_eq!(Config::load_from(&path).unwrap(), cfg);
}

#[test]
fn test_malformed_file_is_an_error() {
    let td = tempfile::tempdir().unwrap();
    let path = td.path().join("config.json");
    fs::write(&path, "{ interval_ms: ").unwrap();
    assert!(Config::load_from(&path).is_err());
}

#[test]
fn test_env_override() {
    let _guard = ENV_LOCK.lock().unwrap();
    let mut cfg = Config::default();
    std::env::set_var("HOSTMON_INTERVAL_MS", "750");
    assert!(cfg.apply_env().is_ok());
    assert_eq!(cfg.interval_ms, 750);
    std::env::set_var("HOSTMON_INTERVAL_MS", "often");
    assert_eq!(cfg.apply_env(), Err("often".to_string()));
    assert_eq!(cfg.interval_ms, 750);
    std::env::remove_var("HOSTMON_INTERVAL_MS");
}

#[test]
fn test_malformed_file_is_logged_and_ignored() {
    let td = tempfile::tempdir().unwrap();
    let path = td.path().join("config.json");
    fs::write(&path, "not json").unwrap();
    let out = Command::new(env!("CARGO_BIN_EXE_hostmon"))
        .args(["-n", "0", "-c"])
        .arg(&path)
        .env_remove("RUST_LOG")
        .output()
        .expect("run hostmon");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("config unusable"), "{stderr}");
    assert!(out.stdout.is_empty());
}

#[test]
fn test_json_report_for_memory_only() {
    let td = tempfile::tempdir().unwrap();
    let path = td.path().join("config.json");
    fs::write(
        &path,
        r#"{"monitors": {"cpu": false, "ram": true, "disk": false, "network": false}}"#,
    )
    .unwrap();
    let out = Command::new(env!("CARGO_BIN_EXE_hostmon"))
        .args(["--json", "-n", "1", "-i", "100", "--config"])
        .arg(&path)
        .output()
        .expect("run hostmon");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1);
    let v: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert!(v.get("cpu").is_none());
    assert!(v.get("network").is_none());
    assert!(v["memory"]["total_physical"].as_u64().unwrap() > 0);
    let pct = v["memory"]["usage_percent"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&pct));
}
