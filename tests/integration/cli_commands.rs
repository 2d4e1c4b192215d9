#![allow(missing_docs)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use replay_pacer::pacer::PacerConfig;
use serde_json::Value;
use tempfile::TempDir;

fn write_config(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write config");
    (dir, path)
}

fn stdout_of(args: &[&str]) -> Vec<u8> {
    cargo_bin_cmd!("replay-pacer")
        .env_remove("REPLAY_PACER_CONFIG")
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone()
}

#[test]
fn config_prints_default_toml() {
    let output = stdout_of(&["config"]);
    let text = String::from_utf8(output).expect("utf8");
    assert!(text.contains("max_budget = 2000"));
    assert!(text.contains("enabled = false"));
    let parsed: PacerConfig = toml::from_str(&text).expect("valid toml");
    assert_eq!(parsed, PacerConfig::default());
}

#[test]
fn config_preset_as_json() {
    let output = stdout_of(&["--format", "json", "config", "--preset", "smooth"]);
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["hysteresis"], 50);
    assert_eq!(json["enabled"], true);
}

#[test]
fn simulate_emits_one_entry_per_cycle() {
    let output = stdout_of(&["--format", "json", "simulate", "--cycles", "5", "--seed", "3"]);
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    let steps = json.as_array().expect("array of steps");
    assert_eq!(steps.len(), 5);
    for (idx, step) in steps.iter().enumerate() {
        assert_eq!(step["cycle"], idx as u64);
        let budget = step["report"]["budget"].as_u64().expect("budget");
        assert!((10..=2000).contains(&budget));
        let agg = step["report"]["aggressiveness"].as_f64().expect("aggressiveness");
        assert!((0.0..=1.0).contains(&agg));
    }
}

#[test]
fn simulate_is_deterministic_per_seed() {
    let args = ["--format", "json", "simulate", "--cycles", "12", "--seed", "42"];
    assert_eq!(stdout_of(&args), stdout_of(&args));
}

#[test]
fn simulate_text_ends_with_summary() {
    let output = stdout_of(&["simulate", "--cycles", "3"]);
    let text = String::from_utf8(output).expect("utf8");
    assert_eq!(text.lines().filter(|l| l.starts_with("cycle=")).count(), 3);
    assert!(text.lines().last().unwrap_or("").starts_with("final budget="));
}

#[test]
fn simulate_uses_config_file_bounds() {
    let (_dir, path) = write_config(
        "narrow.toml",
        "min_budget = 50\nmax_budget = 60\nhysteresis = 0\n",
    );
    let path = path.to_str().expect("utf8 path");
    let output = stdout_of(&["--format", "json", "simulate", "--cycles", "8", "--config", path]);
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    for step in json.as_array().expect("array") {
        let budget = step["report"]["budget"].as_u64().expect("budget");
        assert!((50..=60).contains(&budget), "budget {budget} outside file bounds");
    }
}

#[test]
fn simulate_reads_config_from_env() {
    let (_dir, path) = write_config("env.toml", "min_budget = 77\nmax_budget = 78\n");
    let output = cargo_bin_cmd!("replay-pacer")
        .env("REPLAY_PACER_CONFIG", &path)
        .args(["--format", "json", "simulate", "--cycles", "1"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    let budget = json[0]["report"]["budget"].as_u64().expect("budget");
    assert!((77..=78).contains(&budget));
}

#[test]
fn invalid_config_file_fails() {
    let (_dir, path) = write_config("bad.toml", "min_budget = 900\nmax_budget = 10\n");
    let output = cargo_bin_cmd!("replay-pacer")
        .env_remove("REPLAY_PACER_CONFIG")
        .args(["simulate", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8(output).expect("utf8");
    assert!(stderr.starts_with("error:"), "unexpected stderr: {stderr}");
}

#[test]
fn missing_config_file_fails() {
    let dir = TempDir::new().expect("tempdir");
    cargo_bin_cmd!("replay-pacer")
        .env_remove("REPLAY_PACER_CONFIG")
        .args(["simulate", "--config"])
        .arg(dir.path().join("absent.toml"))
        .assert()
        .failure()
        .code(1);
}

#[test]
fn verbose_simulate_logs_each_cycle() {
    let output = cargo_bin_cmd!("replay-pacer")
        .env_remove("REPLAY_PACER_CONFIG")
        .env_remove("RUST_LOG")
        .args(["simulate", "--cycles", "2", "--verbose"])
        .assert()
        .success()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8(output).expect("utf8");
    let cycles: Vec<_> = stderr
        .lines()
        .filter(|line| line.contains("replay.pacer.cycle"))
        .collect();
    assert_eq!(cycles.len(), 2, "stderr: {stderr}");
    let fields = [
        "queue=",
        "miss_rate=",
        "wal_bps=",
        "eq=",
        "em=",
        "ew=",
        "aggressiveness=",
        "budget=",
    ];
    for field in fields {
        assert!(cycles[0].contains(field), "missing {field} in {}", cycles[0]);
    }
    assert!(!stderr.contains('\u{1b}'), "ansi escapes in piped stderr");
}

#[test]
fn quiet_simulate_logs_nothing() {
    let output = cargo_bin_cmd!("replay-pacer")
        .env_remove("REPLAY_PACER_CONFIG")
        .env_remove("RUST_LOG")
        .args(["simulate", "--cycles", "2"])
        .assert()
        .success()
        .get_output()
        .stderr
        .clone();
    assert!(!String::from_utf8_lossy(&output).contains("replay.pacer.cycle"));
}
