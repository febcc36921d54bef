//! CLI replay round-trips through the packaged binary.

use std::fs;

use assert_cmd::Command;

const CSV: &str = "kind,ts,ShardID,IndexName,rid,tid,Operation,ShardRole\n\
start,1535065340330,0,sonested,A,T1,shardquery,NA\n\
end,1535065340625,0,sonested,A,T1,shardquery,NA\n\
start,1535065342000,0,sonested,B,T2,shardquery,NA\n";

#[test]
fn replay_emits_window_reports_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.csv");
    fs::write(&path, CSV).unwrap();

    let output = Command::cargo_bin("cli")
        .unwrap()
        .args(["replay", path.to_str().unwrap(), "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let windows = report["windows"].as_array().unwrap();
    assert_eq!(windows.len(), 1);
    let window = &windows[0];
    assert_eq!(window["window_start"], 1_535_065_340_000i64);
    assert_eq!(window["latency"][0]["rid"], "A");
    assert_eq!(window["latency"][0]["lat"], 295);
    assert_eq!(window["inflight"][0]["rid"], "B");
    assert_eq!(report["stats"]["events_ingested"], 3);
}

#[test]
fn replay_renders_text_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.csv");
    fs::write(&path, CSV).unwrap();

    let output = Command::cargo_bin("cli")
        .unwrap()
        .args(["replay", path.to_str().unwrap(), "--no-color"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("shard_rq_1535065340000"));
    assert!(text.contains("295"));
    assert!(text.contains("1 windows"));
}

#[test]
fn replay_honors_a_toml_config() {
    let dir = tempfile::tempdir().unwrap();
    let events = dir.path().join("events.csv");
    fs::write(&events, CSV).unwrap();
    let config = dir.path().join("engine.toml");
    fs::write(&config, "sampling_interval_ms = 10000\n").unwrap();

    let output = Command::cargo_bin("cli")
        .unwrap()
        .args([
            "replay",
            events.to_str().unwrap(),
            "--format",
            "json",
            "--config",
            config.to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["windows"][0]["window_start"], 1_535_065_340_000i64);
}

#[test]
fn replay_fails_on_a_missing_file() {
    Command::cargo_bin("cli")
        .unwrap()
        .args(["replay", "no-such-file.csv"])
        .assert()
        .failure();
}
