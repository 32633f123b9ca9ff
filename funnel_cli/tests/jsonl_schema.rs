use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn json_lines(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("every stdout line is JSON"))
        .collect()
}

/// Validate the JSONL schema of a throttled replay.
#[rstest]
fn jsonl_simulate_schema() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(
        &cfg,
        "[funnel]\ntrigger_at = \"both\"\nmin_gap_ms = 100\n\n[replay]\nreducer = \"collect\"\n",
    )
    .unwrap();
    let trace = dir.path().join("trace.csv");
    fs::write(&trace, "at_ms,value\n0,a\n10,b\n20,c\n").unwrap();

    let out = Command::cargo_bin("funnel")
        .unwrap()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .arg("simulate")
        .arg("--trace")
        .arg(&trace)
        .output()
        .unwrap();
    assert!(out.status.success());

    let lines = json_lines(&out.stdout);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["at_ms"], 0);
    assert_eq!(lines[0]["value"], serde_json::json!(["a"]));
    assert_eq!(lines[1]["at_ms"], 100);
    assert_eq!(lines[1]["value"], serde_json::json!(["b", "c"]));
    assert_eq!(lines[2]["summary"]["calls"], 3);
    assert_eq!(lines[2]["summary"]["invocations"], 2);
}

#[rstest]
fn jsonl_check_schema() {
    let out = Command::cargo_bin("funnel")
        .unwrap()
        .arg("--json")
        .arg("check")
        .output()
        .unwrap();
    assert!(out.status.success());
    let lines = json_lines(&out.stdout);
    let v = &lines[0];
    assert_eq!(v["ok"], true);
    assert_eq!(v["trigger_at"], "end");
    assert!(v["min_gap_ms"].is_null());
    assert_eq!(v["reducer"], "latest");
}

/// Errors in JSON mode are a single object on stdout with a stable reason.
#[rstest]
#[case("[funnel]\nmin_gap_ms = 5\n", "InvalidConfig", 2)]
#[case("[funnel\n", "InvalidToml", 2)]
fn jsonl_error_schema(#[case] toml: &str, #[case] reason: &str, #[case] code: i32) {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(&cfg, toml).unwrap();

    let out = Command::cargo_bin("funnel")
        .unwrap()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .arg("check")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(code));

    let lines = json_lines(&out.stdout);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["reason"], reason);
    assert_eq!(lines[0]["exit_code"], code);
    assert!(lines[0]["message"].as_str().unwrap().starts_with("What happened"));
}

#[rstest]
fn jsonl_non_numeric_sum_is_a_runtime_error() {
    let dir = tempdir().unwrap();
    let trace = dir.path().join("trace.csv");
    fs::write(&trace, "at_ms,value\n0,1\n5,oops\n").unwrap();

    let out = Command::cargo_bin("funnel")
        .unwrap()
        .arg("--json")
        .arg("simulate")
        .arg("--trace")
        .arg(&trace)
        .arg("--reducer")
        .arg("sum")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let lines = json_lines(&out.stdout);
    let err = lines.last().unwrap();
    assert_eq!(err["reason"], "Error");
    assert!(err["message"].as_str().unwrap().contains("not a number"));
}
