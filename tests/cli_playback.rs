use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_haptic_cli"))
}

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{}_{}", std::process::id(), name));
    std::fs::write(&path, contents).expect("write temp file");
    path
}

#[test]
fn play_preset_outputs_json_report() {
    let output = cli()
        .args(["play", "--preset", "sharp_tap"])
        .output()
        .expect("failed to run haptic_cli play");
    assert!(
        output.status.success(),
        "CLI exited with {:?}",
        output.status.code()
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("play report JSON payload");
    assert_eq!(json["source"], "sharp_tap");
    assert_eq!(json["event_count"], 1);
    assert_eq!(json["compiled"]["events"][0]["offset"], 0.0);
}

#[test]
fn play_pattern_file_with_wait_finishes() {
    let pattern = temp_file(
        "cli_pattern.json",
        r#"[
            {"kind":"transient","relative_time":0.0},
            {"kind":"continuous","relative_time":0.02,"duration":0.03}
        ]"#,
    );
    let output = cli()
        .args(["play", "--wait", "--pattern"])
        .arg(&pattern)
        .output()
        .expect("failed to run haptic_cli play --pattern");
    let _ = std::fs::remove_file(&pattern);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("play report JSON payload");
    assert_eq!(json["event_count"], 2);
    assert_eq!(json["finished"], true);
}

#[test]
fn config_sizes_diagnostics_history() {
    let config = temp_file(
        "cli_small_history.json",
        r#"{"telemetry":{"channel_capacity":4,"history_capacity":1}}"#,
    );
    let output = cli()
        .arg("--config")
        .arg(&config)
        .args(["play", "--preset", "sharp_tap"])
        .output()
        .expect("failed to run haptic_cli play --config");
    let _ = std::fs::remove_file(&config);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("play report JSON payload");
    let recent = json["diagnostics"]["recent"]
        .as_array()
        .expect("recent diagnostics array");
    assert_eq!(recent.len(), 1);
    assert_eq!(json["diagnostics"]["total_events"], 3);
    assert_eq!(json["diagnostics"]["dropped_events"], 2);
}

#[test]
fn invalid_pattern_fails() {
    let pattern = temp_file(
        "cli_invalid_pattern.json",
        r#"[{"kind":"continuous","relative_time":0.0,"duration":0.0}]"#,
    );
    let output = cli()
        .args(["play", "--pattern"])
        .arg(&pattern)
        .output()
        .expect("failed to run haptic_cli play --pattern");
    let _ = std::fs::remove_file(&pattern);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("index 0"), "unexpected stderr: {stderr}");
}

#[test]
fn unknown_preset_fails() {
    let output = cli()
        .args(["play", "--preset", "morse"])
        .output()
        .expect("failed to run haptic_cli play");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn presets_lists_every_preset() {
    let output = cli()
        .arg("presets")
        .output()
        .expect("failed to run haptic_cli presets");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let names: Vec<String> = stdout
        .lines()
        .map(|line| {
            let json: Value = serde_json::from_str(line).expect("preset JSON line");
            json["name"].as_str().unwrap_or_default().to_string()
        })
        .collect();
    assert_eq!(names, vec!["sharp_tap", "decay_series", "sos"]);
}

#[test]
fn impact_reports_delivery() {
    let output = cli()
        .args(["impact", "--style", "heavy"])
        .output()
        .expect("failed to run haptic_cli impact");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("feedback JSON payload");
    assert_eq!(json["feedback"], "impact:heavy");
    assert_eq!(json["delivered"], 1);
}

#[test]
fn vibrate_reports_delivery() {
    let output = cli()
        .arg("vibrate")
        .output()
        .expect("failed to run haptic_cli vibrate");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("feedback JSON payload");
    assert_eq!(json["feedback"], "alert_vibration");
    assert_eq!(json["delivered"], 1);
}
