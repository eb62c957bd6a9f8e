//! Subprocess tests for the `curtain` binary.
//!
//! Each test builds a hermetic site directory in a tempdir and runs the
//! binary against it with short timings.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn curtain_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_curtain"))
}

/// Creates `public/` with two images, one video and the cue asset, and a
/// config listing them plus one missing image.
fn site() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let public = dir.path().join("public");
    for (path, size) in [
        ("textures/velvet.png", 512),
        ("images/menu/arabian.png", 256),
        ("videos/hero-luxury.mp4", 4096),
        ("audio/curtain-swoosh.wav", 64),
    ] {
        let file = public.join(path);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, vec![0u8; size]).unwrap();
    }

    std::fs::write(
        dir.path().join("curtain.toml"),
        r#"
[timing]
min_intro_ms = 50
safety_ceiling_ms = 3000
dismiss_delay_ms = 20

[resources]
images = ["/textures/velvet.png", "/images/menu/arabian.png", "/images/missing.jpg"]
videos = ["/videos/hero-luxury.mp4"]
"#,
    )
    .unwrap();
    dir
}

fn curtain(dir: &Path, args: &[&str]) -> Output {
    Command::new(curtain_bin())
        .current_dir(dir)
        .args(args)
        .output()
        .expect("failed to run curtain")
}

fn json_stdout(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

#[test]
fn run_dismisses_on_primary_path() {
    let dir = site();
    let output = curtain(dir.path(), &["run", "--format", "json", "--events"]);

    assert_eq!(output.status.code(), Some(0), "{output:?}");
    let json = json_stdout(&output);
    let report = &json["report"];
    assert_eq!(report["final_state"], "dismissed");
    assert_eq!(report["winning_path"], "primary");
    assert_eq!(report["scroll_release"], "auto");
    assert_eq!(report["cue"]["status"], "played");
    assert_eq!(report["torn_down"], false);

    let settlements = report["preload"]["settlements"].as_array().unwrap();
    assert_eq!(settlements.len(), 4);
    let failed: Vec<_> = settlements
        .iter()
        .filter(|s| s["outcome"] == "failed")
        .map(|s| s["url"].as_str().unwrap())
        .collect();
    assert_eq!(failed, ["/images/missing.jpg"]);

    let ready_ms = report["ready_to_dismiss_ms"].as_u64().unwrap();
    assert!(ready_ms >= 50);

    let events = json["events"].as_array().unwrap();
    assert_eq!(events[0]["event"], "scroll_locked");
    assert!(events.iter().any(|e| e["event"] == "path_won"));
}

#[test]
fn run_text_output() {
    let dir = site();
    let output = curtain(dir.path(), &["run", "--silent"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("state:        dismissed"), "{stdout}");
    assert!(stdout.contains("3 loaded, 1 failed"), "{stdout}");
    assert!(stdout.contains("/images/missing.jpg"), "{stdout}");
    assert!(stdout.contains("cue:          played"), "{stdout}");
}

#[test]
fn missing_cue_asset_does_not_fail_run() {
    let dir = site();
    std::fs::remove_file(dir.path().join("public/audio/curtain-swoosh.wav")).unwrap();

    let output = curtain(dir.path(), &["run", "--format", "json"]);

    assert_eq!(output.status.code(), Some(0));
    let report = &json_stdout(&output)["report"];
    assert_eq!(report["final_state"], "dismissed");
    assert_eq!(report["cue"]["status"], "failed");
}

#[test]
fn teardown_before_dismissal_exits_30() {
    let dir = site();
    let output = curtain(
        dir.path(),
        &[
            "run",
            "--format",
            "json",
            "--min-intro-ms",
            "2000",
            "--teardown-after-ms",
            "100",
        ],
    );

    assert_eq!(output.status.code(), Some(30));
    let report = &json_stdout(&output)["report"];
    assert_eq!(report["torn_down"], true);
    assert_eq!(report["final_state"], "pending");
    assert_eq!(report["scroll_release"], "unset");
}

#[test]
fn missing_asset_root_exits_12() {
    let dir = site();
    let output = curtain(dir.path(), &["run", "--asset-root", "no-such-dir"]);

    assert_eq!(output.status.code(), Some(12));
    assert!(String::from_utf8_lossy(&output.stderr).contains("asset root not found"));
}

#[test]
fn invalid_config_exits_10() {
    let dir = site();
    std::fs::write(
        dir.path().join("curtain.toml"),
        "[timing]\nmin_intro_ms = 9000\nsafety_ceiling_ms = 1000\n",
    )
    .unwrap();

    let run = curtain(dir.path(), &["run"]);
    assert_eq!(run.status.code(), Some(10));

    let check = curtain(dir.path(), &["check-config", "--json"]);
    assert_eq!(check.status.code(), Some(10));
    let error: serde_json::Value = serde_json::from_slice(&check.stderr).unwrap();
    assert_eq!(error["code"], "config_error");
}

#[test]
fn unknown_config_key_exits_10() {
    let dir = site();
    std::fs::write(dir.path().join("curtain.toml"), "[theme]\ndark = true\n").unwrap();

    let output = curtain(dir.path(), &["check-config"]);
    assert_eq!(output.status.code(), Some(10));
}

#[test]
fn explicit_missing_config_exits_12() {
    let dir = site();
    let output = curtain(dir.path(), &["--config", "elsewhere.toml", "check-config"]);
    assert_eq!(output.status.code(), Some(12));
}

#[test]
fn unreadable_config_exits_1() {
    let dir = site();
    std::fs::create_dir(dir.path().join("conf.d")).unwrap();
    let output = curtain(dir.path(), &["--config", "conf.d", "check-config"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn check_config_reports_ready_window() {
    let dir = site();
    let output = curtain(dir.path(), &["check-config", "--json"]);

    assert_eq!(output.status.code(), Some(0));
    let json = json_stdout(&output);
    assert_eq!(json["valid"], true);
    assert_eq!(json["earliest_ready_ms"], 70);
    assert_eq!(json["latest_ready_ms"], 3020);
    assert_eq!(json["images"], 3);
    assert_eq!(json["videos"], 1);
}

#[test]
fn default_config_round_trips_through_check() {
    let dir = tempfile::tempdir().unwrap();
    let output = curtain(dir.path(), &["default-config"]);
    assert_eq!(output.status.code(), Some(0));

    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("[timing]"));
    assert!(text.contains("min_intro_ms = 5500"));
    assert!(text.contains("curtain-swoosh.wav"));

    std::fs::write(dir.path().join("curtain.toml"), &text).unwrap();
    let check = curtain(dir.path(), &["check-config"]);
    assert_eq!(check.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&check.stdout).contains("8000..14500 ms"));
}
