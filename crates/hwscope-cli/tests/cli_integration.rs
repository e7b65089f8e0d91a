//! CLI Integration Tests
//!
//! These tests run the `hwscope` binary against temporary config and state
//! files, so they never touch the user's real configuration.
//!
//! ```
//! cargo test --package hwscope-cli --test cli_integration
//! ```

use std::path::Path;
use std::process::{Command, Output};

/// Run hwscope with `--config` pointing into `dir`.
fn run_hwscope(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hwscope"))
        .arg("--config")
        .arg(dir.join("config.toml"))
        .arg("--no-color")
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run hwscope binary")
}

fn write_config(dir: &Path, body: &str) {
    let state = dir.join("state.toml");
    let content = format!(
        "host_name = \"testbench\"\nstate_file = {:?}\n{}",
        state.display().to_string(),
        body
    );
    std::fs::write(dir.join("config.toml"), content).unwrap();
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_hwscope(dir.path(), &["--help"]);

    assert!(output.status.success(), "Help should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    for cmd in ["watch", "tree", "palette", "config", "completions"] {
        assert!(stdout.contains(cmd), "Help should list {} command", cmd);
    }
}

#[test]
fn test_version_command() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_hwscope(dir.path(), &["--version"]);

    assert!(output.status.success(), "Version should succeed");
    assert!(String::from_utf8_lossy(&output.stdout).contains("hwscope"));
}

#[test]
fn test_completions() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_hwscope(dir.path(), &["completions", "bash"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("hwscope"));
}

// =============================================================================
// Config and Palette Commands
// =============================================================================

#[test]
fn test_config_path() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_hwscope(dir.path(), &["config", "path"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), dir.path().join("config.toml").display().to_string());
}

#[test]
fn test_config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_hwscope(dir.path(), &["config", "init"]);
    assert!(output.status.success());
    assert!(dir.path().join("config.toml").exists());

    let output = run_hwscope(dir.path(), &["config", "show"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[[hardware]]"));
    assert!(stdout.contains("/amdcpu/0"));

    let output = run_hwscope(dir.path(), &["config", "init"]);
    assert!(!output.status.success(), "Second init without --force should fail");
}

#[test]
fn test_palette_set_and_show() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_hwscope(dir.path(), &["palette", "--set", "#112233,#445566"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        " 0  #112233\n 1  #445566\n"
    );

    let output = run_hwscope(dir.path(), &["-q", "palette", "--format", "json"]);
    assert!(output.status.success());
    let palette: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(palette, vec!["#112233", "#445566"]);
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        "[monitor]\npalette = [\"#FF0000\", \"#FF0000\"]\n",
    );

    let output = run_hwscope(dir.path(), &["tree"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("duplicate color"), "stderr: {}", stderr);
}

// =============================================================================
// Tree and Watch Commands (simulated hardware)
// =============================================================================

#[test]
fn test_tree_uses_configured_hardware() {
    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        r#"
[[hardware]]
identifier = "/nvme/0"
name = "Test SSD"
type = "storage"
sensors = [{ type = "temperature", name = "Composite", value = 40.0 }]
"#,
    );

    let output = run_hwscope(dir.path(), &["tree"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("testbench"));
    assert!(lines[1].contains("Test SSD"));
    assert!(lines[2].contains("Composite"));
    assert!(lines[2].contains("40.0 °C"));
}

#[test]
fn test_watch_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "[monitor]\nupdate_interval = \"250ms\"\n");

    let output = run_hwscope(
        dir.path(),
        &[
            "-q", "watch", "-n", "2", "--format", "json", "--plot", "/amdcpu/0/load/0",
        ],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let frames: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(frames.len(), 2);
    assert!(frames[0]["tick"].as_u64().unwrap() < frames[1]["tick"].as_u64().unwrap());
    assert_eq!(frames[1]["plotted"][0], "/amdcpu/0/load/0");
    assert!(frames[1]["colors"]["/amdcpu/0/load/0"].is_string());

    let state = std::fs::read_to_string(dir.path().join("state.toml")).unwrap();
    assert!(state.contains("/amdcpu/0/load/0"));
    assert!(state.contains("250ms"));
}
