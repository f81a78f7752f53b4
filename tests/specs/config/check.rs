//! Config validation specs
//!
//! Verify `--check-config` accepts good files and rejects bad ones.

use crate::prelude::*;

#[test]
fn defaults_pass_without_a_file() {
    Project::empty()
        .sbd()
        .args(&["--check-config"])
        .passes()
        .stdout_eq("config ok\n");
}

#[test]
fn full_config_passes() {
    let project = Project::with_config(
        r#"
default_log_level = "warning"
max_queue_size = 16
flush_interval_seconds = 0.5
stop_grace_seconds = 1.0

[component_levels]
sb_service = "debug"

[performance_thresholds]
tick_interval = 2000.0
"#,
    );

    project
        .sbd()
        .args(&["--config", "sbd.toml", "--check-config"])
        .passes()
        .stdout_has("config ok");
}

#[test]
fn unknown_key_is_rejected() {
    let project = Project::with_config("max_queue = 3\n");

    project
        .sbd()
        .args(&["--config", "sbd.toml", "--check-config"])
        .fails()
        .stderr_has("max_queue")
        .stdout_lacks("config ok");
}

#[test]
fn bad_log_level_is_rejected() {
    let project = Project::with_config("default_log_level = \"chatty\"\n");

    project
        .sbd()
        .args(&["--config", "sbd.toml", "--check-config"])
        .fails()
        .stderr_has("invalid log level 'chatty'");
}

#[test]
fn zero_queue_size_is_rejected() {
    let project = Project::with_config("max_queue_size = 0\n");

    project
        .sbd()
        .args(&["--config", "sbd.toml", "--check-config"])
        .fails()
        .stderr_has("max_queue_size");
}

#[test]
fn out_of_range_durations_are_rejected() {
    for (field, value) in [("flush_interval_seconds", "1e30"), ("stop_grace_seconds", "1e-12")] {
        let project = Project::with_config(&format!("{field} = {value}\n"));

        project
            .sbd()
            .args(&["--config", "sbd.toml", "--check-config"])
            .fails()
            .stderr_has(field)
            .stdout_lacks("config ok");
    }
}

#[test]
fn missing_file_is_reported() {
    Project::empty()
        .sbd()
        .args(&["--config", "nope.toml", "--check-config"])
        .fails()
        .stderr_has("nope.toml");
}
