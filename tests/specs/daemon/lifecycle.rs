//! Daemon lifecycle specs
//!
//! Verify sbd starts its services, reports ready, and stops them all.

use crate::prelude::*;

#[test]
fn run_for_prints_ready_then_final_states() {
    Project::empty()
        .sbd()
        .args(&["--run-for", "300", "--tick-ms", "20"])
        .passes()
        .stdout_eq("READY\nheartbeat STOPPED\nmonitor STOPPED\n");
}

#[test]
fn custom_config_is_honored() {
    let project = Project::with_config("stop_grace_seconds = 0.2\nflush_interval_seconds = 0.05\n");

    project
        .sbd()
        .args(&["--config", "sbd.toml", "--run-for", "200", "--tick-ms", "10"])
        .passes()
        .stdout_has("READY")
        .stdout_has("heartbeat STOPPED");
}

#[test]
fn invalid_config_prevents_startup() {
    let project = Project::with_config("flush_interval_seconds = -1.0\n");

    project
        .sbd()
        .args(&["--config", "sbd.toml", "--run-for", "100"])
        .fails()
        .stdout_lacks("READY")
        .stderr_has("flush_interval_seconds");
}

#[test]
fn help_lists_options() {
    Project::empty()
        .sbd()
        .args(&["--help"])
        .passes()
        .stdout_has("--check-config")
        .stdout_has("--run-for")
        .stdout_has("--log-file");
}
