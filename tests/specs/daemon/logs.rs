//! Daemon logging specs
//!
//! Verify log routing and level configuration.

use crate::prelude::*;

#[test]
fn log_file_collects_service_transitions() {
    let project = Project::with_config("default_log_level = \"info\"\n");

    project
        .sbd()
        .args(&["--config", "sbd.toml", "--run-for", "200", "--log-file", "logs/sbd.log"])
        .passes();

    let log = std::fs::read_to_string(project.path().join("logs/sbd.log")).unwrap();
    assert!(log.contains("starting sbd"), "log:\n{log}");
    assert!(log.contains("service status"), "log:\n{log}");
    assert!(log.contains("sbd stopped"), "log:\n{log}");
}

#[test]
fn logs_go_to_stderr_by_default() {
    Project::empty()
        .sbd()
        .args(&["--run-for", "100"])
        .passes()
        .stderr_has("starting sbd")
        .stdout_lacks("starting sbd");
}

#[test]
fn rust_log_overrides_config_levels() {
    let project = Project::with_config("default_log_level = \"error\"\n");

    project
        .sbd()
        .args(&["--config", "sbd.toml", "--run-for", "100"])
        .env("RUST_LOG", "info")
        .passes()
        .stderr_has("starting sbd");
}

#[test]
fn quiet_level_suppresses_info() {
    let project = Project::with_config("default_log_level = \"error\"\n");

    let outcome = project
        .sbd()
        .args(&["--config", "sbd.toml", "--run-for", "100"])
        .passes();
    assert!(!outcome.stderr.contains("starting sbd"), "stderr:\n{}", outcome.stderr);
}
