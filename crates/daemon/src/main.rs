// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Switchboard Daemon (sbd)
//!
//! Hosts the demo services on one event bus until a signal arrives or the
//! requested run time elapses.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use sb_core::SwitchboardConfig;
use sb_daemon::logging::setup_logging;
use sb_daemon::Switchboard;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sbd", version, about = "Run switchboard services on an in-process event bus")]
struct Args {
    /// TOML configuration file; defaults apply without one
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Validate the configuration and exit
    #[arg(long)]
    check_config: bool,

    /// Shut down after this many milliseconds instead of waiting for a signal
    #[arg(long, value_name = "MS")]
    run_for: Option<u64>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Heartbeat period in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    tick_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SwitchboardConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SwitchboardConfig::default(),
    };
    if args.check_config {
        println!("config ok");
        return Ok(());
    }

    let _log_guard = setup_logging(&config, args.log_file.as_deref())?;
    info!(pid = std::process::id(), "starting sbd");

    let mut switchboard = Switchboard::demo(config, Duration::from_millis(args.tick_ms.max(1)))?;
    let failed = switchboard.start().await;
    if failed > 0 {
        tracing::warn!(failed, "some services failed to start");
    }

    // Signal ready for a parent process waiting on startup
    println!("READY");

    let reason = wait_for_shutdown(args.run_for.map(Duration::from_millis)).await?;
    info!(reason, "shutting down");

    for (service, state) in switchboard.shutdown().await {
        println!("{service} {state}");
    }
    info!("sbd stopped");
    Ok(())
}

async fn wait_for_shutdown(run_for: Option<Duration>) -> std::io::Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let deadline = async {
        match run_for {
            Some(after) => tokio::time::sleep(after).await,
            None => std::future::pending::<()>().await,
        }
    };

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
        _ = deadline => "run time elapsed",
    })
}
