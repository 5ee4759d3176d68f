//! `atcdl download`: run one session, printing progress and taking commands on stdin.

use anyhow::{Context, Result};
use atcdl_core::config::AtcConfig;
use atcdl_core::fetch::ArchiveFetchClient;
use atcdl_core::progress::{ChannelReporter, ProgressMessage};
use atcdl_core::{Orchestrator, Phase, SessionConfig};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::cli::console::spawn_console;
use crate::cli::DownloadArgs;

/// Returns Ok(false) when units are still failed at exit.
pub async fn run_download(cfg: &AtcConfig, args: DownloadArgs) -> Result<bool> {
    let destination = match args.output.or_else(|| cfg.output_dir.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir().context("current directory")?,
    };
    let mut session = SessionConfig::new(&args.station, args.start, args.end, destination, cfg);
    if let Some(n) = args.concurrency {
        session = session.with_concurrency(n);
    }
    if let Some(d) = args.delay {
        session = session.with_stagger_delay(d);
    }

    let (reporter, mut progress) = ChannelReporter::new();
    let handle = Orchestrator::spawn(
        Arc::new(ArchiveFetchClient::from_config(cfg)),
        Arc::new(reporter),
    );
    handle.start(session).await?;
    println!("Commands: pause, resume, cancel, retry, failed, status, quit");

    let mut console = spawn_console(handle.clone());
    let mut console_open = true;
    let mut rounds_left = args.retry_rounds;
    let mut phases = handle.phases();
    loop {
        let phase = *phases.borrow_and_update();
        if phase.is_settled() {
            drain(&mut progress);
            if phase == Phase::Completed && rounds_left > 0 {
                let failed = handle.snapshot().await?.counts.failed;
                if failed > 0 {
                    rounds_left -= 1;
                    handle.retry_failed().await?;
                    continue;
                }
            }
            if phase != Phase::Paused || !console_open {
                break;
            }
        }
        tokio::select! {
            Some(msg) = progress.recv() => print_message(&msg),
            changed = phases.changed() => changed.context("orchestrator stopped")?,
            _ = &mut console, if console_open => console_open = false,
        }
    }

    let failed = handle.failed_units().await?;
    if !failed.is_empty() {
        println!("Failed downloads:");
        for r in &failed {
            println!("  {}: {}", r.interval, r.error.as_deref().unwrap_or("unknown error"));
        }
    }
    Ok(failed.is_empty())
}

fn print_message(msg: &ProgressMessage) {
    match msg {
        ProgressMessage::Log(line) => println!("{}", line),
        ProgressMessage::Status(text) => eprintln!("{}", text),
        ProgressMessage::Session(ev) => {
            tracing::debug!(phase = %ev.phase, fraction = ev.fraction(), "{}", ev.summary)
        }
    }
}

fn drain(progress: &mut UnboundedReceiver<ProgressMessage>) {
    while let Ok(msg) = progress.try_recv() {
        print_message(&msg);
    }
}
