//! Interactive session control on stdin.
//! Protocol: one command per line: pause, resume, cancel, retry, failed, status, quit.

use atcdl_core::OrchestratorHandle;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Pause,
    Resume,
    Cancel,
    Retry,
    Failed,
    Status,
    Quit,
}

/// Parses one input line. Blank or unknown lines yield None.
pub fn parse_command(line: &str) -> Option<ConsoleCommand> {
    let cmd = match line.trim().to_ascii_lowercase().as_str() {
        "pause" | "p" => ConsoleCommand::Pause,
        "resume" | "r" => ConsoleCommand::Resume,
        "cancel" | "stop" => ConsoleCommand::Cancel,
        "retry" => ConsoleCommand::Retry,
        "failed" | "f" => ConsoleCommand::Failed,
        "status" | "s" => ConsoleCommand::Status,
        "quit" | "q" | "exit" => ConsoleCommand::Quit,
        _ => return None,
    };
    Some(cmd)
}

/// Spawns a task that reads stdin and drives `handle`. The task ends on EOF or
/// `quit` (which cancels the session first).
pub fn spawn_console(handle: OrchestratorHandle) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let Some(cmd) = parse_command(&line) else {
                if !line.trim().is_empty() {
                    println!(
                        "unknown command '{}' (pause, resume, cancel, retry, failed, status, quit)",
                        line.trim()
                    );
                }
                continue;
            };
            if cmd == ConsoleCommand::Quit {
                let _ = handle.cancel().await;
                return;
            }
            if let Err(e) = execute(&handle, cmd).await {
                println!("{}", e);
            }
        }
        tracing::debug!("console input closed");
    })
}

async fn execute(handle: &OrchestratorHandle, cmd: ConsoleCommand) -> anyhow::Result<()> {
    match cmd {
        ConsoleCommand::Pause => {
            if !handle.pause().await? {
                println!("Nothing to pause.");
            }
        }
        ConsoleCommand::Resume => {
            handle.resume().await?;
        }
        ConsoleCommand::Cancel => {
            if !handle.cancel().await? {
                println!("Nothing to cancel.");
            }
        }
        ConsoleCommand::Retry => {
            handle.retry_failed().await?;
        }
        ConsoleCommand::Failed => {
            let failed = handle.failed_units().await?;
            if failed.is_empty() {
                println!("No failed downloads.");
            }
            for r in failed {
                println!("{}: {}", r.interval, r.error.as_deref().unwrap_or("unknown error"));
            }
        }
        ConsoleCommand::Status => {
            let s = handle.snapshot().await?;
            println!(
                "{}: {} planned, {} pending, {} in flight, {} completed, {} failed",
                s.phase,
                s.counts.planned,
                s.counts.pending,
                s.counts.in_flight,
                s.counts.completed,
                s.counts.failed
            );
        }
        ConsoleCommand::Quit => {}
    }
    Ok(())
}
