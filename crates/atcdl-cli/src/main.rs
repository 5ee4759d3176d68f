use atcdl_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; a missing state dir is not fatal.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("log file unavailable, logging to stderr: {:#}", err);
    }

    // Exit explicitly: a stdin reader may still be parked on the blocking pool.
    let code = match CliCommand::run_from_args().await {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(err) => {
            eprintln!("atcdl error: {:#}", err);
            1
        }
    };
    std::process::exit(code);
}
