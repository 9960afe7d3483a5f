//! `farcaster-agent` command-line entry point.
//!
//! ```text
//! argv ──▶ clap (cli/mod.rs)
//!            │
//!            ▼
//!       bootstrap: config file + env overrides + validation ──▶ logging (stderr)
//!            │
//!            ▼
//!       Ctrl-C listener ──▶ Shutdown
//!            │
//!            ▼
//!       cli::run ──▶ cast | channel | group | dm | xmtp | bridge | account
//!            │
//!            ▼
//!       stdout: results      stderr: logs, errors, guidance
//!       exit 0 on success, 1 on any failure, 130 when interrupted
//! ```

use clap::Parser;
use std::process::ExitCode;

use farcaster_agent::cli::{self, output, Cli};
use farcaster_agent::lifecycle::{run_until_shutdown, signals, startup, Shutdown, INTERRUPTED_EXIT_CODE};
use farcaster_agent::AgentError;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    let config = match startup::bootstrap(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            output::report_error(&AgentError::from(e));
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    let mut interrupted = shutdown.subscribe();
    let _signals = signals::spawn_ctrl_c(shutdown.clone());

    match run_until_shutdown(cli::run(args.command, &config, &shutdown), &mut interrupted).await {
        Some(Ok(())) => ExitCode::SUCCESS,
        Some(Err(e)) => {
            tracing::debug!(error = ?e, config_error = e.is_config(), "Command failed");
            output::report_error(&e);
            ExitCode::FAILURE
        }
        None => {
            eprintln!("Interrupted.");
            ExitCode::from(INTERRUPTED_EXIT_CODE)
        }
    }
}
