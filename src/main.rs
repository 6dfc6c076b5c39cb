//! spot-watch: run shutdown work ahead of a spot instance interruption.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌────────────┐   fetch   ┌──────────────┐  signal  ┌──────────────────────┐
//!   │ ImdsClient │◀──────────│ SignalPoller │─────────▶│ TerminationScheduler │
//!   │  (IMDSv2)  │──────────▶│ (priority    │          │  deadline - lead     │
//!   └────────────┘  result   │  ordered)    │          │  cancellable wait    │
//!                            └──────────────┘          └──────────┬───────────┘
//!                                   │ rebalance                   │ decision
//!                                   ▼                             ▼
//!                         on_rebalance commands        on_termination commands
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use spot_watch::actions::{BackgroundActions, CommandRunner};
use spot_watch::config::{read_config, validate_config, ConfigError, WatchConfig};
use spot_watch::lifecycle::{signals, Shutdown};
use spot_watch::observability::{logging, metrics};
use spot_watch::{ImdsClient, SignalPoller, TerminationScheduler};

#[derive(Parser)]
#[command(name = "spot-watch", version)]
#[command(about = "Run shutdown commands ahead of a spot instance interruption", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Metadata service base URL.
    #[arg(long)]
    endpoint: Option<String>,

    /// Seconds before the interruption deadline to run termination commands.
    #[arg(long, value_name = "SECS")]
    lead_time: Option<u64>,

    /// Seconds between polling cycles.
    #[arg(long, value_name = "SECS")]
    poll_interval: Option<u64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Termination command, appended after any configured ones.
    #[arg(last = true, value_name = "COMMAND")]
    command: Vec<String>,
}

impl Cli {
    fn into_config(self) -> Result<WatchConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => WatchConfig::default(),
        };

        if let Some(endpoint) = self.endpoint {
            config.metadata.endpoint = endpoint;
        }
        if let Some(secs) = self.lead_time {
            config.scheduler.lead_time_secs = secs;
        }
        if let Some(secs) = self.poll_interval {
            config.poller.poll_interval_secs = secs;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if !self.command.is_empty() {
            config.actions.on_termination.push(self.command.join(" "));
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

/// Upper bound on waiting for rebalance batches before exit.
fn rebalance_grace(config: &WatchConfig) -> Duration {
    let commands = config.actions.on_rebalance.len().max(1) as u32;
    config.actions.command_timeout().saturating_mul(commands)
}

async fn drain_background(actions: &BackgroundActions, grace: Duration) {
    if actions.pending() == 0 {
        return;
    }
    let report = actions.drain(grace).await;
    tracing::info!(
        completed = report.completed,
        aborted = report.aborted,
        "Background actions collected"
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        endpoint = %config.metadata.endpoint,
        lead_time_secs = config.scheduler.lead_time_secs,
        poll_interval_secs = config.poller.poll_interval_secs,
        termination_commands = config.actions.on_termination.len(),
        "spot-watch v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(e) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    error = %e,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let client = ImdsClient::new(&config.metadata)?;
    let rebalance_commands = config.actions.on_rebalance.clone();
    let command_timeout = config.actions.command_timeout();
    let background = BackgroundActions::new();
    let grace = rebalance_grace(&config);

    let advisory_actions = background.clone();
    let mut scheduler = TerminationScheduler::new(
        SignalPoller::new(client),
        config.poller.paths.clone(),
        shutdown.subscribe(),
    )
    .on_advisory(move |signal| {
        if rebalance_commands.is_empty() {
            return;
        }
        let runner = CommandRunner::new(command_timeout).with_signal(signal);
        advisory_actions.spawn("rebalance", runner, rebalance_commands.clone());
    });

    let Some(decision) = scheduler
        .schedule_and_wait(config.scheduler.lead_time(), config.poller.poll_interval())
        .await
    else {
        tracing::info!("Watch ended without a scheduled interruption");
        drain_background(&background, grace).await;
        return Ok(());
    };

    tracing::warn!(
        deadline = %decision.deadline,
        "Lead time reached, running termination actions"
    );

    let runner = CommandRunner::new(command_timeout)
        .with_env("SPOT_WATCH_KIND", "action")
        .with_decision(&decision);
    let failures = runner.run_all(&config.actions.on_termination).await;
    drain_background(&background, grace).await;

    if failures.is_empty() {
        tracing::info!("Termination actions complete");
        Ok(())
    } else {
        Err(format!("{} termination action(s) failed", failures.len()).into())
    }
}
