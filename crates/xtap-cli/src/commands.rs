use anyhow::Result;
use tracing_subscriber::EnvFilter;
use xtap_runtime::resolve_workspace_path;

use super::args::{Cli, Commands};
use super::context::ExecutionContext;
use super::handlers;
use crate::types::LogLevel;

pub fn run(cli: Cli) -> Result<()> {
    let data_dir = resolve_workspace_path(cli.data_dir.as_deref())?;
    let ctx = ExecutionContext::new(data_dir, cli.format)?;

    init_logging(cli.log_level, ctx.config.debug);
    tracing::debug!(data_dir = %ctx.data_dir().display(), "resolved data directory");

    match cli.command {
        Commands::Init { force } => handlers::init::handle(&ctx, force),
        Commands::Ingest { file } => handlers::ingest::handle(&ctx, &file),
        Commands::Recent { limit } => handlers::posts::recent(&ctx, limit),
        Commands::History { post_id } => handlers::posts::history(&ctx, &post_id),
        Commands::Top { limit } => handlers::posts::top(&ctx, limit),
        Commands::Author { handle } => handlers::posts::author(&ctx, &handle),
        Commands::Flows { window_secs } => handlers::flows::handle(&ctx, window_secs),
        Commands::Flags { window_secs } => handlers::flows::flags(&ctx, window_secs),
        Commands::Explore => handlers::explore::handle(&ctx),
        Commands::Credentials { reveal } => handlers::credentials::handle(&ctx, reveal),
        Commands::Trend {
            min_observations,
            max_age,
        } => handlers::trend::handle(&ctx, min_observations, max_age),
    }
}

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins over `--log-level`, which wins over `debug = true` in the
/// config file; the fallback is `warn`.
fn init_logging(log_level: Option<LogLevel>, config_debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = log_level.unwrap_or(if config_debug {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        });
        EnvFilter::new(level.to_string())
    });

    // A subscriber may already be installed when embedded in tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
