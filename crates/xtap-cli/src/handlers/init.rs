use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use xtap_runtime::Config;

use crate::context::ExecutionContext;
use crate::output::{self, print_json};

#[derive(Serialize)]
struct InitSummary {
    config_path: PathBuf,
    config_written: bool,
    database_path: PathBuf,
}

pub fn handle(ctx: &ExecutionContext, force: bool) -> Result<()> {
    let config_path = ctx.config_path();
    let config_written = force || !config_path.exists();
    if config_written {
        Config::default().save_to(&config_path)?;
        tracing::info!(path = %config_path.display(), "wrote default configuration");
    }

    // Reload so a freshly written file decides the database location
    let config = Config::load_from(&config_path)?;
    let database_path = config.database_path(ctx.data_dir());
    xtap_index::Database::open(&database_path)?;

    let summary = InitSummary {
        config_path,
        config_written,
        database_path,
    };
    if ctx.is_json() {
        return print_json(&summary);
    }

    let status = if summary.config_written {
        "written"
    } else {
        "kept existing"
    };
    println!(
        "{} {} ({})",
        output::bold("config:  "),
        summary.config_path.display(),
        status
    );
    println!(
        "{} {}",
        output::bold("database:"),
        summary.database_path.display()
    );
    Ok(())
}
