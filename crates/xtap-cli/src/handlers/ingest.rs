use anyhow::{Context, Result};
use std::path::Path;
use xtap_runtime::{Interceptor, replay_file};

use crate::context::ExecutionContext;
use crate::output::{self, print_json};

pub fn handle(ctx: &ExecutionContext, file: &Path) -> Result<()> {
    let interceptor = Interceptor::new(ctx.db()?, &ctx.config);
    let report = replay_file(file, &interceptor)
        .with_context(|| format!("Failed to replay {}", file.display()))?;

    if ctx.is_json() {
        return print_json(&report);
    }

    println!("{}", output::bold(&format!("Replayed {}", file.display())));
    println!("  exchanges:          {}", report.exchanges);
    println!("  calls logged:       {}", report.calls_logged);
    println!("  new posts:          {}", report.posts_inserted);
    println!("  snapshots recorded: {}", report.snapshots_recorded);
    println!("  credentials saved:  {}", report.credentials_saved);
    if report.malformed > 0 {
        println!(
            "  {}",
            output::dim(&format!("{} malformed line(s) skipped", report.malformed))
        );
    }
    Ok(())
}
