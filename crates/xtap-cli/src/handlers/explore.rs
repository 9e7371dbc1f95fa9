use anyhow::Result;
use xtap_runtime::latest_explore_content;

use crate::context::ExecutionContext;
use crate::output::{self, print_json};

pub fn handle(ctx: &ExecutionContext) -> Result<()> {
    let content = latest_explore_content(&ctx.db()?, &ctx.config.flows)?;
    if ctx.is_json() {
        return print_json(&content);
    }
    if content.is_empty() {
        println!("No explore sidebar captured yet.");
        return Ok(());
    }

    if !content.events.is_empty() {
        println!("{}", output::bold("Events"));
        for event in &content.events {
            println!("  {}  {}", event.title, output::dim(&event.time));
            if !event.media_url.is_empty() {
                println!("    {}", output::dim(&event.media_url));
            }
        }
    }
    if !content.trends.is_empty() {
        if !content.events.is_empty() {
            println!();
        }
        println!("{}", output::bold("Trends"));
        for trend in &content.trends {
            println!(
                "  {}  {}",
                trend.name,
                output::dim(&format!("{} · {}", trend.context, trend.description))
            );
        }
    }
    Ok(())
}
