use anyhow::Result;
use chrono::{Duration, Utc};
use serde::Serialize;
use xtap_engine::FlowAnalysis;
use xtap_runtime::analyze_flows;

use crate::context::ExecutionContext;
use crate::output::{self, format_time, print_json};

fn run_analysis(ctx: &ExecutionContext, window_secs: Option<i64>) -> Result<FlowAnalysis> {
    let window = window_secs.map(Duration::seconds);
    Ok(analyze_flows(
        &ctx.db()?,
        &ctx.config.flows,
        window,
        Utc::now(),
    )?)
}

pub fn handle(ctx: &ExecutionContext, window_secs: Option<i64>) -> Result<()> {
    let analysis = run_analysis(ctx, window_secs)?;
    if ctx.is_json() {
        return print_json(&analysis);
    }

    println!(
        "{}",
        output::bold(&format!(
            "{} call(s) matching '{}'",
            analysis.calls, ctx.config.flows.url_filter
        ))
    );
    if analysis.calls == 0 {
        return Ok(());
    }

    println!();
    println!("{}", output::bold("Timing (seconds until next call)"));
    if analysis.timings.is_empty() {
        println!("  {}", output::dim("not enough classified calls"));
    }
    for stat in &analysis.timings {
        println!(
            "  {:<20} {:>8.2}s  {}",
            stat.call_type.as_str(),
            stat.mean_secs,
            output::dim(&format!("n={}", stat.samples))
        );
    }

    println!();
    println!("{}", output::bold("Conversation traces"));
    if analysis.traces.is_empty() {
        println!("  {}", output::dim("no calls carried a conversation id"));
    }
    for trace in &analysis.traces {
        println!("  {}", trace.conversation_id);
        for step in &trace.steps {
            let subject = step
                .tweet_id
                .as_deref()
                .map(|id| format!(" post {}", id))
                .unwrap_or_default();
            println!(
                "    {}  {:<20}{}",
                output::dim(&format_time(step.timestamp)),
                step.call_type.as_str(),
                subject
            );
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct FlagState<'a> {
    name: &'a str,
    enabled: Option<bool>,
}

pub fn flags(ctx: &ExecutionContext, window_secs: Option<i64>) -> Result<()> {
    let analysis = run_analysis(ctx, window_secs)?;
    let states: Vec<FlagState<'_>> = ctx
        .config
        .flows
        .feature_flags
        .iter()
        .map(|name| FlagState {
            name,
            enabled: analysis.feature_flags.get(name).copied(),
        })
        .collect();

    if ctx.is_json() {
        return print_json(&states);
    }
    for state in &states {
        let value = match state.enabled {
            Some(enabled) => output::flag(enabled),
            None => output::dim("not observed"),
        };
        println!("{:<48} {}", state.name, value);
    }
    Ok(())
}
