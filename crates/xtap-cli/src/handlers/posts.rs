use anyhow::{Result, bail};
use serde::Serialize;
use xtap_types::{Post, PostWithEngagement, SnapshotPoint};

use crate::context::ExecutionContext;
use crate::output::{self, format_count, format_time, print_json};

const PREVIEW_CHARS: usize = 80;

pub fn recent(ctx: &ExecutionContext, limit: usize) -> Result<()> {
    let posts = ctx.db()?.recent_posts(limit)?;
    if ctx.is_json() {
        return print_json(&posts);
    }
    if posts.is_empty() {
        println!("No posts captured yet.");
        return Ok(());
    }
    for entry in &posts {
        print_post_line(entry);
    }
    Ok(())
}

pub fn author(ctx: &ExecutionContext, handle: &str) -> Result<()> {
    let username = handle.trim_start_matches('@');
    let posts = ctx.db()?.posts_by_author(username)?;
    if ctx.is_json() {
        return print_json(&posts);
    }
    if posts.is_empty() {
        println!("No posts captured for @{}.", username);
        return Ok(());
    }
    for entry in &posts {
        print_post_line(entry);
    }
    Ok(())
}

#[derive(Serialize)]
struct PostHistory {
    post: Post,
    snapshots: Vec<SnapshotPoint>,
}

pub fn history(ctx: &ExecutionContext, post_id: &str) -> Result<()> {
    let db = ctx.db()?;
    let Some(post) = db.get_post(post_id)? else {
        bail!("Post not found: {}", post_id);
    };
    let snapshots = db.history(post_id)?;

    if ctx.is_json() {
        return print_json(&PostHistory { post, snapshots });
    }

    println!(
        "{} {}",
        output::handle(&post.username),
        output::dim(&post.url())
    );
    println!("{}", output::preview(&post.text, PREVIEW_CHARS));
    println!();
    if snapshots.is_empty() {
        println!("No snapshots recorded.");
        return Ok(());
    }
    println!(
        "{:<19}  {:>7}  {:>8}  {:>7}  {:>8}  {:>10}  {:>9}",
        "CAPTURED", "AGE(h)", "LIKES", "REPOSTS", "REPLIES", "VIEWS", "LIKES/h"
    );
    for point in &snapshots {
        println!(
            "{:<19}  {:>7.1}  {:>8}  {:>7}  {:>8}  {:>10}  {:>9.1}",
            format_time(point.captured_at),
            point.age_hours,
            format_count(point.counts.likes),
            format_count(point.counts.retweets),
            format_count(point.counts.replies),
            format_count(point.counts.views),
            point.rates.likes,
        );
    }
    Ok(())
}

pub fn top(ctx: &ExecutionContext, limit: usize) -> Result<()> {
    let rows = ctx.db()?.top_by_observation_count(limit)?;
    if ctx.is_json() {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No posts captured yet.");
        return Ok(());
    }
    println!(
        "{:<20}  {:<16}  {:>5}  {:>8}  {:<9}  {:<19}",
        "POST", "AUTHOR", "OBS", "LIKES", "FOLLOWING", "LAST CAPTURE"
    );
    for row in &rows {
        println!(
            "{:<20}  {:<16}  {:>5}  {:>8}  {:<9}  {:<19}",
            row.post_id,
            format!("@{}", row.username),
            row.observation_count,
            format_count(row.likes),
            if row.following { "yes" } else { "no" },
            format_time(row.captured_at),
        );
    }
    Ok(())
}

fn print_post_line(entry: &PostWithEngagement) {
    let captured = entry
        .captured_at
        .map(format_time)
        .unwrap_or_else(|| "never".to_string());
    let kind = if entry.post.is_long_form { " [long]" } else { "" };

    println!(
        "{} {}{}",
        output::handle(&entry.post.username),
        output::dim(&entry.post.id),
        kind
    );
    println!("  {}", output::preview(&entry.post.text, PREVIEW_CHARS));
    println!(
        "  {} likes  {} reposts  {} replies  {} views  {}",
        format_count(entry.counts.likes),
        format_count(entry.counts.retweets),
        format_count(entry.counts.replies),
        format_count(entry.counts.views),
        output::dim(&format!(
            "({} obs, last {})",
            entry.observation_count, captured
        )),
    );
}
