use anyhow::Result;
use chrono::{DateTime, Utc};
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use serde::Serialize;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Colors only when stdout is a terminal and NO_COLOR is unset
pub fn use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

pub fn dim(text: &str) -> String {
    if use_color() {
        text.bright_black().to_string()
    } else {
        text.to_string()
    }
}

pub fn bold(text: &str) -> String {
    if use_color() {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

pub fn handle(username: &str) -> String {
    let text = format!("@{}", username);
    if use_color() {
        text.cyan().to_string()
    } else {
        text
    }
}

pub fn flag(enabled: bool) -> String {
    match (enabled, use_color()) {
        (true, true) => "enabled".green().to_string(),
        (false, true) => "disabled".red().to_string(),
        (true, false) => "enabled".to_string(),
        (false, false) => "disabled".to_string(),
    }
}

pub fn format_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Single-line preview of post text
pub fn preview(text: &str, max_chars: usize) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    xtap_types::truncate(&normalized, max_chars)
}

/// Thousands-separated count (`48213` → `48,213`)
pub fn format_count(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 { format!("-{}", out) } else { out }
}
