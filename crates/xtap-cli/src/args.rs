use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::{LogLevel, OutputFormat};

#[derive(Parser)]
#[command(name = "xtap")]
#[command(about = "Inspect captured timeline engagement, credentials and assistant call flows", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Data directory (defaults to $XTAP_PATH, then the platform data directory)
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    /// Log level on stderr; RUST_LOG takes precedence when set
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Write the default configuration and create the capture database")]
    Init {
        #[arg(long, help = "Overwrite an existing configuration file")]
        force: bool,
    },

    #[command(about = "Replay captured exchanges (JSON Lines) through the capture pipeline")]
    Ingest {
        #[arg(help = "File with one serialized exchange per line")]
        file: PathBuf,
    },

    #[command(about = "List recently captured posts with their latest engagement")]
    Recent {
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    #[command(about = "Show the engagement history of one post")]
    History {
        #[arg(help = "Platform post id")]
        post_id: String,
    },

    #[command(about = "Posts with the most engagement snapshots")]
    Top {
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    #[command(about = "All captured posts of one author")]
    Author {
        #[arg(help = "Author handle, with or without a leading @")]
        handle: String,
    },

    #[command(about = "Correlate assistant calls into conversation traces and timings")]
    Flows {
        #[arg(long, help = "Only analyze calls captured within this many seconds")]
        window_secs: Option<i64>,
    },

    #[command(about = "Feature flags observed in GraphQL query strings")]
    Flags {
        #[arg(long, help = "Only consider calls captured within this many seconds")]
        window_secs: Option<i64>,
    },

    #[command(about = "Events and trends from the latest explore sidebar capture")]
    Explore,

    #[command(about = "List harvested credentials")]
    Credentials {
        #[arg(long, help = "Print full values instead of a shortened prefix")]
        reveal: bool,
    },

    #[command(about = "Fit likes against post age per author")]
    Trend {
        #[arg(long, default_value = "5", help = "Posts need more snapshots than this")]
        min_observations: usize,

        #[arg(long, default_value = "100", help = "Drop points older than this many hours")]
        max_age: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "xtap",
            "recent",
            "--limit",
            "5",
            "--format",
            "json",
            "--data-dir",
            "/tmp/xtap",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.data_dir.as_deref(), Some("/tmp/xtap"));
        assert!(matches!(cli.command, Commands::Recent { limit: 5 }));
    }
}
