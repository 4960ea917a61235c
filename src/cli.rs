// ABOUTME: Command-line interface definitions using clap
// ABOUTME: Defines export/download/convert subcommands and global flags

use crate::api::DEFAULT_API_BASE;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "notion2md")]
#[command(about = "Export Notion pages to JSON snapshots and Markdown", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Notion integration token (overrides env/config)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// API base URL
    #[arg(long, global = true, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Directory for JSON snapshots
    #[arg(long, global = true, default_value = "./json")]
    pub json_dir: PathBuf,

    /// Directory for Markdown output
    #[arg(long, global = true, default_value = "./md")]
    pub md_dir: PathBuf,

    /// File extension for Markdown output
    #[arg(long, global = true, default_value = "md")]
    pub extension: String,

    /// Characters to strip from frontmatter values
    #[arg(long, global = true)]
    pub strip_meta_chars: Option<String>,

    /// Disable throttling (not recommended)
    #[arg(long, global = true)]
    pub no_throttle: bool,

    /// Throttle range in ms (min:max)
    #[arg(long, global = true, value_parser = parse_throttle_range)]
    pub throttle_ms: Option<(u64, u64)>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

fn parse_throttle_range(s: &str) -> Result<(u64, u64), String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err("Expected format: min:max".into());
    }

    let min = parts[0].parse().map_err(|_| "Invalid min value")?;
    let max = parts[1].parse().map_err(|_| "Invalid max value")?;

    if min > max {
        return Err("min must be <= max".into());
    }

    Ok((min, max))
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Download a page and convert the snapshot directory to Markdown
    Export {
        /// Page URL or id
        locator: String,

        /// Skip the download when the page has not been edited since the last run
        #[arg(long)]
        skip_unchanged: bool,
    },

    /// Download a page into JSON snapshots only
    Download {
        /// Page URL or id
        locator: String,

        /// Do not fetch page metadata into database.json
        #[arg(long)]
        no_metadata: bool,

        /// Skip the download when the page has not been edited since the last run
        #[arg(long, conflicts_with = "no_metadata")]
        skip_unchanged: bool,
    },

    /// Convert existing JSON snapshots to Markdown
    Convert,
}
