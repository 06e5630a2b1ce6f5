//! Command-line interface for tunepull.
//!
//! Provides commands for pulling a single URL, running a batch of
//! URLs from a file, and listing the download history.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::adapters::YtDlpAcquirer;
use crate::config::RunConfig;
use crate::core::{read_urls, BatchRunner, CanonicalStore, HistoryStore, PathResolver, Pipeline};
use crate::domain::RunSummary;

/// tunepull - audio library organizer and download history manager
#[derive(Parser, Debug)]
#[command(name = "tunepull")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download a single URL (item or collection)
    Pull {
        /// Source URL
        url: String,

        /// Root folder for downloads
        #[arg(long)]
        output_dir: PathBuf,

        /// JSON history file tracking downloaded items
        #[arg(long)]
        history_file: PathBuf,

        /// Store everything directly under the root, no subfolders
        #[arg(long)]
        flat: bool,
    },

    /// Download every URL listed in a file
    Batch {
        /// File with one URL per line ('#' comments and blanks ignored)
        #[arg(long)]
        urls_file: PathBuf,

        /// YAML config supplying output root, history file, and layout
        #[arg(long)]
        config: PathBuf,

        /// Override the configured layout with flat
        #[arg(long)]
        flat: bool,
    },

    /// List the download history
    History {
        /// JSON history file to inspect
        #[arg(long)]
        history_file: PathBuf,
    },
}

impl Cli {
    /// Execute the CLI command, returning the process exit code
    pub async fn execute(self) -> Result<i32> {
        match self.command {
            Commands::Pull {
                url,
                output_dir,
                history_file,
                flat,
            } => {
                let config = RunConfig::new(output_dir, history_file).with_flat_layout(flat);
                run_urls(&config, &[url]).await
            }
            Commands::Batch {
                urls_file,
                config,
                flat,
            } => {
                let config = RunConfig::from_file(&config)?.with_flat_layout(flat);
                let urls = read_urls(&urls_file)?;
                if urls.is_empty() {
                    println!("No URLs found in file");
                    return Ok(0);
                }
                run_urls(&config, &urls).await
            }
            Commands::History { history_file } => {
                show_history(&history_file).await?;
                Ok(0)
            }
        }
    }
}

/// Run the batch pipeline over a list of URLs
async fn run_urls(config: &RunConfig, urls: &[String]) -> Result<i32> {
    // Corrupt history aborts here, before any work is attempted
    let mut history = HistoryStore::open(&config.history_file).await?;

    let resolver =
        PathResolver::new(config.layout).with_max_segment_len(config.max_segment_len);
    let store = CanonicalStore::open(&config.output_dir, config.collections_dir.clone()).await?;
    let pipeline = Pipeline::new(resolver, store);

    let acquirer = YtDlpAcquirer::new();
    let runner = BatchRunner::new(&pipeline, &acquirer);
    let summary = runner.run(&mut history, urls).await;

    print_summary(&summary, history.len());
    Ok(summary.exit_code())
}

fn print_summary(summary: &RunSummary, library_total: usize) {
    println!();
    println!("Recorded: {}", summary.recorded);
    println!("Skipped:  {}", summary.skipped);
    println!("Failed:   {}", summary.failed());
    println!("Total items in library: {}", library_total);

    if !summary.failures.is_empty() {
        println!("\nFailures:");
        for (subject, error) in &summary.failures {
            println!("  {}: {}", subject, error);
        }
    }
}

/// Print the recorded history, most recent last
async fn show_history(history_file: &PathBuf) -> Result<()> {
    let history = HistoryStore::open(history_file).await?;

    if history.is_empty() {
        println!("No items downloaded yet.");
        return Ok(());
    }

    println!("{:<16} {:<24} {:<50}", "ITEM ID", "RECORDED", "PATH");
    println!("{}", "-".repeat(92));

    for record in history.records() {
        println!(
            "{:<16} {:<24} {:<50}",
            record.item_id,
            record.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            record.canonical_path.display()
        );
    }

    println!("\nTotal: {} items", history.len());
    Ok(())
}
