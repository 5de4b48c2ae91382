mod config;
mod db;
mod error;
mod fetcher;
mod meeting;
mod parser;
mod pdf;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use chrono::Datelike;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use config::{AgencyConfig, MalformedMatch, SourceUrls};
use error::ScrapeError;
use meeting::Meeting;

#[derive(Parser)]
#[command(name = "ifa_scraper", about = "Illinois Finance Authority board meeting scraper")]
struct Cli {
    /// Skip malformed date/time matches instead of stopping at the first one
    #[arg(long, global = true)]
    skip_malformed: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the start URLs and extract meetings
    Run {
        /// Calendar year the URLs are built from (default: current year)
        #[arg(short, long)]
        year: Option<i32>,
        /// Print meetings as JSON instead of saving them
        #[arg(long)]
        dry_run: bool,
    },
    /// Extract meetings from local schedule PDFs
    Parse {
        files: Vec<PathBuf>,
        /// Source URL recorded on each meeting (default: the file path)
        #[arg(short, long)]
        source: Option<String>,
    },
    /// Print the start URLs for a year
    Urls {
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// List stored meetings
    List {
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Show stored meeting statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let config = AgencyConfig {
        malformed: if cli.skip_malformed {
            MalformedMatch::Skip
        } else {
            MalformedMatch::Stop
        },
        ..AgencyConfig::default()
    };

    let result = match cli.command {
        Commands::Run { year, dry_run } => {
            let urls = SourceUrls::for_year(year.unwrap_or_else(current_year));
            info!("Scraping {} ({}, {})", config.agency, config.name, config.timezone);
            let docs = fetcher::fetch_all(urls.all()).await?;

            let mut meetings = Vec::new();
            for doc in docs {
                let Some(body) = doc.body else { continue };
                let Some(kind) = urls.classify(&doc.url) else {
                    warn!("Response from unknown URL {}", doc.url);
                    continue;
                };
                match parser::parse_document(&config, kind, &body, &doc.url) {
                    Ok(found) => {
                        info!(
                            "{} meetings in {} (fetched in {} ms)",
                            found.len(),
                            doc.url,
                            doc.latency_ms.unwrap_or_default()
                        );
                        meetings.extend(found);
                    }
                    Err(ScrapeError::Unsupported(kind)) => {
                        warn!("Skipping {}: no handler for {} yet", doc.url, kind);
                    }
                    Err(e) => warn!("Failed to parse {}: {}", doc.url, e),
                }
            }

            if dry_run {
                print_json(&meetings)
            } else {
                let conn = db::connect()?;
                db::init_schema(&conn)?;
                let inserted = db::save_meetings(&conn, &meetings)?;
                println!(
                    "Saved {} new meetings ({} extracted).",
                    inserted,
                    meetings.len()
                );
                Ok(())
            }
        }
        Commands::Parse { files, source } => {
            if files.is_empty() {
                println!("No files given.");
                return Ok(());
            }
            let meetings = parse_files(&config, &files, source.as_deref())?;
            print_json(&meetings)
        }
        Commands::Urls { year } => {
            for url in SourceUrls::for_year(year.unwrap_or_else(current_year)).all() {
                println!("{}", url);
            }
            Ok(())
        }
        Commands::List { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_meetings(&conn, limit)?;
            if rows.is_empty() {
                println!("No meetings stored. Run 'run' first.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<19} | {:<14} | {:<6} | {:<28} | Source",
                "#", "Start", "Title", "Class", "Location"
            );
            println!("{}", "-".repeat(100));
            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<19} | {:<14} | {:<6} | {:<28} | {}",
                    i + 1,
                    r.start.format("%Y-%m-%d %H:%M"),
                    truncate(&r.title, 14),
                    r.classification,
                    truncate(&r.location_name, 28),
                    r.source
                );
            }
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Meetings: {}", s.total);
            println!("Upcoming: {}", s.upcoming);
            println!("Sources:  {}", s.sources);
            println!("First:    {}", s.first.as_deref().unwrap_or("-"));
            println!("Last:     {}", s.last.as_deref().unwrap_or("-"));
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        info!("Done in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

/// Read and scan local PDFs in parallel, keeping input order.
fn parse_files(
    config: &AgencyConfig,
    files: &[PathBuf],
    source: Option<&str>,
) -> anyhow::Result<Vec<Meeting>> {
    use rayon::prelude::*;

    let results: Vec<anyhow::Result<Vec<Meeting>>> = files
        .par_iter()
        .map(|path| {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let url = source
                .map(str::to_string)
                .unwrap_or_else(|| path.display().to_string());
            parser::parse_future_board_meetings(config, &bytes, &url)
                .with_context(|| format!("Failed to parse {}", path.display()))
        })
        .collect();

    let mut meetings = Vec::new();
    for r in results {
        meetings.extend(r?);
    }
    Ok(meetings)
}

fn print_json(meetings: &[Meeting]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(meetings)?);
    Ok(())
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
