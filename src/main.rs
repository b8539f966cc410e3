mod config;
mod export;
mod fetch;
mod parser;
mod records;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use records::HighlightRecord;

#[derive(Parser)]
#[command(name = "snap_stories", about = "Snapchat public story highlight scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch story pages for every username and export the parsed highlights
    Run {
        /// Text file with one username per line
        #[arg(long, default_value = "data/usernames.sample.txt")]
        usernames_file: PathBuf,
        /// JSON output file
        #[arg(long, default_value = "data/sample_output.json")]
        output_file: PathBuf,
        /// JSON settings file
        #[arg(long, default_value = "config/settings.example.json")]
        settings: PathBuf,
        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Parse a saved story page without touching the network
    Parse {
        /// Saved HTML page
        #[arg(long)]
        html_file: PathBuf,
        /// Username to attach to every record
        #[arg(short, long)]
        username: String,
        /// JSON output file (default: stdout)
        #[arg(long)]
        output_file: Option<PathBuf>,
        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
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

    let result = match cli.command {
        Commands::Run {
            usernames_file,
            output_file,
            settings,
            pretty,
        } => run(&usernames_file, &output_file, &settings, pretty).await,
        Commands::Parse {
            html_file,
            username,
            output_file,
            pretty,
        } => {
            let html = std::fs::read_to_string(&html_file)
                .with_context(|| format!("Failed to read {}", html_file.display()))?;
            let records = parser::parse_from_html(&html, &username);
            info!("Parsed {} story highlight(s) for '{}'.", records.len(), username);
            match output_file {
                Some(path) => export::export_to_json(&records, &path, pretty),
                None => {
                    let json = if pretty {
                        serde_json::to_string_pretty(&records)?
                    } else {
                        serde_json::to_string(&records)?
                    };
                    println!("{}", json);
                    Ok(())
                }
            }
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run(
    usernames_file: &Path,
    output_file: &Path,
    settings_file: &Path,
    pretty: bool,
) -> anyhow::Result<()> {
    let settings = config::load_settings(settings_file)?;
    let usernames = config::load_usernames(usernames_file)?;

    info!(
        "Starting Snapchat User Stories Scraper for {} usernames ...",
        usernames.len()
    );
    let pages = fetch::fetch_story_pages(&settings, &usernames).await?;
    let results = parse_pages(&pages)?;

    if results.is_empty() {
        warn!(
            "No stories were parsed. Verify that the usernames are public and the Snapchat page format is supported."
        );
    }

    export::export_to_json(&results, output_file, pretty)?;
    info!(
        "Finished. Wrote {} story highlight(s) to {}.",
        results.len(),
        output_file.display()
    );
    Ok(())
}

/// Parse fetched pages in parallel; output keeps username order.
fn parse_pages(pages: &[fetch::FetchedPage]) -> anyhow::Result<Vec<HighlightRecord>> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut all = Vec::new();
    for chunk in pages.chunks(64) {
        let parsed: Vec<Vec<HighlightRecord>> = chunk
            .par_iter()
            .map(|page| parser::parse_from_html(&page.html, &page.username))
            .collect();

        for (page, records) in chunk.iter().zip(parsed) {
            info!(
                "Parsed {} story highlight(s) for '{}'.",
                records.len(),
                page.username
            );
            all.extend(records);
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(all)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn parse_pages_keeps_username_order() {
        let page = |user: &str, id: &str| fetch::FetchedPage {
            username: user.to_string(),
            html: format!(
                r#"<script>__INITIAL_STATE__ = {{"snapList":[],"highlightId":"{}"}};</script>"#,
                id
            ),
        };
        let pages = vec![page("zed", "z1"), page("amy", "a1"), page("amy", "a1")];
        let out = parse_pages(&pages).unwrap();
        let keys: Vec<String> = out.iter().map(|r| r.dedup_key()).collect();
        // Dedup is per page, so the same highlight on two fetched pages survives twice.
        assert_eq!(keys, vec!["z1-zed", "a1-amy", "a1-amy"]);
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }
}
