//! # Xinwen Lianbo Digest
//!
//! Builds a Markdown text edition of CCTV's daily Xinwen Lianbo broadcast:
//! an outline of the day's segments followed by the cleaned text of each one,
//! with "news brief" roundup pages split into their individual items.
//!
//! ## Usage
//!
//! ```sh
//! xwlb_digest -o ./news
//! xwlb_digest -o ./news -j ./json --date 2025-12-26
//! ```
//!
//! ## Architecture
//!
//! 1. **Indexing**: collect segment links from the programme index
//! 2. **Classification**: separate the full broadcast from its segments
//! 3. **Extraction**: fetch each segment page in order and extract its text
//! 4. **Normalization**: strip bylines, boilerplate and repeated lines
//! 5. **Output**: assemble the Markdown digest and an optional JSON copy

use clap::Parser;
use std::error::Error;
use std::time::Duration as StdDuration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod extract;
mod fetch;
mod links;
mod models;
mod normalize;
mod outputs;
mod scrapers;
mod utils;

use cli::Cli;
use config::ScraperConfig;
use fetch::{HttpFetcher, RetryFetch};
use outputs::json;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("xwlb_digest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration ----
    let mut config = ScraperConfig::load(args.config.as_deref())?;
    if let Some(max_segments) = args.max_segments {
        config.max_segments = max_segments;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.request_timeout_secs = timeout_secs;
    }
    info!(
        max_segments = config.max_segments,
        timeout_secs = config.request_timeout_secs,
        "Configuration ready"
    );

    // Early check: output dirs must be writable before any fetching
    for dir in std::iter::once(&args.output_dir).chain(args.json_output_dir.as_ref()) {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Output directory is not writable");
            return Err(e);
        }
    }

    // ---- Scrape ----
    let fetcher = RetryFetch::new(
        HttpFetcher::new(&config)?,
        config.max_retries,
        StdDuration::from_secs(1),
    );
    let document = match scrapers::xwlb::build_digest(&fetcher, &config, args.date).await {
        Ok(document) => document,
        Err(e) => {
            error!(error = %e, "Digest run failed");
            return Err(e.into());
        }
    };
    info!(
        title = %document.broadcast_title,
        date = ?document.date,
        segments = document.segments.len(),
        "Digest assembled"
    );

    // ---- Output ----
    let markdown_path = outputs::write_markdown(&document, &args.output_dir).await?;
    info!(path = %markdown_path.display(), "Markdown written");

    if let Some(json_dir) = &args.json_output_dir {
        if let Err(e) = json::write_document(&document, json_dir).await {
            error!(error = %e, "Failed to write JSON copy");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
