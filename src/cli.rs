//! Command-line interface definitions.
//!
//! All arguments can be provided via command-line flags, and the commonly
//! scripted ones via environment variables.

use chrono::NaiveDate;
use clap::Parser;

/// Command-line arguments for the digest builder.
///
/// # Examples
///
/// ```sh
/// # Latest broadcast into ./news
/// xwlb_digest -o ./news
///
/// # A specific day, with a JSON copy and a custom config
/// xwlb_digest -o ./news -j ./json -d 2025-12-26 -c ./xwlb.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for the Markdown file
    #[arg(short, long, env = "XWLB_OUTPUT_DIR")]
    pub output_dir: String,

    /// Optional output directory for a JSON copy of the document
    #[arg(short, long, env = "XWLB_JSON_OUTPUT_DIR")]
    pub json_output_dir: Option<String>,

    /// Optional path to a YAML config file
    #[arg(short, long, env = "XWLB_CONFIG")]
    pub config: Option<String>,

    /// Broadcast date to fetch (YYYY-MM-DD); defaults to the latest available
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// Maximum number of segment pages to fetch (overrides the config)
    #[arg(long)]
    pub max_segments: Option<usize>,

    /// Per-request timeout in seconds (overrides the config)
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "xwlb_digest",
            "--output-dir",
            "./news",
            "--json-output-dir",
            "./json",
            "--date",
            "2025-12-26",
            "--max-segments",
            "5",
        ]);

        assert_eq!(cli.output_dir, "./news");
        assert_eq!(cli.json_output_dir.as_deref(), Some("./json"));
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2025, 12, 26));
        assert_eq!(cli.max_segments, Some(5));
        assert_eq!(cli.timeout_secs, None);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["xwlb_digest", "-o", "/tmp/news", "-c", "/tmp/xwlb.yaml", "-d", "2024-02-29"]);

        assert_eq!(cli.output_dir, "/tmp/news");
        assert_eq!(cli.config.as_deref(), Some("/tmp/xwlb.yaml"));
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2024, 2, 29));
    }

    #[test]
    fn test_cli_rejects_bad_date() {
        assert!(Cli::try_parse_from(["xwlb_digest", "-o", "out", "-d", "2025-02-30"]).is_err());
    }
}
