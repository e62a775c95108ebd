//! Command-line interface definitions.
//!
//! All options can be given as flags or environment variables.

use clap::Parser;
use std::path::PathBuf;

/// Scrape news sources and print or save the results as JSON.
///
/// # Examples
///
/// ```sh
/// # Every enabled source in the default configuration
/// news_scrape
///
/// # One source, results saved under ./out/<date>/
/// news_scrape --config sources.yaml --source yonhap --output-dir ./out
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long, env = "NEWS_SCRAPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Scrape only the source with this id
    #[arg(short, long)]
    pub source: Option<String>,

    /// Directory to write result JSON into (prints to stdout when absent)
    #[arg(short, long, env = "NEWS_SCRAPE_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Override the pause before each article fetch, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Override the number of links followed per source
    #[arg(long)]
    pub max_links: Option<usize>,

    /// List configured sources and exit
    #[arg(long)]
    pub list_sources: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["news_scrape"]);
        assert!(cli.source.is_none());
        assert!(cli.output_dir.is_none());
        assert!(!cli.list_sources);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "news_scrape",
            "-c",
            "sources.yaml",
            "-s",
            "yonhap",
            "-o",
            "/tmp/out",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("sources.yaml")));
        assert_eq!(cli.source.as_deref(), Some("yonhap"));
        assert_eq!(cli.output_dir, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["news_scrape", "--delay-ms", "250", "--max-links", "5"]);
        assert_eq!(cli.delay_ms, Some(250));
        assert_eq!(cli.max_links, Some(5));
    }
}
