//! Command line argument parsing

use crate::platform::HttpClientConfig;
use clap::Parser;
use std::time::Duration;

/// Rust Video Stream Extractor - resolves playable stream URLs and metadata
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Video URL or bare video id
    pub url: String,

    /// Print the full player config as JSON
    #[arg(long, conflicts_with = "print_url")]
    pub json: bool,

    /// Also fetch subtitles for every available language
    #[arg(long)]
    pub subtitles: bool,

    /// Print the first playable muxed stream URL and exit
    #[arg(short = 'g', long)]
    pub print_url: bool,

    /// Tag printed stream URLs for the embedded Android player
    #[arg(long, requires = "print_url")]
    pub embedded_player: bool,

    /// HTTP timeout (e.g., 30s, 1m)
    #[arg(long, value_name = "DURATION", default_value = "30s")]
    pub timeout: humantime::Duration,

    /// Retries for network failures
    #[arg(long, default_value = "3")]
    pub retries: u32,

    /// Override User-Agent header
    #[arg(long, value_name = "USER_AGENT")]
    pub user_agent: Option<String>,

    /// Proxy URL (http/https/socks)
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (only errors)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Get HTTP timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        self.timeout.into()
    }

    /// Get output verbosity level
    pub fn verbosity_level(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    /// Fetcher configuration from the network flags
    pub fn http_config(&self) -> HttpClientConfig {
        let mut config = HttpClientConfig::default().with_timeout(self.timeout_duration());
        if let Some(user_agent) = &self.user_agent {
            config = config.with_user_agent(user_agent.as_str());
        }
        if let Some(proxy) = &self.proxy {
            config = config.with_proxy(proxy.as_str());
        }
        config
    }
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Quiet (only errors)
    Quiet,
    Normal,
    /// Verbose (debug info)
    Verbose,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("rytex").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_args_default_values() {
        let args = parse(&["dQw4w9WgXcQ"]);
        assert_eq!(args.url, "dQw4w9WgXcQ");
        assert!(!args.json);
        assert!(!args.subtitles);
        assert!(!args.print_url);
        assert_eq!(args.timeout_duration(), Duration::from_secs(30));
        assert_eq!(args.retries, 3);
        assert_eq!(args.verbosity_level(), VerbosityLevel::Normal);
    }

    #[test]
    fn test_args_custom_values() {
        let args = parse(&[
            "https://youtu.be/dQw4w9WgXcQ",
            "-g",
            "--embedded-player",
            "--timeout",
            "1m",
            "--retries",
            "5",
            "--user-agent",
            "Custom Agent",
            "--proxy",
            "socks5://127.0.0.1:1080",
            "-v",
        ]);
        assert!(args.print_url);
        assert!(args.embedded_player);
        assert_eq!(args.timeout_duration(), Duration::from_secs(60));
        assert_eq!(args.retries, 5);
        assert_eq!(args.verbosity_level(), VerbosityLevel::Verbose);

        let config = args.http_config();
        assert_eq!(config.timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.user_agent.as_deref(), Some("Custom Agent"));
        assert_eq!(config.proxy_url.as_deref(), Some("socks5://127.0.0.1:1080"));
    }

    #[test]
    fn test_args_conflicts() {
        assert!(Args::try_parse_from(["rytex", "id", "--json", "-g"]).is_err());
        assert!(Args::try_parse_from(["rytex", "id", "-q", "-v"]).is_err());
        assert!(Args::try_parse_from(["rytex", "id", "--embedded-player"]).is_err());
        assert!(Args::try_parse_from(["rytex"]).is_err());
    }

    #[test]
    fn test_quiet() {
        assert_eq!(parse(&["id", "-q"]).verbosity_level(), VerbosityLevel::Quiet);
    }
}
