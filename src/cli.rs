// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two ways to run:
//   csp-harvest -u https://example.com            (one site)
//   csp-harvest -f urls.txt -c 10 -r 0.2 -o out   (a list of sites)
//
// Rust concepts:
// - Derive macros: #[derive(Parser)] generates all the parsing code
// - Option<T>: Flags that may be missing (-f, -u, -o)
// - Custom value parsers: plain functions returning Result<T, String>
// =============================================================================

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

use crate::scan::{ScanConfig, DEFAULT_DELAY, DEFAULT_WORKERS};

#[derive(Parser, Debug)]
#[command(
    name = "csp-harvest",
    version,
    about = "Collects the domains listed in websites' Content-Security-Policy headers",
    long_about = "csp-harvest fetches each target URL, reads its Content-Security-Policy header \
                  and prints every domain the policy mentions. Each domain is printed once per run, \
                  however many sites reference it."
)]
pub struct Cli {
    /// File with one URL per line (blank lines and # comments are skipped)
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Scan a single URL instead of a file
    #[arg(short = 'u', long = "url", value_name = "URL")]
    pub url: Option<String>,

    /// Also write found domains to this file (overwritten if it exists)
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Number of concurrent workers
    #[arg(
        short = 'c',
        long = "concurrency",
        default_value_t = DEFAULT_WORKERS,
        value_parser = parse_concurrency
    )]
    pub concurrency: usize,

    /// Seconds each worker waits between requests (e.g. 0.5)
    #[arg(
        short = 'r',
        long = "rate",
        value_name = "SECONDS",
        default_value_t = DEFAULT_DELAY.as_secs_f64(),
        value_parser = parse_rate
    )]
    pub rate: f64,

    /// Print "example.com" instead of "*.example.com"
    ///
    /// `--clean` alone means true; `--clean=false` is also accepted.
    #[arg(
        long = "clean",
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub clean: bool,

    /// More log output on stderr (-v = info, -vv = debug, -vvv = trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

/// What to scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl Cli {
    /// Picks the input. A single URL wins when both -u and -f are given.
    ///
    /// Returns None when neither was given.
    pub fn source(&self) -> Option<Source> {
        if let Some(url) = &self.url {
            return Some(Source::Url(url.clone()));
        }
        self.file.clone().map(Source::File)
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            workers: self.concurrency,
            queue_capacity: self.concurrency,
            delay: Duration::from_secs_f64(self.rate),
            strip_wildcard: self.clean,
            ..ScanConfig::default()
        }
    }
}

fn parse_concurrency(value: &str) -> Result<usize, String> {
    let workers: usize = value
        .parse()
        .map_err(|_| format!("'{}' is not a whole number", value))?;
    if workers == 0 {
        return Err("need at least one worker".to_string());
    }
    Ok(workers)
}

fn parse_rate(value: &str) -> Result<f64, String> {
    let seconds: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    // Duration::from_secs_f64 panics on negative, NaN or huge values
    if !seconds.is_finite() || seconds < 0.0 || Duration::try_from_secs_f64(seconds).is_err() {
        return Err("must be zero or more seconds".to_string());
    }
    Ok(seconds)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. How does `--clean` work with or without a value?
//    - num_args = 0..=1 lets the flag take zero or one value
//    - default_missing_value = "true" is used when it takes zero
//    - default_value_t = false is used when the flag isn't given at all
//
// 2. What is ArgAction::Count?
//    - Each -v adds one, so -vvv gives verbose = 3
//
// 3. Why are parse_concurrency and parse_rate plain functions?
//    - clap accepts any fn(&str) -> Result<T, E> as a value parser
//    - The Err string is shown to the user next to the flag name
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["csp-harvest"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["-f", "urls.txt"]);
        assert_eq!(cli.concurrency, 5);
        assert_eq!(cli.rate, 0.5);
        assert!(!cli.clean);
        assert_eq!(cli.output, None);
        assert_eq!(cli.source(), Some(Source::File(PathBuf::from("urls.txt"))));

        let config = cli.scan_config();
        assert_eq!(config.workers, 5);
        assert_eq!(config.queue_capacity, 5);
        assert_eq!(config.delay, Duration::from_millis(500));
        assert!(!config.strip_wildcard);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.client_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_all_flags() {
        let cli = parse(&[
            "-u", "https://example.com", "-o", "out.txt", "-c", "12", "-r", "0", "--clean",
        ]);
        assert_eq!(cli.source(), Some(Source::Url("https://example.com".to_string())));
        assert_eq!(cli.output, Some(PathBuf::from("out.txt")));

        let config = cli.scan_config();
        assert_eq!(config.workers, 12);
        assert_eq!(config.delay, Duration::ZERO);
        assert!(config.strip_wildcard);
    }

    #[test]
    fn test_clean_takes_optional_value() {
        assert!(!parse(&["-u", "x", "--clean=false"]).clean);
        assert!(parse(&["-u", "x", "--clean=true"]).clean);
    }

    #[test]
    fn test_url_wins_over_file() {
        let cli = parse(&["-f", "urls.txt", "-u", "https://a.test"]);
        assert_eq!(cli.source(), Some(Source::Url("https://a.test".to_string())));
    }

    #[test]
    fn test_no_source() {
        assert_eq!(parse(&[]).source(), None);
    }

    #[test]
    fn test_rejects_bad_numbers() {
        assert!(Cli::try_parse_from(["csp-harvest", "-c", "0"]).is_err());
        assert!(Cli::try_parse_from(["csp-harvest", "-c", "many"]).is_err());
        assert!(Cli::try_parse_from(["csp-harvest", "-r", "-1"]).is_err());
        assert!(Cli::try_parse_from(["csp-harvest", "-r", "NaN"]).is_err());
    }

    #[test]
    fn test_verbosity_counts() {
        assert_eq!(parse(&["-vv"]).verbose, 2);
    }
}
