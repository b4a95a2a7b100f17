//! hbjson CLI - two-way converter between `.json` and `.hbjson` point caches.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use hbjson::convert_file;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Env var holding a tracing filter directive; overrides -v/-q.
const LOG_ENV: &str = "HBJSON_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "hbjson",
    version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("HBJSON_BUILD_DATE"), ")"),
    about = "Convert point caches between JSON (.json) and binary (.hbjson)"
)]
struct Cli {
    /// Input file; the extension selects the direction
    input: PathBuf,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Log errors only
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match convert_file(&cli.input) {
        Ok(conversion) => {
            println!(
                "Converted {} to {}",
                conversion.input.display(),
                conversion.output.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) if e.is_usage() => {
            eprintln!("{}", e);
            eprintln!("Usage: hbjson <file.json | file.hbjson>");
            ExitCode::from(2)
        }
        Err(e) => {
            let err = anyhow::Error::new(e)
                .context(format!("Failed to convert {}", cli.input.display()));
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false));
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_single_path() {
        let cli = Cli::try_parse_from(["hbjson", "-vv", "cache.hbjson"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("cache.hbjson"));
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_cli_rejects_bad_argument_count() {
        assert!(Cli::try_parse_from(["hbjson"]).is_err());
        assert!(Cli::try_parse_from(["hbjson", "a.json", "b.json"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["hbjson", "-q", "-v", "a.json"]).is_err());
    }
}
