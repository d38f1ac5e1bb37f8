pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Filter captured errors with configurable rule trees and query error logs
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file holding the error filter and default query
    #[arg(short, long, global = true, env = "ERROR_SIEVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'F', long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// When to colorize output
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write results to this file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the configured error filter over captured error events
    Check {
        /// JSON file with one captured event or an array of them
        event: PathBuf,
    },
    /// List logged errors matching the given predicates
    Query {
        /// JSON file with an array of logged errors
        file: PathBuf,

        /// Predicate such as "status-code = 404"; repeatable, all must hold
        #[arg(short = 'w', long = "where")]
        predicates: Vec<String>,

        /// Free-text search over every text property
        #[arg(short, long)]
        search: Option<String>,
    },
    /// List the rule builders available to filter configurations
    Rules,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl Cli {
    /// The tracing filter directive implied by `--quiet` and `-v`.
    pub fn log_directive(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_query_collects_repeated_predicates() {
        let cli = Cli::try_parse_from([
            "error-sieve",
            "query",
            "errors.json",
            "--where",
            "status-code = 404",
            "-w",
            "type ~ Http",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Query {
                predicates, search, ..
            } => {
                assert_eq!(predicates, vec!["status-code = 404", "type ~ Http"]);
                assert!(search.is_none());
            }
            _ => panic!("expected query command"),
        }
    }

    #[test]
    fn test_verbosity_maps_to_directive() {
        let cli = Cli::try_parse_from(["error-sieve", "-vv", "rules"]).unwrap();
        assert_eq!(cli.log_directive(), "trace");
        let cli = Cli::try_parse_from(["error-sieve", "--quiet", "rules"]).unwrap();
        assert_eq!(cli.log_directive(), "error");
        let cli = Cli::try_parse_from(["error-sieve", "rules"]).unwrap();
        assert_eq!(cli.log_directive(), "warn");
    }
}
