//! Command-line interface for benchmine
//!
//! - Argument parsing (`Cli`, `Commands`)
//! - Runtime setup (`setup`)

pub mod setup;

pub use setup::{configure_thread_pool, init_logging, log_level_for};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "benchmine")]
#[command(
    about = "Select self-contained Python functions as benchmark candidates",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full selection pipeline over method and file metainfo
    Select {
        /// Method metainfo JSON (array of function records)
        #[arg(long = "methods")]
        methods: PathBuf,

        /// File metainfo JSON (array of per-file import tables)
        #[arg(long = "files")]
        files: PathBuf,

        /// Directory receiving the stage files
        #[arg(short, long = "output-dir")]
        output_dir: PathBuf,

        /// Repository whose history restricts candidates to changed functions
        #[arg(long, requires_all = ["since", "until"])]
        repo: Option<PathBuf>,

        /// First day of the commit window (YYYY-MM-DD)
        #[arg(long, requires = "repo")]
        since: Option<String>,

        /// Last day of the commit window (YYYY-MM-DD)
        #[arg(long, requires = "repo")]
        until: Option<String>,

        /// Configuration file (defaults to the nearest .benchmine.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Allowed library roots, replacing the configured set
        #[arg(long = "allowed-libraries", value_delimiter = ',')]
        allowed_libraries: Option<Vec<String>>,

        /// Number of expansion rounds after classification
        #[arg(long = "expansion-depth")]
        expansion_depth: Option<u32>,

        /// Number of parallel jobs (0 = use all cores)
        #[arg(short = 'j', long = "jobs", default_value = "0", env = "BENCHMINE_JOBS")]
        jobs: usize,

        /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
        #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
        verbosity: u8,
    },

    /// Analyze every top-level function of one Python file
    Inspect {
        /// Python source file
        path: PathBuf,

        /// Configuration file (defaults to the nearest .benchmine.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Allowed library roots, replacing the configured set
        #[arg(long = "allowed-libraries", value_delimiter = ',')]
        allowed_libraries: Option<Vec<String>>,

        /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
        #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
        verbosity: u8,
    },

    /// Write a starter .benchmine.toml into the current directory
    Init {
        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },
}

/// Parse CLI arguments using Clap
pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_select() {
        let cli = Cli::try_parse_from([
            "benchmine",
            "select",
            "--methods",
            "m.json",
            "--files",
            "f.json",
            "-o",
            "out",
            "--allowed-libraries",
            "numpy,math",
            "-vv",
        ])
        .unwrap();
        match cli.command {
            Commands::Select {
                allowed_libraries,
                verbosity,
                repo,
                ..
            } => {
                assert_eq!(
                    allowed_libraries,
                    Some(vec!["numpy".to_string(), "math".to_string()])
                );
                assert_eq!(verbosity, 2);
                assert!(repo.is_none());
            }
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn test_window_requires_repo() {
        let result = Cli::try_parse_from([
            "benchmine",
            "select",
            "--methods",
            "m.json",
            "--files",
            "f.json",
            "-o",
            "out",
            "--since",
            "2024-01-01",
        ]);
        assert!(result.is_err());
    }
}
