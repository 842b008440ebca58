//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Static UI component catalog with snapshot diffing
#[derive(Parser, Debug)]
#[command(name = "component-catalog")]
#[command(about = "Extracts UI components into versioned snapshots and diffs them")]
#[command(version)]
#[command(author)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a snapshot of every component under a directory
    Snapshot {
        /// Project root to scan
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Catalog config file (JSON or JSON5); looked up in DIR when omitted
        #[arg(short, long, value_name = "FILE", env = "COMPONENT_CATALOG_CONFIG")]
        config: Option<PathBuf>,

        /// Write the snapshot here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Worker threads (defaults to the config value, then the CPU count)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Print the build report to stderr as JSON
        #[arg(long)]
        report: bool,
    },

    /// Diff two snapshot files
    Diff {
        #[arg(value_name = "BASE")]
        base: PathBuf,

        #[arg(value_name = "CURRENT")]
        current: PathBuf,

        /// Print only the summary
        #[arg(long)]
        summary: bool,
    },

    /// Analyze a single file and print its descriptor
    Inspect {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print the parsed AST to stderr (for debugging)
        #[arg(long)]
        print_ast: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default log filter when RUST_LOG is unset
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "component_catalog=debug"
        } else {
            "warn"
        }
    }
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
    fn test_parse_snapshot() {
        let cli = Cli::try_parse_from([
            "component-catalog",
            "snapshot",
            "./app",
            "--out",
            "snap.json",
            "-w",
            "4",
        ])
        .unwrap();
        assert_eq!(cli.log_filter(), "warn");
        match cli.command {
            Command::Snapshot {
                dir,
                out,
                workers,
                report,
                ..
            } => {
                assert_eq!(dir, PathBuf::from("./app"));
                assert_eq!(out, Some(PathBuf::from("snap.json")));
                assert_eq!(workers, Some(4));
                assert!(!report);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_diff_with_global_verbose() {
        let cli =
            Cli::try_parse_from(["component-catalog", "diff", "a.json", "b.json", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Diff { summary: false, .. }));
    }
}
