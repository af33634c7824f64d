//! CLI argument parsing for wr

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "wr")]
#[command(author, version, about = "Run directive scripts over JSON rows", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a directive script over a JSON array of rows
    Run {
        /// Directive script file
        #[arg(short, long, required = true)]
        script: PathBuf,

        /// Input rows (JSON array of objects); reads stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output schema (YAML or JSON); rows are emitted unreconciled when absent
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Print execution counters to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Parse and initialize a script without processing rows
    Check {
        /// Directive script file
        #[arg(required = true)]
        script: PathBuf,
    },

    /// List available directives
    List,

    /// Show the argument grammar of a directive
    Usage {
        /// Directive name
        #[arg(required = true)]
        directive: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::parse_from(["wr", "run", "-s", "script.wr", "--schema", "out.yml", "--stats"]);
        match cli.command {
            Command::Run {
                script,
                input,
                schema,
                stats,
            } => {
                assert_eq!(script, PathBuf::from("script.wr"));
                assert!(input.is_none());
                assert_eq!(schema, Some(PathBuf::from("out.yml")));
                assert!(stats);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_usage_requires_directive() {
        assert!(Cli::try_parse_from(["wr", "usage"]).is_err());
    }
}
