use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "examscan")]
#[command(about = "Upload scanned exam sheets for evaluation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base URL (overrides EXAMSCAN_API_BASE_URL)
    #[arg(long, global = true, env = "EXAMSCAN_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token for backend calls
    #[arg(long, global = true, env = "EXAMSCAN_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Show timing/latency information
    #[arg(long, global = true)]
    pub timing: bool,

    /// Enable verbose debug output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload answer sheets for one subject and paper code
    Upload {
        /// Subject name, e.g. "Physics"
        #[arg(long, short = 's')]
        subject: String,

        /// Paper code the sheets belong to
        #[arg(long, short = 'p')]
        paper_code: String,

        /// Files to upload (PDF or images)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List previously uploaded files
    History {
        /// Only show files of this paper code id
        #[arg(long)]
        paper_code_id: Option<String>,

        /// Maximum number of records to return
        #[arg(long, short = 'l', default_value = "10")]
        limit: u32,

        /// Offset for pagination
        #[arg(long, short = 'o', default_value = "0")]
        offset: u32,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn upload_requires_at_least_one_file() {
        let result = Cli::try_parse_from(["examscan", "upload", "-s", "Physics", "-p", "PHY-101"]);
        assert!(result.is_err());
    }

    #[test]
    fn history_defaults_to_ten_records() {
        let cli = Cli::try_parse_from(["examscan", "history"]).expect("history should parse");
        match cli.command {
            Commands::History {
                paper_code_id,
                limit,
                offset,
            } => {
                assert!(paper_code_id.is_none());
                assert_eq!(limit, 10);
                assert_eq!(offset, 0);
            }
            _ => panic!("expected history command"),
        }
    }
}
