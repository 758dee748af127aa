//! `examscan` binary entry point.

use clap::Parser as _;
use examscan_cli::cli::{Cli, Commands};
use examscan_cli::commands::{generate_completions, run_history, run_upload};
use examscan_cli::context::{build_state_ctx, load_config};
use examscan_cli::output::Output;
use examscan_cli::timing;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing with timing support
    timing::init_tracing(cli.verbose, cli.timing);

    if let Err(err) = run(cli).await {
        Output::new().error(format!("{err:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Completions { shell } = cli.command {
        generate_completions(shell);
        return Ok(());
    }

    let config = load_config(cli.api_url)?;
    let ctx = build_state_ctx(config, cli.token);

    match cli.command {
        Commands::Upload {
            subject,
            paper_code,
            files,
        } => run_upload(ctx, subject, paper_code, files).await,
        Commands::History {
            paper_code_id,
            limit,
            offset,
        } => run_history(ctx, paper_code_id, limit, offset).await,
        Commands::Completions { .. } => Ok(()),
    }
}
