// ABOUTME: Entry point for termgate — a JSON-RPC gateway that governs shell commands.
// ABOUTME: Parses CLI args, loads config, and serves frames on stdin/stdout.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use termgate::approval::RiskAnalyzer;
use termgate::config::Config;
use termgate::gateway::Gateway;
use termgate::logging;

#[derive(Debug, Parser)]
#[command(name = "termgate", version, about = "Approval gateway for shell commands")]
struct Cli {
    /// Config file (defaults to ~/.termgate/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "termgate=trace". RUST_LOG wins over this.
    #[arg(long, global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve JSON-RPC frames on stdin/stdout (the default).
    Serve,
    /// Print the risk assessment of a command without running it.
    Assess {
        /// Command text to assess.
        command: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let filter = cli
        .log_filter
        .clone()
        .unwrap_or_else(|| config.logging.filter.clone());
    logging::init(&filter);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let gateway = Gateway::from_config(&config)?;
            tracing::info!(
                shell = %config.shell.program,
                extra_rules = config.risk.rules.len(),
                "termgate serving on stdio"
            );
            gateway.serve(tokio::io::stdin(), tokio::io::stdout()).await?;
            tracing::info!("input closed, shutting down");
        }
        Commands::Assess { command } => {
            let assessment = config.analyzer()?.assess(command.trim());
            println!("{}", serde_json::to_string(&assessment)?);
        }
    }
    Ok(())
}
