use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod areas;
mod cmd;
mod command;
mod mcp;
mod services;
mod utils;

use cmd::shared::{RuntimeConfig, build_registry, ensure_clean};
use cmd::{CheckArgs, ExecArgs, ListArgs, ServeArgs};

/// azmcp - Azure operations as uniformly shaped commands, served over MCP or run from the CLI.
///
/// Command layout:
///   azmcp serve                                   MCP server on stdio
///   azmcp list  [--area <AREA>] [--json]          registered commands and options
///   azmcp exec  <COMMAND...> [--param K=V ...] [--param-file F] [--json]
///   azmcp check [--json]                          registry self-check
///
/// Global flags / env:
///   -v / -vv              Increase verbosity (RUST_LOG overrides)
///   -q / --quiet          Errors only
///   --fixtures PATH       Fixture document backing every service (or AZMCP_FIXTURES)
///   --timeout-secs N      Per-command deadline, 0 disables (or AZMCP_TIMEOUT_SECS, default 120)
///
/// Examples:
///   azmcp --fixtures demo.yaml serve
///   azmcp --fixtures demo.yaml exec servicebus topic list \
///       --param subscription=sub-1 --param namespace=orders-ns
///   azmcp exec appinsights-app-correlate --param data-sets=requests,exceptions --json
#[derive(Parser, Debug)]
#[command(
    name = "azmcp",
    version,
    author,
    about = "Azure operations as MCP tools with a uniform {status, message, result} envelope",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Fixture document (YAML or JSON) backing every service
    #[arg(long, global = true, value_name = "PATH")]
    fixtures: Option<PathBuf>,

    /// Per-command deadline in seconds (0 disables)
    #[arg(long = "timeout-secs", global = true, value_name = "SECS")]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the MCP server on stdio
    Serve(ServeArgs),

    /// List registered commands
    List(ListArgs),

    /// Execute one command and print its envelope
    Exec(ExecArgs),

    /// Verify every declared command is implemented and its result type registered
    Check(CheckArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    // Flags > env > defaults
    let config = RuntimeConfig::resolve(cli.fixtures, cli.timeout_secs)?;
    let registry = build_registry(&config)?;

    match cli.command {
        Commands::Serve(args) => cmd::execute_serve(registry, args, config.timeout).await,
        Commands::List(args) => cmd::execute_list(&registry, args),
        Commands::Exec(args) => {
            ensure_clean(&registry)?;
            cmd::execute_exec(&registry, args, config.timeout).await
        }
        Commands::Check(args) => cmd::execute_check(&registry, args),
    }
}
