use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use rts_graph::cli::{Cli, Commands, run_graph, run_select};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays clean for piping.
    let filter = match cli.verbose {
        0 => EnvFilter::new("rts_graph=warn"),
        1 => EnvFilter::new("rts_graph=info"),
        2 => EnvFilter::new("rts_graph=debug"),
        _ => EnvFilter::new("rts_graph=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_max_level(Level::TRACE)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Graph(args) => run_graph(args),
        Commands::Select { run, no_overwrite } => run_select(run, *no_overwrite),
    }
}
