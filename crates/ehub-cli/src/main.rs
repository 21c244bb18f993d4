use anyhow::Result;
use clap::Parser;
use ehub_cli::{Cli, Commands};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("ehub {}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Validate { model } => commands::validate::handle(model),
        Commands::Build {
            model,
            json,
            no_relax,
        } => commands::build::handle(model, json.as_deref(), *no_relax),
        Commands::Solve {
            model,
            technology,
            carrier,
            demand,
            json,
        } => commands::solve::handle(model, technology, carrier, *demand, json.as_deref()),
    }
}
