use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tv_cli::commands::{heatmap, import};
use tv_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // Logs go to stderr so JSON on stdout stays parseable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    match command {
        Commands::Import {
            files,
            filter,
            json,
        } => import::run(files, filter, *json, &config)?,
        Commands::Heatmap {
            files,
            year,
            filter,
        } => heatmap::run(files, *year, filter, &config)?,
    }

    Ok(())
}
