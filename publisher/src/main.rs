use clap::{CommandFactory, Parser};
use publisher::{commands, telemetry, Args, CatalogueClient, ClientConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Nothing to run and nothing to validate: print usage before touching the config file
    if args.needs_help() {
        Args::command().print_help()?;
        std::process::exit(2);
    }

    // Load configuration
    let config = ClientConfig::load(&args)?;

    // With --validate, exit successfully after config validation
    let command = match args.command {
        Some(command) if !args.validate => command,
        _ => {
            println!("Configuration is valid.");
            return Ok(());
        }
    };

    telemetry::init_telemetry()?;
    tracing::debug!(config = ?config, "Loaded configuration");

    let client = CatalogueClient::new(config)?;
    let request_id = commands::run(&client, command).await?;
    println!("{request_id}");

    Ok(())
}
