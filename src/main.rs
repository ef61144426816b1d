//! Yunmeng CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use yunmeng::cli::{Cli, Commands};
use yunmeng::domain::models::Config;
use yunmeng::infrastructure::config::ConfigLoader;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    let command = cli
        .command
        .unwrap_or(Commands::Serve(yunmeng::cli::commands::serve::ServeArgs::default()));

    let result = match command {
        Commands::Serve(args) => yunmeng::cli::commands::serve::execute(args, config).await,
        Commands::Simulate(args) => yunmeng::cli::commands::simulate::execute(args, config).await,
    };

    if let Err(err) = result {
        yunmeng::cli::handle_error(err);
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
