use clap::Parser;
use tracing::info;
use wooverzicht::cli;
use wooverzicht::cli::Cli;
use wooverzicht::cli::Commands;
use wooverzicht::config::AppConfig;
use wooverzicht::logging;
use wooverzicht::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging; the guard keeps the file writer flushing until exit
    let _guard = if cli.verbose {
        logging::init_simple_logging("debug")?;
        None
    } else {
        logging::init_logging_with_config(&config.logging)?
    };
    info!("Configuration loaded successfully");

    match cli.command {
        Commands::Serve {
            host,
            port,
            no_cors,
        } => cli::handle_serve_api(&config, host, port, no_cors).await,
        Commands::Ask {
            question,
            session,
            filters,
        } => cli::handle_ask(&config, question, session, filters).await,
        Commands::Documents {
            query,
            filters,
            json,
        } => cli::handle_documents(&config, query, filters, json).await,
        Commands::CheckConfig { offline } => cli::handle_check_config(&config, offline).await,
    }
}
