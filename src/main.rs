// FHIR REST Client - Command-line client for HL7 FHIR servers
// Copyright (c) 2025 FHIR REST Client Contributors
// Licensed under the MIT License

use fhir_rest_client::cli::commands::{exit_code_for, meta::MetaChange, EXIT_FATAL};
use fhir_rest_client::cli::{Cli, Commands};
use fhir_rest_client::config::{ClientConfig, LoggingConfig};
use fhir_rest_client::domain::Result;
use fhir_rest_client::logging::init_logging;

use clap::Parser;
use std::process;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    // This is optional - if .env doesn't exist, it's silently ignored
    let _ = dotenvy::dotenv();

    // Parse CLI arguments
    let cli = Cli::parse();

    // A missing or invalid configuration only fails commands that talk to a server
    let config = cli.client_config();

    let log_level = cli
        .log_level
        .clone()
        .or_else(|| {
            config
                .as_ref()
                .ok()
                .map(|c| c.application.log_level.clone())
        })
        .unwrap_or_else(|| "info".to_string());
    let logging_config = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_else(|_| LoggingConfig::default());

    let guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(EXIT_FATAL);
        }
    };

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "FHIR REST Client");

    // Execute command and get exit code
    let exit_code = match execute_command(&cli, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            EXIT_FATAL
        }
    };

    // Flush file logs before exiting
    drop(guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, config: Result<ClientConfig>) -> anyhow::Result<i32> {
    let config = match (&cli.command, config) {
        (Commands::ValidateConfig(args), _) => return args.execute(&cli.config).await,
        (Commands::Init(args), _) => return args.execute().await,
        (_, Ok(config)) => config,
        (_, Err(e)) => {
            tracing::error!(error = %e, "Configuration could not be loaded");
            eprintln!("❌ {e}");
            return Ok(exit_code_for(&e));
        }
    };

    match &cli.command {
        Commands::Capabilities(args) => args.execute(&config).await,
        Commands::Read(args) => args.execute(&config).await,
        Commands::Search(args) => args.execute(&config).await,
        Commands::History(args) => args.execute(&config).await,
        Commands::Create(args) => args.execute(&config).await,
        Commands::Update(args) => args.execute(&config).await,
        Commands::Delete(args) => args.execute(&config).await,
        Commands::Meta(args) => args.execute(&config).await,
        Commands::MetaAdd(args) => args.execute(&config, MetaChange::Add).await,
        Commands::MetaDelete(args) => args.execute(&config, MetaChange::Delete).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
