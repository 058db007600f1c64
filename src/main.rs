use clap::Parser;
use jakas::cli::{Cli, Commands};
use jakas::types::config::Config;
use jakas::JakasResult;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> JakasResult<()> {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let config = Config::load_or_default(&cli.config);

    // CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("jakas={}", log_level)
            .parse()
            .unwrap_or_else(|_| "jakas=info".parse().expect("fallback directive is valid")),
    );

    if config.general.log_format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    tracing::debug!("Configuration loaded from: {}", cli.config.display());

    match cli.command {
        Commands::Init { path } => {
            jakas::cli::commands::init(path).await?;
        }
        Commands::Config => {
            jakas::cli::commands::config_cmd(&cli.config).await?;
        }
        Commands::Import { input } => {
            jakas::cli::commands::import(&input, &config).await?;
        }
        Commands::Score { id, json } => {
            jakas::cli::commands::score(&id, json, &config).await?;
        }
        Commands::Show { id } => {
            jakas::cli::commands::show(id.as_deref(), &config).await?;
        }
        Commands::Doctor => {
            jakas::cli::commands::doctor(&cli.config, &config).await?;
        }
        Commands::Version => {
            jakas::cli::commands::version();
        }
    }

    Ok(())
}
