use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use replygate::{Cli, Commands, Config, ConfigCommands, gateway};

#[tokio::main]
async fn main() -> Result<()> {
    // Install default crypto provider for Rustls TLS.
    // This prevents the error: "could not automatically determine the process-level CryptoProvider"
    // when both aws-lc-rs and ring features are available (or neither is explicitly selected).
    if let Err(e) = rustls::crypto::ring::default_provider().install_default() {
        eprintln!("Warning: Failed to install default crypto provider: {e:?}");
    }

    // Secrets usually come from .env in development
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();
    let mut config = Config::load_or_init()?;

    match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.gateway.port = port;
            }
            if let Some(host) = host {
                config.gateway.host = host;
            }
            gateway::run_gateway(config).await
        }
        Commands::Config { config_command } => match config_command {
            ConfigCommands::Show => {
                let mut redacted = config.clone();
                if redacted.password.is_some() {
                    redacted.password = Some("<redacted>".into());
                }
                if redacted.api_key.is_some() {
                    redacted.api_key = Some("<redacted>".into());
                }
                println!("{}", toml::to_string_pretty(&redacted)?);
                Ok(())
            }
            ConfigCommands::Path => {
                println!("{}", config.config_path.display());
                Ok(())
            }
        },
    }
}
