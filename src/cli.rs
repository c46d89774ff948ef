use clap::{Parser, Subcommand};

/// `replygate` - Password-gated smart-reply chat for your brand.
#[derive(Parser, Debug)]
#[command(name = "replygate")]
#[command(version = "0.1.0")]
#[command(about = "Password-gated Gemini reply generator.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the gateway server
    Serve {
        /// Port to listen on (use 0 for a random available port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        config_command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration (secrets redacted)
    Show,
    /// Print the config file path
    Path,
}
