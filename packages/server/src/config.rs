//! Server configuration: CLI arguments with environment variable fallbacks.

use std::time::Duration;

use clap::Parser;

use crate::{
    domain::{ChannelName, ValueObjectError},
    usecase::RouterConfig,
};

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "irori-server")]
#[command(about = "Real-time messaging router for Irori group chat", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "IRORI_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "IRORI_PORT", default_value_t = 8080)]
    pub port: u16,

    /// HS256 secret used to verify access tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// How long a typing indicator stays up without activity
    #[arg(long, env = "IRORI_TYPING_TIMEOUT_MS", default_value_t = 2000)]
    pub typing_timeout_ms: u64,

    /// Channels created at startup (repeatable, or comma separated)
    #[arg(
        long = "channel",
        env = "IRORI_CHANNELS",
        value_delimiter = ',',
        default_values = ["general", "random"]
    )]
    pub channels: Vec<String>,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "IRORI_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl ServerConfig {
    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            typing_timeout: Duration::from_millis(self.typing_timeout_ms),
        }
    }

    /// Channel names to seed, validated
    pub fn seed_channels(&self) -> Result<Vec<ChannelName>, ValueObjectError> {
        self.channels
            .iter()
            .map(|name| ChannelName::new(name.clone()))
            .collect()
    }
}
