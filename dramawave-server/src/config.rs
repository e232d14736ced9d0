//! Server configuration
//!
//! Command-line flags (each with a `DRAMAWAVE_*` environment fallback via
//! clap) override `config.toml`, which overrides compiled defaults.

use clap::Parser;
use dramawave_common::config::{
    ChatConfig, CommentsConfig, CompiledDefaults, NotificationsConfig, RecommendationConfig,
    RootFolderResolver, TomlConfig,
};
use std::path::PathBuf;

/// Default broadcast buffer per SSE subscriber
pub const DEFAULT_EVENT_CAPACITY: usize = 1000;

/// DramaWave backend server
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "dramawave-server", version, about)]
pub struct Cli {
    /// HTTP port
    #[arg(long, env = "DRAMAWAVE_PORT")]
    pub port: Option<u16>,

    /// Bind address
    #[arg(long, env = "DRAMAWAVE_HOST")]
    pub host: Option<String>,

    /// Folder holding dramawave.db
    #[arg(long)]
    pub root_folder: Option<PathBuf>,

    /// Path to config.toml
    #[arg(long, env = "DRAMAWAVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter (e.g. "info", "dramawave_server=debug")
    #[arg(long, env = "DRAMAWAVE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Generator endpoint for the daily recommendation
    #[arg(long, env = "DRAMAWAVE_RECOMMENDATION_ENDPOINT")]
    pub recommendation_endpoint: Option<String>,

    /// API key for the recommendation generator
    #[arg(long, env = "DRAMAWAVE_RECOMMENDATION_API_KEY", hide_env_values = true)]
    pub recommendation_api_key: Option<String>,
}

/// Effective settings after resolution
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub root_folder: PathBuf,
    pub log_level: String,
    pub event_capacity: usize,
    pub comments: CommentsConfig,
    pub notifications: NotificationsConfig,
    pub recommendation: RecommendationConfig,
    pub chat: ChatConfig,
    pub bootstrap_admins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::resolve(&Cli::default(), TomlConfig::default())
    }
}

impl ServerConfig {
    /// Merge CLI/env values over the TOML file over compiled defaults
    pub fn resolve(cli: &Cli, toml: TomlConfig) -> Self {
        let defaults = CompiledDefaults::for_current_platform();

        let root_folder = RootFolderResolver::new()
            .with_cli(cli.root_folder.clone())
            .with_toml(toml.root_folder.clone())
            .resolve();

        let mut recommendation = toml.recommendation;
        if let Some(endpoint) = &cli.recommendation_endpoint {
            recommendation.endpoint = Some(endpoint.clone());
        }
        if let Some(key) = &cli.recommendation_api_key {
            recommendation.api_key = Some(key.clone());
        }

        Self {
            host: cli.host.clone().or(toml.host).unwrap_or(defaults.host),
            port: cli.port.or(toml.port).unwrap_or(defaults.port),
            root_folder,
            log_level: cli.log_level.clone().unwrap_or(toml.logging.level),
            event_capacity: toml.event_capacity.unwrap_or(DEFAULT_EVENT_CAPACITY),
            comments: toml.comments,
            notifications: toml.notifications,
            recommendation,
            chat: toml.chat,
            bootstrap_admins: toml.users.bootstrap_admins,
        }
    }

    /// Load the TOML file named by `--config` (or the default locations)
    /// and resolve against the CLI
    pub fn load(cli: &Cli) -> Self {
        let toml = TomlConfig::load(cli.config.as_deref());
        Self::resolve(cli, toml)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
