use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

use crate::feed::RepeatReaction;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub feed: FeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// What a repeated same-type reaction does: `keep` or `toggle`.
    #[serde(default)]
    pub repeat_reaction: RepeatReaction,
    /// Header carrying the authenticated user id, set by the upstream
    /// gateway.
    #[serde(default = "default_viewer_header")]
    pub viewer_header: String,
}

fn default_viewer_header() -> String {
    "x-user-id".to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            repeat_reaction: RepeatReaction::Keep,
            viewer_header: default_viewer_header(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite://noticeboard.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("feed.repeat_reaction", "keep")?
            .set_default("feed.viewer_header", default_viewer_header())?

            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // NOTICEBOARD__FEED__REPEAT_REACTION=toggle etc.
            .add_source(Environment::with_prefix("NOTICEBOARD").separator("__"))

            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "sqlite://noticeboard.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            feed: FeedConfig::default(),
        }
    }
}
