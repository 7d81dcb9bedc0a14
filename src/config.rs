//! Configuration management for the highlighter server

use serde::Deserialize;
use std::env;

use crate::highlight::color::{default_color, palette_color, palette_index};
use crate::store::HIGHLIGHTS_KEY;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub highlight: HighlightConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HighlightConfig {
    /// Key the record list is stored under
    pub storage_key: String,
    /// Colour used when neither the record nor the user preference has one
    pub default_color: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("HIGHLIGHT_DEFAULT_COLOR is not a palette colour: {0}")]
    UnknownColor(String),

    #[error("HIGHLIGHT_STORAGE_KEY must not be empty")]
    EmptyStorageKey,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "sqlite:./highlighter.db".to_string(),
            },
            highlight: HighlightConfig {
                storage_key: HIGHLIGHTS_KEY.to_string(),
                default_color: default_color(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let storage_key =
            env::var("HIGHLIGHT_STORAGE_KEY").unwrap_or_else(|_| HIGHLIGHTS_KEY.to_string());
        if storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }

        let default_color = match env::var("HIGHLIGHT_DEFAULT_COLOR") {
            Ok(color) => palette_index(&color)
                .map(palette_color)
                .ok_or(ConfigError::UnknownColor(color))?,
            Err(_) => default_color(),
        };

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:./highlighter.db".to_string()),
            },
            highlight: HighlightConfig {
                storage_key,
                default_color,
            },
        })
    }
}
