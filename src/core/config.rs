use crate::errors::{BrowserError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub scenario: ScenarioConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Attach to an already running browser when set; launch one otherwise.
    pub ws_url: Option<String>,
    pub headless: bool,
    pub viewport: Viewport,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub url: String,
    pub todo_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            ws_url: None,
            headless: true,
            viewport: Viewport::default(),
            args: vec![],
        }
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            url: "https://angularjs.org/".to_string(),
            todo_text: "write first protractor test".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.scenario.url)
            .map_err(|e| BrowserError::Config(format!("scenario.url: {}", e)))?;
        if let Some(ws_url) = &self.connection.ws_url {
            let parsed = url::Url::parse(ws_url)
                .map_err(|e| BrowserError::Config(format!("connection.ws_url: {}", e)))?;
            if !matches!(parsed.scheme(), "ws" | "wss") {
                return Err(BrowserError::Config(format!(
                    "connection.ws_url must be a ws:// or wss:// URL, got {}",
                    ws_url
                )));
            }
        }
        if self.connection.viewport.width == 0 || self.connection.viewport.height == 0 {
            return Err(BrowserError::Config("viewport must be non-empty".to_string()));
        }
        Ok(())
    }
}
