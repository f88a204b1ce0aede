use crate::error::{AppError, Result};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/app.yml";

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
    #[serde(default = "default_payload_limit")]
    pub payload_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout: default_shutdown_timeout(),
            payload_limit: default_payload_limit(),
        }
    }
}

/// Upstream chat-completion API the relay forwards to.
///
/// `api_key` is never deserialized; it only comes from the `API_KEY`
/// environment variable.
#[derive(Deserialize, Clone)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(skip)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self { api_url: None, model: None, api_key: None, timeout_secs: default_timeout_secs() }
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl UpstreamConfig {
    /// Builds the upstream section purely from the environment.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(&|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn apply_overrides(&mut self, lookup: &dyn Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("API_URL") {
            self.api_url = Some(url);
        }
        if let Some(model) = lookup("MODEL") {
            self.model = Some(model);
        }
        if let Some(key) = lookup("API_KEY") {
            self.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let missing = |value: &Option<String>| value.as_deref().map_or(true, str::is_empty);
        if missing(&self.api_url) {
            return Err(AppError::Config("upstream api_url is not set (API_URL)".to_string()));
        }
        if missing(&self.model) {
            return Err(AppError::Config("upstream model is not set (MODEL)".to_string()));
        }
        if missing(&self.api_key) {
            return Err(AppError::Config("API_KEY is not set".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::Config("upstream timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
    #[serde(default = "default_max_age")]
    pub max_age: u32,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { allowed_origin: default_allowed_origin(), max_age: default_max_age() }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Chat {
    #[serde(default)]
    pub defaults: ChatDefaults,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChatDefaults {
    pub temperature: f32,
    pub stream: bool,
}

impl Default for ChatDefaults {
    fn default() -> Self {
        Self { temperature: 0.6, stream: true }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub chat: Chat,
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl AppConfig {
    /// Loads the YAML file, applies environment overrides and validates.
    pub fn load(config_path: &str) -> anyhow::Result<Self> {
        let config_file = std::fs::File::open(config_path)?;
        let mut config: Self = serde_yaml::from_reader(config_file)?;
        config.apply_overrides(&|key| std::env::var(key).ok());
        config.upstream.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| AppError::Config(e.to_string()))
    }

    fn apply_overrides(&mut self, lookup: &dyn Fn(&str) -> Option<String>) {
        self.upstream.apply_overrides(lookup);
        if let Some(origin) = lookup("ALLOWED_ORIGIN") {
            self.cors.allowed_origin = origin;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        match lookup("PORT").map(|port| port.parse::<u16>()) {
            Some(Ok(port)) => self.server.port = port,
            Some(Err(e)) => log::warn!("Ignoring invalid PORT override: {}", e),
            None => {}
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_payload_limit() -> usize {
    1024 * 1024
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_allowed_origin() -> String {
    "*".to_string()
}

fn default_max_age() -> u32 {
    86400
}

fn default_locale() -> String {
    "en".to_string()
}
