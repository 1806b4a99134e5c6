pub mod error;

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub use error::{ConfigError, Result};

/// Name of the configuration file searched for by [`Config::load`]
pub const CONFIG_FILE_NAME: &str = "quizgen.toml";

/// Model used when neither the request nor the config names one
pub const DEFAULT_MODEL: &str = "deepseek-chat";
/// Sampling temperature used when the request omits it
pub const DEFAULT_TEMPERATURE: f64 = 0.3;
/// Completion token budget used when the request omits it
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
/// Upstream chat-completion endpoint
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.deepseek.com/chat/completions";
/// Upper bound on a single upstream call made by the gateway
pub const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 55;

/// Main configuration structure for quizgen
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// Log level: error, warn, info, debug, trace
    pub log_level: Option<String>,

    /// Forwarding gateway (server side)
    pub gateway: GatewayConfig,

    /// Gateway client used by the quiz helpers
    pub client: ClientConfig,

    /// Generation parameters applied when a request leaves them out
    pub defaults: GenerationDefaults,
}

/// Settings for the forwarding gateway
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GatewayConfig {
    /// Socket address the gateway binds to
    pub listen: String,

    /// Upstream chat-completion URL
    pub upstream_url: String,

    /// Bound on the upstream call, in seconds
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:3000".to_string(),
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            timeout_secs: DEFAULT_GATEWAY_TIMEOUT_SECS,
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("'gateway.listen' {:?}: {}", self.listen, e)))
    }
}

/// Settings for the client that talks to the gateway
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ClientConfig {
    /// Full URL of the gateway endpoint
    pub gateway_url: String,

    /// Upstream API key (supports `${VAR}` expansion)
    pub api_key: Option<String>,

    /// Wait bound for quiz generation
    pub quiz_timeout_secs: u64,

    /// Wait bound for theory generation
    pub theory_timeout_secs: u64,

    /// Wait bound for the API key probe
    pub probe_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://127.0.0.1:3000/api/deepseek-proxy".to_string(),
            api_key: None,
            quiz_timeout_secs: 60,
            theory_timeout_secs: 30,
            probe_timeout_secs: 10,
        }
    }
}

impl ClientConfig {
    pub fn quiz_timeout(&self) -> Duration {
        Duration::from_secs(self.quiz_timeout_secs)
    }

    pub fn theory_timeout(&self) -> Duration {
        Duration::from_secs(self.theory_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Generation parameters with documented defaults
///
/// - `model`: `"deepseek-chat"`
/// - `temperature`: `0.3`
/// - `max_tokens`: `4000`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct GenerationDefaults {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl Config {
    /// Load configuration from quizgen.toml, failing if none is found
    pub fn load(target_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = find_config_file(target_path.as_ref())?;

        let config_data = fs::read_to_string(&config_path).map_err(|source| {
            ConfigError::ReadFailed {
                path: config_path.display().to_string(),
                source,
            }
        })?;

        debug!("Loaded configuration from {}", config_path.display());
        Self::parse(&config_data)
    }

    /// Like [`Config::load`], but falls back to defaults when no file exists
    pub fn discover(target_path: impl AsRef<Path>) -> Result<Self> {
        match Self::load(target_path) {
            Err(ConfigError::NotFound(dir)) => {
                debug!("No {} found from {}, using defaults", CONFIG_FILE_NAME, dir);
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Parse, expand and validate configuration text
    pub fn parse(text: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(text)?;

        if let Some(api_key) = &config.client.api_key {
            if !api_key.contains("${") && api_key.starts_with("sk-") {
                warn!("API key appears to be hardcoded in {}. Consider using environment variables: api_key = \"${{DEEPSEEK_API_KEY}}\"", CONFIG_FILE_NAME);
            }
        }

        config.expand_env_vars();
        config.validate()?;
        Ok(config)
    }

    /// Validate that required fields are present
    fn validate(&self) -> Result<()> {
        if self.defaults.model.is_empty() {
            return Err(ConfigError::Invalid("'defaults.model' must not be empty".into()));
        }
        if self.gateway.upstream_url.is_empty() {
            return Err(ConfigError::Invalid("'gateway.upstream_url' must not be empty".into()));
        }
        if self.client.gateway_url.is_empty() {
            return Err(ConfigError::Invalid("'client.gateway_url' must not be empty".into()));
        }
        let timeouts = [
            ("gateway.timeout_secs", self.gateway.timeout_secs),
            ("client.quiz_timeout_secs", self.client.quiz_timeout_secs),
            ("client.theory_timeout_secs", self.client.theory_timeout_secs),
            ("client.probe_timeout_secs", self.client.probe_timeout_secs),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
            return Err(ConfigError::Invalid(format!("'{}' must be greater than zero", name)));
        }
        self.gateway.listen_addr()?;
        Ok(())
    }

    fn expand_env_vars(&mut self) {
        if let Some(api_key) = &self.client.api_key {
            if let Some(expanded) = expand_env_var(api_key) {
                self.client.api_key = Some(expanded);
            }
        }
        if let Some(url) = expand_env_var(&self.gateway.upstream_url) {
            self.gateway.upstream_url = url;
        }
        if let Some(url) = expand_env_var(&self.client.gateway_url) {
            self.client.gateway_url = url;
        }
    }

    /// Get the API key, checking the environment if not in config
    pub fn get_api_key(&self) -> Option<String> {
        self.client
            .api_key
            .clone()
            .filter(|key| !key.is_empty() && !key.contains("${"))
            .or_else(|| env::var("DEEPSEEK_API_KEY").ok())
    }
}

/// Find quizgen.toml by searching upward from the given path
fn find_config_file(start_path: &Path) -> Result<PathBuf> {
    let current_dir = if start_path.is_file() {
        start_path
            .parent()
            .ok_or_else(|| ConfigError::Invalid(format!("Invalid path: {}", start_path.display())))?
    } else {
        start_path
    };

    let mut current_dir = current_dir.canonicalize()?;

    loop {
        let config_path = current_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => break,
        }
    }

    Err(ConfigError::NotFound(start_path.display().to_string()))
}

/// Expand environment variable in the format ${VAR_NAME}
fn expand_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        env::var(var_name).ok()
    } else {
        None
    }
}
