//! TOML-based configuration for Itinera
//!
//! This module provides declarative configuration for the HTTP server, the
//! model provider and the per-agent settings via a TOML file (`itinera.toml`).
//!
//! # Hot Reloading
//!
//! Configuration changes are automatically detected and applied at runtime.
//! Use `ConfigManager` for thread-safe access to the current configuration;
//! agent settings are read per request, so a reload applies to the next
//! itinerary that is built.

use arc_swap::ArcSwap;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Root configuration structure loaded from itinera.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItineraConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Language model provider shared by all agents
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Per-agent model, timeout and option limits
    #[serde(default)]
    pub agents: AgentsConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    #[serde(default)]
    pub json_logs: bool,

    /// Origins allowed by CORS; `*` allows any origin
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cors_allowed_origins() -> Vec<String> {
    vec!["http://localhost:8080".to_string()]
}

fn default_body_limit_bytes() -> usize {
    256 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            json_logs: false,
            cors_allowed_origins: default_cors_allowed_origins(),
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        #[serde(default = "default_ollama_model")]
        default_model: String,
        #[serde(default = "default_ollama_timeout_secs")]
        timeout_secs: u64,
    },
    OpenAI {
        /// Environment variable containing the API key; empty for keyless servers
        #[serde(default = "default_openai_key_env")]
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
        #[serde(default = "default_openai_model")]
        default_model: String,
        #[serde(default = "default_temperature")]
        temperature: f32,
        #[serde(default = "default_max_tokens")]
        max_tokens: u32,
        #[serde(default = "default_request_timeout_secs")]
        timeout_secs: u64,
        #[serde(default = "default_connect_timeout_secs")]
        connect_timeout_secs: u64,
        #[serde(default = "default_max_retries")]
        max_retries: u32,
        #[serde(default = "default_retry_backoff_ms")]
        retry_backoff_ms: u64,
        #[serde(default = "default_json_mode")]
        json_mode: bool,
    },
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2".to_string()
}

fn default_ollama_timeout_secs() -> u64 {
    120
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    30
}

/// Upper bound on `provider.max_retries`
pub const MAX_RETRIES_LIMIT: u32 = 10;

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_json_mode() -> bool {
    true
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Ollama {
            base_url: default_ollama_url(),
            default_model: default_ollama_model(),
            timeout_secs: default_ollama_timeout_secs(),
        }
    }
}

// ============= Agent Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model identifier; falls back to the provider's default model
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default = "default_agent_timeout_secs")]
    pub timeout_secs: u64,

    /// Options requested from the model (questions for the question agent)
    #[serde(default = "default_max_options")]
    pub max_options: u32,
}

fn default_agent_timeout_secs() -> u64 {
    30
}

fn default_max_options() -> u32 {
    5
}

impl AgentConfig {
    fn with(timeout_secs: u64, max_options: u32) -> Self {
        Self {
            model: None,
            timeout_secs,
            max_options,
        }
    }

    /// Per-call deadline
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::with(default_agent_timeout_secs(), default_max_options())
    }
}

fn default_event_agent() -> AgentConfig {
    AgentConfig::with(30, 10)
}

fn default_question_agent() -> AgentConfig {
    AgentConfig::with(30, 4)
}

fn default_planner_agent() -> AgentConfig {
    AgentConfig::with(60, 0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentsConfig {
    #[serde(default)]
    pub flight: AgentConfig,
    #[serde(default)]
    pub hotel: AgentConfig,
    #[serde(default)]
    pub transport: AgentConfig,
    #[serde(default = "default_event_agent")]
    pub event: AgentConfig,
    #[serde(default)]
    pub weather: AgentConfig,
    #[serde(default = "default_question_agent")]
    pub question: AgentConfig,
    #[serde(default = "default_planner_agent")]
    pub planner: AgentConfig,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            flight: AgentConfig::default(),
            hotel: AgentConfig::default(),
            transport: AgentConfig::default(),
            event: default_event_agent(),
            weather: AgentConfig::default(),
            question: default_question_agent(),
            planner: default_planner_agent(),
        }
    }
}

impl AgentsConfig {
    fn iter(&self) -> impl Iterator<Item = (&'static str, &AgentConfig)> {
        [
            ("flight", &self.flight),
            ("hotel", &self.hotel),
            ("transport", &self.transport),
            ("event", &self.event),
            ("weather", &self.weather),
            ("question", &self.question),
            ("planner", &self.planner),
        ]
        .into_iter()
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),
}

impl ItineraConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: ItineraConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate value ranges and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be non-zero".to_string(),
            ));
        }
        if self.server.cors_allowed_origins.is_empty() {
            return Err(ConfigError::ValidationError(
                "server.cors_allowed_origins must list at least one origin".to_string(),
            ));
        }

        match &self.provider {
            ProviderConfig::OpenAI {
                api_key_env,
                api_base,
                temperature,
                timeout_secs,
                connect_timeout_secs,
                max_retries,
                ..
            } => {
                if !api_key_env.is_empty() {
                    self.validate_env_var(api_key_env)?;
                }
                if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
                    return Err(ConfigError::ValidationError(format!(
                        "provider.api_base '{}' must be an http(s) URL",
                        api_base
                    )));
                }
                if !(0.0..=2.0).contains(temperature) {
                    return Err(ConfigError::ValidationError(format!(
                        "provider.temperature {} must be between 0.0 and 2.0",
                        temperature
                    )));
                }
                if *timeout_secs == 0 || *connect_timeout_secs == 0 {
                    return Err(ConfigError::ValidationError(
                        "provider timeouts must be non-zero".to_string(),
                    ));
                }
                if *max_retries > MAX_RETRIES_LIMIT {
                    return Err(ConfigError::ValidationError(format!(
                        "provider.max_retries {} must be at most {}",
                        max_retries, MAX_RETRIES_LIMIT
                    )));
                }
            }
            ProviderConfig::Ollama {
                base_url,
                timeout_secs,
                ..
            } => {
                if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                    return Err(ConfigError::ValidationError(format!(
                        "provider.base_url '{}' must be an http(s) URL",
                        base_url
                    )));
                }
                if *timeout_secs == 0 {
                    return Err(ConfigError::ValidationError(
                        "provider.timeout_secs must be non-zero".to_string(),
                    ));
                }
            }
        }

        for (name, agent) in self.agents.iter() {
            if agent.timeout_secs == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "agents.{}.timeout_secs must be non-zero",
                    name
                )));
            }
        }
        if self.agents.question.max_options < 2 {
            return Err(ConfigError::ValidationError(
                "agents.question.max_options must be at least 2".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Model for an agent, falling back to the provider default
    pub fn model_for<'a>(&'a self, agent: &'a AgentConfig) -> &'a str {
        agent
            .model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }
}

impl ProviderConfig {
    /// Provider type as written in the `type` key
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderConfig::Ollama { .. } => "ollama",
            ProviderConfig::OpenAI { .. } => "openai",
        }
    }

    /// Default model identifier of this provider
    pub fn default_model(&self) -> &str {
        match self {
            ProviderConfig::Ollama { default_model, .. } => default_model,
            ProviderConfig::OpenAI { default_model, .. } => default_model,
        }
    }
}

// ============= Hot Reloading Configuration Manager =============

/// Thread-safe configuration manager with hot reloading support
pub struct ConfigManager {
    config: Arc<ArcSwap<ItineraConfig>>,
    config_path: PathBuf,
    watcher: RwLock<Option<RecommendedWatcher>>,
}

impl ConfigManager {
    /// Create a new configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        // Convert to absolute path for reliable file watching
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = ItineraConfig::load(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: path,
            watcher: RwLock::new(None),
        })
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<ItineraConfig> {
        self.config.load_full()
    }

    /// Manually reload the configuration from disk
    pub fn reload(&self) -> Result<(), ConfigError> {
        info!("Reloading configuration from {:?}", self.config_path);

        let new_config = ItineraConfig::load(&self.config_path)?;
        self.config.store(Arc::new(new_config));

        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Start watching for configuration file changes
    pub fn start_watching(&mut self) -> Result<(), ConfigError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let config_path = self.config_path.clone();
        let config_arc = Arc::clone(&self.config);
        let watched_file = config_path.file_name().map(|n| n.to_os_string());

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == watched_file);
                    if touches_config && (event.kind.is_modify() || event.kind.is_create()) {
                        // Debounced in the receiver
                        let _ = tx.send(());
                    }
                }
                Err(e) => {
                    error!("Config watcher error: {:?}", e);
                }
            }
        })?;

        // Watch the parent directory so editors that replace the file are seen
        if let Some(parent) = self.config_path.parent() {
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
        }

        *self.watcher.write() = Some(watcher);

        tokio::spawn(async move {
            let mut last_reload: Option<std::time::Instant> = None;
            let debounce_duration = Duration::from_millis(500);

            while rx.recv().await.is_some() {
                if last_reload.is_some_and(|t| t.elapsed() < debounce_duration) {
                    continue;
                }

                // Wait a bit for the write to complete
                tokio::time::sleep(Duration::from_millis(100)).await;

                match ItineraConfig::load(&config_path) {
                    Ok(new_config) => {
                        config_arc.store(Arc::new(new_config));
                        info!("Configuration hot-reloaded successfully");
                        last_reload = Some(std::time::Instant::now());
                    }
                    Err(e) => {
                        warn!(
                            "Failed to hot-reload config: {}. Keeping previous config.",
                            e
                        );
                    }
                }
            }
        });

        info!("Configuration hot-reload watcher started");
        Ok(())
    }
}

impl ConfigManager {
    /// Create a config manager directly from a config (useful for testing)
    /// This won't have file watching capabilities.
    pub fn from_config(config: ItineraConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: PathBuf::from("test-config.toml"),
            watcher: RwLock::new(None),
        }
    }
}
