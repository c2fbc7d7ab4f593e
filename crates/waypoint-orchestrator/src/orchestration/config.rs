// Waypoint configuration
//
// Loaded from TOML. Every section and field has a default, so an empty file
// (or no file at all) is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Duration;
use waypoint_models::RetryPolicy;

use super::engine::EngineConfig;
use super::execution::{ToolErrorPolicy, ToolExecutionConfig};

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The TOML could not be parsed or did not match the schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid config value for '{field}': {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointConfig {
    /// Model endpoint
    pub model: ModelConfig,
    /// Tool-use loop
    pub tool_use: ToolUseConfig,
    /// Model client retry policy
    pub retry: RetryPolicy,
    /// Flight store
    pub store: StoreConfig,
    /// Managed agent used for comparisons
    pub managed_agent: ManagedAgentConfig,
}

/// Model endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model identifier sent with each request
    pub model_id: String,
    /// API base URL (None = provider default)
    pub base_url: Option<String>,
    /// Maximum output tokens per call
    pub max_tokens: u32,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_id: "claude-3-5-haiku-latest".to_string(),
            base_url: None,
            max_tokens: 1024,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
        }
    }
}

/// Tool-use loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolUseConfig {
    /// Iteration budget per run
    pub max_iterations: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Deadline for a whole run, in seconds
    pub timeout_seconds: u64,
    /// Deadline for each tool call, in seconds
    pub tool_timeout_seconds: u64,
    /// Maximum concurrent tool calls (None = unbounded)
    pub max_parallel: Option<usize>,
    /// What to do when a tool fails
    pub on_tool_error: ToolErrorPolicy,
}

impl Default for ToolUseConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            temperature: 0.0,
            timeout_seconds: 120,
            tool_timeout_seconds: 30,
            max_parallel: None,
            on_tool_error: ToolErrorPolicy::FailRun,
        }
    }
}

/// Flight store configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database path; without one an in-memory seeded store is used
    pub path: Option<PathBuf>,
}

/// Managed agent configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagedAgentConfig {
    /// Gateway URL
    pub endpoint: Option<String>,
    /// Agent identifier
    pub agent_id: String,
    /// Agent alias identifier
    pub agent_alias_id: String,
    /// Environment variable holding the gateway API key
    pub api_key_env: Option<String>,
}

impl Default for ManagedAgentConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            agent_id: String::new(),
            agent_alias_id: "TSTALIASID".to_string(),
            api_key_env: None,
        }
    }
}

impl WaypointConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed or validated
    pub fn load_from_toml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from TOML string
    ///
    /// The content may be a bare document or wrapped in a `[waypoint]` section.
    ///
    /// # Errors
    /// Returns error if TOML cannot be parsed or validated
    pub fn from_toml_str(toml_content: &str) -> Result<Self, ConfigError> {
        let toml: toml::Value = toml::from_str(toml_content)?;

        // Extract [waypoint] section if present, otherwise use the entire document
        let config_value = match toml.get("waypoint") {
            Some(section) => section.clone(),
            None => toml,
        };

        let config: Self = config_value.try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns `Invalid` for the first out-of-range value
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tool_use.max_iterations < 1 {
            return Err(ConfigError::Invalid { field: "tool_use.max_iterations", reason: "must be at least 1".to_string() });
        }
        if self.tool_use.timeout_seconds == 0 {
            return Err(ConfigError::Invalid { field: "tool_use.timeout_seconds", reason: "must be positive".to_string() });
        }
        if self.tool_use.tool_timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "tool_use.tool_timeout_seconds",
                reason: "must be positive".to_string(),
            });
        }
        if self.tool_use.max_parallel == Some(0) {
            return Err(ConfigError::Invalid { field: "tool_use.max_parallel", reason: "must be positive".to_string() });
        }
        if !(0.0..=1.0).contains(&self.retry.jitter) {
            return Err(ConfigError::Invalid { field: "retry.jitter", reason: "must be between 0.0 and 1.0".to_string() });
        }
        Ok(())
    }

    /// Engine settings derived from this configuration
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_tokens: self.model.max_tokens,
            timeout: Duration::from_secs(self.tool_use.timeout_seconds),
            tool_execution: ToolExecutionConfig {
                max_parallel: self.tool_use.max_parallel,
                timeout_per_call: Duration::from_secs(self.tool_use.tool_timeout_seconds),
                error_policy: self.tool_use.on_tool_error,
            },
        }
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.waypoint/config.toml`, or `None` when `HOME` is not set
    pub fn default_config_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        let mut path = PathBuf::from(home);
        path.push(".waypoint");
        path.push("config.toml");
        Some(path)
    }
}
