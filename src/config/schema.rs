use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Model identifier used when none is configured.
pub const DEFAULT_MODEL: &str = "@cf/meta/llama-3-8b-instruct";

// ── Top-level config ──────────────────────────────────────────────

/// Top-level disputeflow configuration, loaded from `config.toml`.
///
/// Resolution order for the config root: `DISPUTEFLOW_CONFIG_DIR` env →
/// `~/.disputeflow/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workspace directory for durable state - computed, not serialized.
    #[serde(skip)]
    pub workspace_dir: PathBuf,
    /// Path to config.toml - computed, not serialized.
    #[serde(skip)]
    pub config_path: PathBuf,
    /// API key for the model provider. Overridden by `DISPUTEFLOW_API_KEY`
    /// or `API_KEY` env vars.
    pub api_key: Option<String>,
    /// Base URL override for an OpenAI-compatible endpoint.
    pub api_url: Option<String>,
    /// Provider ID. Default: `"openai"`.
    pub default_provider: Option<String>,
    /// Model routed through the provider. Overridden by the `MODEL_ID` env
    /// var; falls back to [`DEFAULT_MODEL`] when unset.
    pub default_model: Option<String>,
    /// Model temperature (0.0-2.0). Default: `0.7`.
    pub default_temperature: f64,

    /// Gateway server configuration (`[gateway]`).
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Session store configuration (`[session]`).
    #[serde(default)]
    pub session: SessionConfig,
}

// ── Gateway ──────────────────────────────────────────────────────

/// Gateway server configuration (`[gateway]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway port (default: 8787)
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    /// Gateway host (default: 127.0.0.1)
    #[serde(default = "default_gateway_host")]
    pub host: String,
}

fn default_gateway_port() -> u16 {
    8787
}

fn default_gateway_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            host: default_gateway_host(),
        }
    }
}

// ── Session store ────────────────────────────────────────────────

/// Session store configuration (`[session]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Store backend: `"sqlite"` (durable, default) or `"memory"`.
    #[serde(default = "default_session_backend")]
    pub backend: String,
    /// Maximum persisted messages replayed to the model per call.
    /// `0` replays the full history. Default: `200`.
    #[serde(default = "default_max_model_messages")]
    pub max_model_messages: usize,
}

fn default_session_backend() -> String {
    "sqlite".into()
}

fn default_max_model_messages() -> usize {
    200
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: default_session_backend(),
            max_model_messages: default_max_model_messages(),
        }
    }
}

// ── Load / persist ───────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace_dir: PathBuf::new(),
            config_path: PathBuf::new(),
            api_key: None,
            api_url: None,
            default_provider: Some("openai".into()),
            default_model: Some(DEFAULT_MODEL.into()),
            default_temperature: 0.7,
            gateway: GatewayConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    /// Resolve the config root directory.
    fn config_root() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var("DISPUTEFLOW_CONFIG_DIR") {
            if !dir.trim().is_empty() {
                return Ok(PathBuf::from(shellexpand::tilde(dir.trim()).into_owned()));
            }
        }
        let user_dirs = UserDirs::new().context("Could not determine home directory")?;
        Ok(user_dirs.home_dir().join(".disputeflow"))
    }

    /// Load `config.toml`, writing a default one on first run.
    pub async fn load_or_init() -> Result<Self> {
        let root = Self::config_root()?;
        let config_path = root.join("config.toml");

        let mut config = if fs::try_exists(&config_path).await.unwrap_or(false) {
            let raw = fs::read_to_string(&config_path)
                .await
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            toml::from_str::<Config>(&raw)
                .with_context(|| format!("Invalid config at {}", config_path.display()))?
        } else {
            let config = Config::default();
            config.write_to(&config_path).await?;
            config
        };

        config.workspace_dir = root;
        config.config_path = config_path;
        Ok(config)
    }

    /// Apply environment overrides on top of the loaded file.
    pub fn apply_env_overrides(&mut self) {
        for env_var in ["DISPUTEFLOW_API_KEY", "API_KEY"] {
            if let Ok(value) = std::env::var(env_var) {
                if !value.trim().is_empty() {
                    self.api_key = Some(value.trim().to_string());
                    break;
                }
            }
        }

        if let Ok(model) = std::env::var("MODEL_ID") {
            if !model.trim().is_empty() {
                self.default_model = Some(model.trim().to_string());
            }
        }

        if let Ok(dir) = std::env::var("DISPUTEFLOW_WORKSPACE") {
            if !dir.trim().is_empty() {
                self.workspace_dir = PathBuf::from(shellexpand::tilde(dir.trim()).into_owned());
            }
        }
    }

    /// Persist the config to its on-disk location.
    pub async fn save(&self) -> Result<()> {
        self.write_to(&self.config_path).await
    }

    async fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let rendered = toml::to_string_pretty(self).context("Failed to serialize config")?;
        let mut file = fs::File::create(path)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        file.write_all(rendered.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
