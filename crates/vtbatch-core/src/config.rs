use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `api_key` from the config file.
pub const API_KEY_ENV: &str = "VT_API_KEY";

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per call (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

/// Remote endpoints. Defaults point at the VirusTotal v2 public and
/// intelligence APIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoints {
    /// File report lookup (accepts comma-joined resources).
    pub report: String,
    /// Public file search, offset-cursor paginated (POST).
    pub search: String,
    /// Intelligence search, next-page-token paginated (GET).
    pub intelligence_search: String,
    /// Raw artifact download.
    pub download: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            report: "https://www.virustotal.com/vtapi/v2/file/report".to_string(),
            search: "https://www.virustotal.com/vtapi/v2/file/search".to_string(),
            intelligence_search: "https://www.virustotal.com/intelligence/search/programmatic/"
                .to_string(),
            download: "https://www.virustotal.com/intelligence/download/".to_string(),
        }
    }
}

impl Endpoints {
    /// All endpoints rooted at `base` (used by tests against a local server).
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            report: format!("{base}/vtapi/v2/file/report"),
            search: format!("{base}/vtapi/v2/file/search"),
            intelligence_search: format!("{base}/intelligence/search/programmatic/"),
            download: format!("{base}/intelligence/download/"),
        }
    }
}

/// Global configuration loaded from `~/.config/vtbatch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VtConfig {
    /// API key sent with every request. `VT_API_KEY` takes precedence.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Worker pool size: maximum concurrent calls per round.
    pub workers: usize,
    /// Maximum identifiers joined into one lookup request.
    pub chunk_size: usize,
    /// Directory verified downloads are written to.
    pub download_dir: PathBuf,
    /// HTTP User-Agent header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-call connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Per-call total timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub endpoints: Endpoints,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

fn default_user_agent() -> String {
    format!("vtbatch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_connect_timeout() -> u64 {
    15
}

fn default_timeout() -> u64 {
    120
}

impl Default for VtConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            workers: 16,
            chunk_size: 24,
            download_dir: PathBuf::from("downloads"),
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout(),
            timeout_secs: default_timeout(),
            endpoints: Endpoints::default(),
            retry: None,
        }
    }
}

impl VtConfig {
    /// Worker count clamped to at least one.
    pub fn workers(&self) -> usize {
        self.workers.max(1)
    }

    /// Chunk size clamped to at least one.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry section or its defaults.
    pub fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    /// Resolve the API key: environment first, then the config file.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vtbatch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from an explicit path.
pub fn load_from_path(path: &Path) -> Result<VtConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: VtConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<VtConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = VtConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}
