use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Fetch retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per recording (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff.
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 1.0,
            max_delay_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/atcdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtcConfig {
    /// Default number of concurrent downloads (1-100).
    pub concurrency: usize,
    /// Default stagger delay budget per unit, in seconds. Divided across the pool.
    pub stagger_delay_secs: f64,
    /// Default destination directory (None = current directory).
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Base URL for station search and archive pages.
    pub search_base_url: String,
    /// Base URL for archived recordings.
    pub archive_base_url: String,
    /// Connect timeout for every request.
    pub connect_timeout_secs: u64,
    /// Total timeout for search/archive page requests.
    pub page_timeout_secs: u64,
    /// Total timeout for one recording download.
    pub archive_timeout_secs: u64,
    /// Retry a failed TLS/connect page or recording request once without peer verification.
    #[serde(default)]
    pub insecure_tls_fallback: bool,
    /// Failure reasons longer than this are truncated in logs and the failed list.
    pub max_error_len: usize,
    /// Optional fetch retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for AtcConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            stagger_delay_secs: 2.0,
            output_dir: None,
            search_base_url: "https://www.liveatc.net".to_string(),
            archive_base_url: "https://archive.liveatc.net".to_string(),
            connect_timeout_secs: 10,
            page_timeout_secs: 10,
            archive_timeout_secs: 30,
            insecure_tls_fallback: false,
            max_error_len: 100,
            retry: None,
        }
    }
}

impl AtcConfig {
    /// Retry settings, falling back to defaults when the section is absent.
    pub fn retry_or_default(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("atcdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<AtcConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = AtcConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: AtcConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
