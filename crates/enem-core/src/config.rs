use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::FetchOptions;
use crate::retry::RoundPolicy;
use crate::stats::{BootstrapConfig, NanPolicy};

/// Batch retry parameters (optional `[retry]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Number of global rounds; every still-pending year is attempted once per round.
    pub max_rounds: u32,
    /// Pause between rounds in seconds.
    pub round_delay_secs: u64,
    /// Years processed concurrently within a round (1 = strictly sequential).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    1
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            round_delay_secs: 10,
            concurrency: 1,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RoundPolicy {
        RoundPolicy {
            max_rounds: self.max_rounds,
            delay: Duration::from_secs(self.round_delay_secs),
        }
    }
}

/// HTTP timeouts (optional `[fetch]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Total budget for the HEAD availability check.
    pub head_timeout_secs: u64,
    /// Budget for establishing the connection of the GET.
    pub connect_timeout_secs: u64,
    /// Budget for the whole body transfer.
    pub transfer_timeout_secs: u64,
    /// Abort if the rate stays below this many bytes/sec for `low_speed_time_secs`.
    pub low_speed_limit_bytes: u32,
    pub low_speed_time_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            head_timeout_secs: 30,
            connect_timeout_secs: 30,
            transfer_timeout_secs: 3600,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 120,
            user_agent: None,
        }
    }
}

impl FetchConfig {
    pub fn options(&self) -> FetchOptions {
        let mut opts = FetchOptions {
            head_timeout: Duration::from_secs(self.head_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            transfer_timeout: Duration::from_secs(self.transfer_timeout_secs),
            low_speed_limit: self.low_speed_limit_bytes,
            low_speed_time: Duration::from_secs(self.low_speed_time_secs),
            ..FetchOptions::default()
        };
        if let Some(ua) = &self.user_agent {
            opts.user_agent = ua.clone();
        }
        opts
    }
}

/// CSV-to-Parquet conversion knobs (optional `[convert]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Rows read per chunk.
    pub chunk_rows: usize,
    /// Leading bytes inspected by the format sniffer.
    pub sample_bytes: usize,
    /// Parent of the per-year extraction directories; the system temp dir when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            chunk_rows: 50_000,
            sample_bytes: 50_000,
            scratch_dir: None,
        }
    }
}

/// Bootstrap defaults (optional `[bootstrap]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapSection {
    pub iterations: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub nan_policy: NanPolicy,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    0.95
}

impl Default for BootstrapSection {
    fn default() -> Self {
        Self {
            iterations: 1000,
            seed: None,
            nan_policy: NanPolicy::default(),
            confidence: default_confidence(),
        }
    }
}

impl BootstrapSection {
    pub fn to_config(&self) -> BootstrapConfig {
        BootstrapConfig {
            iterations: self.iterations,
            seed: self.seed,
            nan_policy: self.nan_policy,
            confidence: self.confidence,
        }
    }
}

/// Global configuration loaded from `~/.config/enem/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemConfig {
    /// Directory holding one Parquet file per year.
    pub data_dir: PathBuf,
    /// Scheme and host of the microdata server; archives live under `/microdados/`.
    pub base_url: String,
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub fetch: Option<FetchConfig>,
    #[serde(default)]
    pub convert: Option<ConvertConfig>,
    #[serde(default)]
    pub bootstrap: Option<BootstrapSection>,
}

impl Default for EnemConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("dados_enem"),
            base_url: "https://download.inep.gov.br".to_string(),
            retry: None,
            fetch: None,
            convert: None,
            bootstrap: None,
        }
    }
}

impl EnemConfig {
    pub fn retry_or_default(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn fetch_or_default(&self) -> FetchConfig {
        self.fetch.clone().unwrap_or_default()
    }

    pub fn convert_or_default(&self) -> ConvertConfig {
        self.convert.clone().unwrap_or_default()
    }

    pub fn bootstrap_or_default(&self) -> BootstrapSection {
        self.bootstrap.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("enem")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<EnemConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = EnemConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: EnemConfig = toml::from_str(&data)?;
    Ok(cfg)
}
